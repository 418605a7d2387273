//! Request tracing utilities.

use std::time::{Duration, Instant};
use tracing::{debug_span, Span};

/// Create a span for a single request/response exchange.
pub fn request_span(method: &str, uri: &str) -> Span {
    debug_span!(
        "request",
        method = %method,
        uri = %uri,
        error = tracing::field::Empty
    )
}

/// Create a span for a redirect-following operation on a resource.
pub fn resource_span(operation: &'static str, uri: &str) -> Span {
    debug_span!("resource", op = %operation, uri = %uri)
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", tracing::field::display(error));
}

/// Wall-clock timer for a round trip.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Time elapsed since the timer started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed seconds as a float, for human readable log lines.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Complete the timer, emit a debug event and return the duration.
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}

/// Macro for timing a block of code.
#[macro_export]
macro_rules! timed {
    ($name:expr, $body:expr) => {{
        let _timer = $crate::spans::Timer::start($name);
        let result = $body;
        _timer.finish();
        result
    }};
}
