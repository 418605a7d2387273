//! Where a resource sends its log lines.

pub use resourceful_common_log::LogLevel;

/// Target used by [`TracingSink`] events.
pub const LOG_TARGET: &str = "resourceful::resource";

/// Receives the resource's human readable log lines.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Discards everything. Used when no logger is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Forwards log lines to `tracing` under [`LOG_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!(target: LOG_TARGET, "{}", message),
            LogLevel::Debug => tracing::debug!(target: LOG_TARGET, "{}", message),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, "{}", message),
            LogLevel::Warn => tracing::warn!(target: LOG_TARGET, "{}", message),
            LogLevel::Error => tracing::error!(target: LOG_TARGET, "{}", message),
        }
    }
}
