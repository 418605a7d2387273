//! The seam between a resource and whatever actually moves bytes.

use crate::request::Request;
use crate::response::Response;

/// Opens connections to a host.
///
/// A resource acquires one connection per request exchange and drops it when
/// the exchange is over, whether it succeeded or not. Pooling, TLS and wire
/// parsing are entirely the implementation's business.
pub trait Transport: Send + Sync {
    /// Open a connection to `host:port`.
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection + '_>, TransportError>;
}

/// A connection scoped to a single request exchange.
///
/// At most two requests are sent on one connection: the original and, after an
/// authentication challenge, its authenticated retry. Dropping the connection
/// releases it.
pub trait Connection {
    /// Send `request` and wait for the full response.
    fn send(&mut self, request: &Request) -> Result<Response, TransportError>;
}

/// What went wrong in the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Could not establish a connection.
    Connect,
    /// Connect or read deadline expired.
    Timeout,
    /// Request could not be sent.
    Request,
    /// Response body could not be read.
    Body,
    /// Anything else.
    Other,
}

/// A transport failure, optionally annotated with what was being attempted.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Create a transport error without an underlying cause.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Same error kind with `context` appended to the message in parentheses.
    pub fn with_context(mut self, context: impl std::fmt::Display) -> Self {
        self.message = format!("{} ({})", self.message, context);
        self
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Body
        } else if e.is_request() || e.is_builder() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };

        Self::new(kind, e.to_string()).with_source(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        let kind = match e.kind() {
            std::io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => TransportErrorKind::Connect,
            _ => TransportErrorKind::Other,
        };

        Self::new(kind, e.to_string()).with_source(e)
    }
}
