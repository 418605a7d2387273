//! reqwest-backed transport and its configuration.

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::redirect::Policy;
use std::time::Duration;

use crate::request::Request;
use crate::response::Response;
use crate::transport::{Connection, Transport, TransportError};

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("resourceful/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

/// Build a blocking client that never follows redirects on its own.
pub fn build_client(config: &HttpConfig) -> Result<Client, TransportError> {
    let builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(Policy::none())
        .gzip(config.gzip);

    builder.build().map_err(TransportError::from)
}

/// The default [`Transport`], backed by `reqwest::blocking`.
///
/// Must not be created or used from inside an async runtime.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Client,
}

impl HttpTransport {
    /// Create a transport with default config.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a transport with custom config.
    pub fn with_config(config: &HttpConfig) -> Result<Self, TransportError> {
        let inner = build_client(config)?;
        Ok(Self { inner })
    }
}

impl Transport for HttpTransport {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection + '_>, TransportError> {
        tracing::trace!("Opening connection to {}:{}", host, port);
        Ok(Box::new(HttpConnection {
            client: &self.inner,
            host: host.to_string(),
            port,
        }))
    }
}

/// Requests on this connection go through the client's pool; dropping it
/// hands the socket back.
struct HttpConnection<'a> {
    client: &'a Client,
    host: String,
    port: u16,
}

impl Connection for HttpConnection<'_> {
    fn send(&mut self, request: &Request) -> Result<Response, TransportError> {
        tracing::debug!("Making {} request to: {}", request.method(), request.url());

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status();
        let reason = reason_phrase(&response);
        let headers = response.headers().clone();
        let body = response.bytes()?;

        tracing::debug!("{} response: {} {}", request.method(), status, request.url());
        let response = Response::from_parts(status, headers, body);
        Ok(match reason {
            Some(reason) => response.with_reason(reason),
            None => response,
        })
    }
}

/// The reason phrase the server sent, when it differs from the canonical one.
fn reason_phrase(response: &reqwest::blocking::Response) -> Option<String> {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .map(str::to_string)
}

impl Drop for HttpConnection<'_> {
    fn drop(&mut self) {
        tracing::trace!("Releasing connection to {}:{}", self.host, self.port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("resourceful/"));
        assert_eq!(config.pool_max_idle_per_host, 10);
        assert!(config.gzip);
    }

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn test_transport_with_custom_config() {
        let config = HttpConfig {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            user_agent: "test-agent".to_string(),
            pool_max_idle_per_host: 5,
            gzip: false,
        };

        assert!(HttpTransport::with_config(&config).is_ok());
    }

    #[test]
    fn test_connect_is_lazy() {
        let transport = HttpTransport::new().unwrap();
        // Nothing listens here; opening the scoped connection must not dial.
        assert!(transport.connect("127.0.0.1", 9).is_ok());
    }
}
