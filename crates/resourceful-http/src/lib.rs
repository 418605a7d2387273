//! Client-side web resources.
//!
//! A [`Resource`] wraps one URI and performs GET, POST and PUT against it,
//! following redirects, answering authentication challenges and classifying
//! unsuccessful responses into [`HttpRequestError`]s.
//!
//! ```no_run
//! use resourceful_http::{RequestOptions, Resource};
//!
//! let mut resource = Resource::new("http://example.com/widgets/1")?;
//! let response = resource.get(RequestOptions::new().accept("application/json"))?;
//! println!("{}", response.text());
//! # Ok::<(), resourceful_http::ResourceError>(())
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod options;
pub mod request;
pub mod resource;
pub mod response;
pub mod transport;

#[cfg(test)]
mod testing;

pub use auth::{AuthInfoProvider, AuthScheme, Challenge, Credentials, StaticAuthInfo};
pub use client::{build_client, HttpConfig, HttpTransport};
pub use config::{ResourceConfig, ResourceSettings, DEFAULT_MAX_REDIRECTS};
pub use error::{HttpErrorKind, HttpRequestError, ResourceError, Result};
pub use logging::{LogLevel, LogSink, NullSink, TracingSink};
pub use options::{Body, BodyOptions, ParseAs, RequestOptions};
pub use request::{mime, AppliedAuth, Request};
pub use resource::Resource;
pub use response::Response;
pub use transport::{Connection, Transport, TransportError, TransportErrorKind};
