//! Fully buffered response model.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::auth::{self, AuthScheme, Challenge};
use crate::error::Result;

/// A received response: status, reason phrase, headers and the whole body.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// An empty response with the canonical reason phrase for `status`.
    pub fn new(status: StatusCode) -> Self {
        Self::from_parts(status, HeaderMap::new(), Bytes::new())
    }

    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            headers,
            body,
        }
    }

    /// Append a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Override the reason phrase, for servers that send a custom one.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Numeric status code.
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name`, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw `location` header.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Every challenge across all `www-authenticate` headers, in order.
    pub fn challenges(&self) -> Vec<Challenge> {
        self.headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Challenge::parse_all)
            .collect()
    }

    /// First Digest challenge this client can answer.
    pub fn digest_challenge(&self) -> Option<Challenge> {
        self.challenges()
            .into_iter()
            .find(|c| auth::digest_supported(c))
    }

    /// First Basic challenge.
    pub fn basic_challenge(&self) -> Option<Challenge> {
        self.challenges().into_iter().find(|c| c.is(AuthScheme::Basic))
    }

    pub fn digest_auth_allowed(&self) -> bool {
        self.digest_challenge().is_some()
    }

    pub fn basic_auth_allowed(&self) -> bool {
        self.basic_challenge().is_some()
    }

    /// Realm of the challenge that would be answered: the usable Digest
    /// challenge, then Basic, then whatever came first.
    pub fn realm(&self) -> Option<String> {
        let challenges = self.challenges();
        challenges
            .iter()
            .find(|c| auth::digest_supported(c))
            .or_else(|| challenges.iter().find(|c| c.is(AuthScheme::Basic)))
            .or_else(|| challenges.first())
            .and_then(|c| c.realm())
            .map(str::to_string)
    }
}
