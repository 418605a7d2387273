//! Outgoing request model.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use crate::auth::{self, AuthScheme, Challenge, Credentials};
use crate::error::{ResourceError, Result};

/// Common MIME types.
pub mod mime {
    pub const JSON: &str = "application/json";
    pub const FORM: &str = "application/x-www-form-urlencoded";
    pub const TEXT: &str = "text/plain";
}

/// Authorization applied to a request, kept for diagnostics.
///
/// Holds no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAuth {
    pub scheme: AuthScheme,
    pub realm: String,
    pub account: String,
}

/// A GET, POST or PUT against an absolute URI.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    auth: Option<AppliedAuth>,
}

impl Request {
    /// Create a bodiless request.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            auth: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A POST carrying `body` of type `mime_type`.
    pub fn post(url: Url, body: impl Into<Bytes>, mime_type: &str) -> Result<Self> {
        Self::new(Method::POST, url).with_body(body, mime_type)
    }

    /// A PUT carrying `body` of type `mime_type`.
    pub fn put(url: Url, body: impl Into<Bytes>, mime_type: &str) -> Result<Self> {
        Self::new(Method::PUT, url).with_body(body, mime_type)
    }

    fn with_body(mut self, body: impl Into<Bytes>, mime_type: &str) -> Result<Self> {
        let content_type = HeaderValue::try_from(mime_type)
            .map_err(|_| ResourceError::argument(format!("invalid MIME type `{}`", mime_type)))?;
        self.headers.insert(CONTENT_TYPE, content_type);
        self.body = Some(body.into());
        Ok(self)
    }

    /// Set the `accept` header from one or more MIME types.
    ///
    /// An empty list leaves the header untouched. Values are sent as given;
    /// one that is not a valid header value is rejected.
    pub fn set_accept<S: AsRef<str>>(&mut self, mime_types: &[S]) -> Result<()> {
        if mime_types.is_empty() {
            return Ok(());
        }

        let mut values: Vec<&str> = Vec::with_capacity(mime_types.len());
        for mime_type in mime_types {
            let mime_type = mime_type.as_ref();
            if HeaderValue::try_from(mime_type).is_err() {
                return Err(ResourceError::argument(format!(
                    "invalid accept value `{}`",
                    mime_type.escape_debug()
                )));
            }
            values.push(mime_type);
        }

        let joined = values.join(", ");
        let value = HeaderValue::try_from(joined.as_str())
            .map_err(|_| ResourceError::argument(format!("invalid accept value `{}`", joined)))?;
        self.headers.insert(ACCEPT, value);
        Ok(())
    }

    /// Authorize with HTTP Basic.
    pub fn basic_auth(&mut self, credentials: &Credentials, realm: &str) -> Result<()> {
        let value = auth::basic_authorization(credentials);
        self.set_authorization(value, AuthScheme::Basic, realm, credentials)
    }

    /// Authorize with HTTP Digest, answering `challenge`.
    pub fn digest_auth(&mut self, credentials: &Credentials, challenge: &Challenge) -> Result<()> {
        let value = auth::digest_authorization(
            challenge,
            credentials,
            self.method.as_str(),
            &self.request_target(),
        )
        .ok_or_else(|| {
            ResourceError::argument(format!(
                "unsupported digest challenge (algorithm {:?}, qop {:?})",
                challenge.param("algorithm"),
                challenge.param("qop")
            ))
        })?;
        let realm = challenge.realm().unwrap_or_default().to_string();
        self.set_authorization(value, AuthScheme::Digest, &realm, credentials)
    }

    fn set_authorization(
        &mut self,
        value: String,
        scheme: AuthScheme,
        realm: &str,
        credentials: &Credentials,
    ) -> Result<()> {
        let mut value = HeaderValue::try_from(value).map_err(|_| {
            ResourceError::argument(format!(
                "credentials for account `{}` cannot be sent in an authorization header",
                credentials.account()
            ))
        })?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        self.auth = Some(AppliedAuth {
            scheme,
            realm: realm.to_string(),
            account: credentials.account().to_string(),
        });
        Ok(())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of header `name`, if present and printable.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Authorization applied by [`basic_auth`](Self::basic_auth) or
    /// [`digest_auth`](Self::digest_auth).
    pub fn authorization(&self) -> Option<&AppliedAuth> {
        self.auth.as_ref()
    }

    pub fn authentication_scheme(&self) -> Option<AuthScheme> {
        self.auth.as_ref().map(|a| a.scheme)
    }

    pub fn authentication_realm(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.realm.as_str())
    }

    /// Path and query, as sent on the request line.
    pub fn request_target(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }
}
