//! A single web resource and the HTTP operations that can be performed on it.

use bytes::Bytes;
use reqwest::StatusCode;
use resourceful_common_log::spans::{record_error, request_span, resource_span, Timer};
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::auth::{AuthInfoProvider, Credentials};
use crate::client::HttpTransport;
use crate::config::ResourceConfig;
use crate::error::{HttpRequestError, ResourceError, Result};
use crate::logging::{LogLevel, LogSink, NullSink};
use crate::options::{Body, BodyOptions, ParseAs, RequestOptions};
use crate::request::Request;
use crate::response::Response;
use crate::transport::{Connection, Transport};

/// Outcome of one request exchange.
enum Exchange {
    /// A response for the calling operation to judge.
    Answered(Response),
    /// A 401 that could not be answered with credentials. Handed back to the
    /// caller unchanged.
    Unauthenticated(Response),
}

/// A resource on the web, identified by a URI.
///
/// The resource remembers where redirects have taken it. A temporary redirect
/// (302, 307) moves the effective URI until [`reset`](Self::reset) is called;
/// a permanent redirect (301) replaces the original URI for good.
///
/// Operations block the calling thread. Following redirects mutates the
/// resource, so `get` takes `&mut self`; sharing one resource between threads
/// needs external synchronisation.
pub struct Resource {
    uri: Url,
    effective_uri: Option<Url>,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn LogSink>,
    auth_info: Option<Arc<dyn AuthInfoProvider>>,
    max_redirects: usize,
}

impl Resource {
    /// A resource with default configuration: no logging, no credentials.
    pub fn new(uri: &str) -> Result<Self> {
        Self::with_config(uri, ResourceConfig::default())
    }

    pub fn with_config(uri: &str, config: ResourceConfig) -> Result<Self> {
        config.validate()?;
        let uri = parse_uri(uri)?;

        let transport: Arc<dyn Transport> = match config.transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpTransport::with_config(&config.http)
                    .map_err(|e| ResourceError::config(e.to_string()))?,
            ),
        };

        Ok(Self {
            uri,
            effective_uri: None,
            transport,
            logger: config.logger.unwrap_or_else(|| Arc::new(NullSink)),
            auth_info: config.auth_info,
            max_redirects: config.max_redirects,
        })
    }

    /// The URI this resource was created with, or moved to by a 301.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The URI the next request will go to.
    pub fn effective_uri(&self) -> &Url {
        self.effective_uri.as_ref().unwrap_or(&self.uri)
    }

    /// Forget temporary redirects; the next request goes to [`uri`](Self::uri).
    pub fn reset(&mut self) {
        self.effective_uri = None;
    }

    /// Get a representation of this resource, following redirects.
    ///
    /// 301 moves the resource permanently, 302 and 307 move only the effective
    /// URI. The `accept` option is kept on every hop. Any other non-2xx status
    /// is returned as a classified [`HttpRequestError`], except a 401 for which
    /// no credentials could be found: that response is returned as-is.
    pub fn get(&mut self, options: RequestOptions) -> Result<Response> {
        let span = resource_span("get", self.effective_uri().as_str());
        let _enter = span.enter();

        let mut hops = 0;
        loop {
            let mut request = Request::get(self.effective_uri().clone());
            request.set_accept(&options.accept)?;

            let response = match self.do_request(&mut request)? {
                Exchange::Answered(response) => response,
                Exchange::Unauthenticated(response) => return Ok(response),
            };
            if response.is_success() {
                return Ok(response);
            }

            let permanent = match response.status() {
                StatusCode::MOVED_PERMANENTLY => true,
                StatusCode::FOUND | StatusCode::TEMPORARY_REDIRECT => false,
                _ => return Err(HttpRequestError::new_from(request, response).into()),
            };

            let Some(location) = redirect_target(&request, &response)? else {
                return Err(HttpRequestError::new_from(request, response).into());
            };

            if hops == self.max_redirects {
                return Err(ResourceError::TooManyRedirects {
                    uri: request.url().to_string(),
                    limit: self.max_redirects,
                });
            }
            hops += 1;

            tracing::debug!(
                "Following {} redirect from {} to {}",
                response.code(),
                request.url(),
                location
            );
            if permanent {
                self.reset_uri(location);
            } else {
                self.effective_uri = Some(location);
            }
        }
    }

    /// Get the body of this resource, optionally parsed.
    pub fn get_body(&mut self, options: BodyOptions) -> Result<Body> {
        let response = self.get(options.request_options())?;

        match options.parse_as {
            ParseAs::None => Ok(Body::Raw(response.text())),
            ParseAs::Json => Ok(Body::Json(response.json()?)),
        }
    }

    /// Get the body of this resource parsed as JSON.
    pub fn get_json_body(&mut self, options: RequestOptions) -> Result<serde_json::Value> {
        let body = self.get_body(BodyOptions {
            accept: options.accept,
            parse_as: ParseAs::Json,
        })?;

        match body {
            Body::Json(value) => Ok(value),
            Body::Raw(text) => Ok(serde_json::from_str(&text)?),
        }
    }

    /// Post `data` of type `mime_type` to this resource.
    ///
    /// Only 303 See Other is followed: the target is fetched with a fresh
    /// resource that shares this one's transport but none of its logger or
    /// credentials, and that response is returned.
    pub fn post(
        &self,
        data: impl Into<Bytes>,
        mime_type: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        let span = resource_span("post", self.effective_uri().as_str());
        let _enter = span.enter();

        let mut request = Request::post(self.effective_uri().clone(), data, mime_type)?;
        request.set_accept(&options.accept)?;

        let response = match self.do_request(&mut request)? {
            Exchange::Answered(response) => response,
            Exchange::Unauthenticated(response) => return Ok(response),
        };
        if response.is_success() {
            return Ok(response);
        }

        if response.status() == StatusCode::SEE_OTHER {
            if let Some(location) = redirect_target(&request, &response)? {
                tracing::debug!("Following 303 from {} to {}", request.url(), location);
                let config = ResourceConfig::new()
                    .transport(Arc::clone(&self.transport))
                    .max_redirects(self.max_redirects);
                let mut see_other = Resource::with_config(location.as_str(), config)?;
                return see_other.get(RequestOptions::default());
            }
        }

        Err(HttpRequestError::new_from(request, response).into())
    }

    /// Put `data` of type `mime_type` to this resource. Redirects are not
    /// followed.
    pub fn put(
        &self,
        data: impl Into<Bytes>,
        mime_type: &str,
        options: RequestOptions,
    ) -> Result<Response> {
        let span = resource_span("put", self.effective_uri().as_str());
        let _enter = span.enter();

        let mut request = Request::put(self.effective_uri().clone(), data, mime_type)?;
        request.set_accept(&options.accept)?;

        let response = match self.do_request(&mut request)? {
            Exchange::Answered(response) => response,
            Exchange::Unauthenticated(response) => return Ok(response),
        };
        if response.is_success() {
            return Ok(response);
        }

        Err(HttpRequestError::new_from(request, response).into())
    }

    fn reset_uri(&mut self, uri: Url) {
        self.effective_uri = None;
        self.uri = uri;
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.logger.log(level, message);
    }

    fn credentials(&self, realm: &str) -> Option<Credentials> {
        self.auth_info.as_ref().and_then(|p| p.lookup(realm))
    }

    /// Run one exchange, annotating transport failures with what was being
    /// attempted.
    fn do_request(&self, request: &mut Request) -> Result<Exchange> {
        let span = request_span(request.method().as_str(), request.url().as_str());
        let _enter = span.enter();

        match self.exchange(request) {
            Err(ResourceError::Transport(error)) => {
                let target = format!("{} {}", request.method(), request.url());
                self.log(
                    LogLevel::Debug,
                    &format!("  {} failed with {}", target, error),
                );
                record_error(&error);
                Err(error.with_context(format!("while {}", target)).into())
            }
            other => other,
        }
    }

    fn exchange(&self, request: &mut Request) -> Result<Exchange> {
        let (host, port) = host_and_port(request.url())?;
        let mut connection = self.transport.connect(&host, port)?;

        let timer = Timer::start("request");
        let response = connection.send(request)?;
        self.log(
            LogLevel::Info,
            &format!(
                "  {} {} ({}) ({:.3} sec)",
                request.method(),
                request.url(),
                response.code(),
                timer.elapsed_secs()
            ),
        );

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(Exchange::Answered(response));
        }
        self.retry_with_credentials(connection.as_mut(), request, response)
    }

    /// Answer a 401 once, if credentials and a usable challenge exist.
    fn retry_with_credentials(
        &self,
        connection: &mut (dyn Connection + '_),
        request: &mut Request,
        response: Response,
    ) -> Result<Exchange> {
        let realm = response.realm().unwrap_or_default();
        let Some(credentials) = self.credentials(&realm) else {
            self.log(
                LogLevel::Warn,
                &format!("    No credentials known for {}", realm),
            );
            return Ok(Exchange::Unauthenticated(response));
        };

        if let Some(challenge) = response.digest_challenge() {
            request.digest_auth(&credentials, &challenge)?;
        } else if let Some(challenge) = response.basic_challenge() {
            request.basic_auth(&credentials, challenge.realm().unwrap_or_default())?;
        } else {
            return Ok(Exchange::Unauthenticated(response));
        }

        let timer = Timer::start("request");
        let response = connection.send(request)?;
        if let Some(applied) = request.authorization() {
            self.log(
                LogLevel::Info,
                &format!(
                    "  {} {} ({}_auth: realm='{}', account='{}') ({}) ({:.3} sec)",
                    request.method(),
                    request.url(),
                    applied.scheme,
                    applied.realm,
                    applied.account,
                    response.code(),
                    timer.elapsed_secs()
                ),
            );
        }

        Ok(Exchange::Answered(response))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.uri.as_str())
            .field("effective_uri", &self.effective_uri.as_ref().map(Url::as_str))
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

/// Parse an absolute http(s) URI that names a host and a port.
fn parse_uri(uri: &str) -> Result<Url> {
    let parsed = Url::parse(uri).map_err(|e| ResourceError::invalid_uri(uri, e.to_string()))?;
    host_and_port(&parsed)?;
    Ok(parsed)
}

fn host_and_port(url: &Url) -> Result<(String, u16)> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ResourceError::invalid_uri(
            url.as_str(),
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ResourceError::invalid_uri(url.as_str(), "no host"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ResourceError::invalid_uri(url.as_str(), "no port known for scheme"))?;
    Ok((host.to_string(), port))
}

/// Where a redirect points, resolved against the URI that was requested.
fn redirect_target(request: &Request, response: &Response) -> Result<Option<Url>> {
    let Some(location) = response.location() else {
        return Ok(None);
    };
    let target = request
        .url()
        .join(location)
        .map_err(|e| ResourceError::invalid_uri(location, e.to_string()))?;
    host_and_port(&target)?;
    Ok(Some(target))
}
