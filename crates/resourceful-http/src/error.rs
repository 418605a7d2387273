//! Error types for resource operations.

use crate::request::Request;
use crate::response::Response;
use crate::transport::TransportError;

/// Result type alias for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Everything a resource operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Construction options were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A URI could not be parsed, or cannot be requested.
    #[error("invalid URI `{uri}`: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// A call-time option was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server answered with a status this layer does not handle.
    #[error(transparent)]
    Http(#[from] HttpRequestError),

    /// The transport failed before a response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Redirect chain longer than the configured limit.
    #[error("too many redirects (limit {limit}) while getting {uri}")]
    TooManyRedirects { uri: String, limit: usize },

    /// Body could not be parsed as JSON.
    #[error("failed to parse body as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResourceError {
    /// Create an invalid URI error.
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an invalid argument error.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// The classified HTTP error, if this is one.
    pub fn http(&self) -> Option<&HttpRequestError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// Category of an unhandled HTTP status, by its first digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpErrorKind {
    /// 3xx that was not followed automatically.
    Redirected,
    /// 4xx.
    Client,
    /// 5xx.
    Server,
    /// Anything else.
    Other,
}

impl HttpErrorKind {
    /// Classify a status code.
    pub fn of(code: u16) -> Self {
        match code / 100 {
            3 => Self::Redirected,
            4 => Self::Client,
            5 => Self::Server,
            _ => Self::Other,
        }
    }
}

/// A response the resource could not turn into a successful outcome.
///
/// Every variant carries the request that was sent and the response that was
/// received so callers can inspect headers and bodies.
#[derive(Debug, thiserror::Error)]
pub enum HttpRequestError {
    #[error("{message}")]
    Redirected {
        message: String,
        request: Box<Request>,
        response: Box<Response>,
    },

    #[error("{message}")]
    Client {
        message: String,
        request: Box<Request>,
        response: Box<Response>,
    },

    #[error("{message}")]
    Server {
        message: String,
        request: Box<Request>,
        response: Box<Response>,
    },

    #[error("{message}")]
    Other {
        message: String,
        request: Box<Request>,
        response: Box<Response>,
    },
}

impl HttpRequestError {
    /// Classify `response` to `request`.
    ///
    /// GET failures read `"<uri> <reason> (<code>)"`, every other verb reads
    /// `"Received <reason> in response to <verb> <uri> (<code>)"`.
    pub fn new_from(request: Request, response: Response) -> Self {
        let message = if request.method() == reqwest::Method::GET {
            format!(
                "{} {} ({})",
                request.url(),
                response.reason_phrase(),
                response.code()
            )
        } else {
            format!(
                "Received {} in response to {} {} ({})",
                response.reason_phrase(),
                request.method(),
                request.url(),
                response.code()
            )
        };

        let request = Box::new(request);
        let response = Box::new(response);

        match HttpErrorKind::of(response.code()) {
            HttpErrorKind::Redirected => Self::Redirected {
                message,
                request,
                response,
            },
            HttpErrorKind::Client => Self::Client {
                message,
                request,
                response,
            },
            HttpErrorKind::Server => Self::Server {
                message,
                request,
                response,
            },
            HttpErrorKind::Other => Self::Other {
                message,
                request,
                response,
            },
        }
    }

    /// Which category this error falls in.
    pub fn kind(&self) -> HttpErrorKind {
        match self {
            Self::Redirected { .. } => HttpErrorKind::Redirected,
            Self::Client { .. } => HttpErrorKind::Client,
            Self::Server { .. } => HttpErrorKind::Server,
            Self::Other { .. } => HttpErrorKind::Other,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Redirected { message, .. }
            | Self::Client { message, .. }
            | Self::Server { message, .. }
            | Self::Other { message, .. } => message,
        }
    }

    /// The request that produced the response.
    pub fn request(&self) -> &Request {
        match self {
            Self::Redirected { request, .. }
            | Self::Client { request, .. }
            | Self::Server { request, .. }
            | Self::Other { request, .. } => request,
        }
    }

    /// The response that could not be handled.
    pub fn response(&self) -> &Response {
        match self {
            Self::Redirected { response, .. }
            | Self::Client { response, .. }
            | Self::Server { response, .. }
            | Self::Other { response, .. } => response,
        }
    }

    /// Status code of the response.
    pub fn status(&self) -> u16 {
        self.response().code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use test_case::test_case;
    use url::Url;

    fn url() -> Url {
        Url::parse("http://example.com/widgets/1").unwrap()
    }

    #[test_case(301, HttpErrorKind::Redirected ; "moved permanently")]
    #[test_case(304, HttpErrorKind::Redirected ; "not modified")]
    #[test_case(400, HttpErrorKind::Client ; "bad request")]
    #[test_case(404, HttpErrorKind::Client ; "not found")]
    #[test_case(451, HttpErrorKind::Client ; "unavailable for legal reasons")]
    #[test_case(500, HttpErrorKind::Server ; "internal server error")]
    #[test_case(503, HttpErrorKind::Server ; "service unavailable")]
    #[test_case(100, HttpErrorKind::Other ; "continue")]
    #[test_case(600, HttpErrorKind::Other ; "non standard")]
    fn test_classification_by_first_digit(code: u16, expected: HttpErrorKind) {
        let response = Response::new(StatusCode::from_u16(code).unwrap());
        let error = HttpRequestError::new_from(Request::get(url()), response);

        assert_eq!(error.kind(), expected);
        assert_eq!(HttpErrorKind::of(code), expected);
        assert_eq!(error.status(), code);
    }

    #[test]
    fn test_get_message_format() {
        let error =
            HttpRequestError::new_from(Request::get(url()), Response::new(StatusCode::NOT_FOUND));
        assert_eq!(error.to_string(), "http://example.com/widgets/1 Not Found (404)");
    }

    #[test]
    fn test_other_verb_message_format() {
        let request = Request::put(url(), "{}", "application/json").unwrap();
        let error =
            HttpRequestError::new_from(request, Response::new(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(
            error.to_string(),
            "Received Internal Server Error in response to PUT http://example.com/widgets/1 (500)"
        );
    }

    #[test]
    fn test_unknown_reason_phrase() {
        let error = HttpRequestError::new_from(
            Request::get(url()),
            Response::new(StatusCode::from_u16(599).unwrap()),
        );
        assert_eq!(error.message(), "http://example.com/widgets/1 Unknown (599)");
    }

    #[test]
    fn test_error_carries_request_and_response() {
        let request = Request::post(url(), "name=x", "application/x-www-form-urlencoded").unwrap();
        let response = Response::new(StatusCode::CONFLICT).with_body("already exists");
        let error = HttpRequestError::new_from(request, response);

        assert_eq!(error.request().method(), reqwest::Method::POST);
        assert_eq!(error.request().url(), &url());
        assert_eq!(error.response().text(), "already exists");
    }

    #[test]
    fn test_resource_error_wraps_http_error() {
        let error: ResourceError =
            HttpRequestError::new_from(Request::get(url()), Response::new(StatusCode::GONE)).into();
        assert_eq!(error.http().map(|e| e.kind()), Some(HttpErrorKind::Client));
        assert_eq!(error.to_string(), "http://example.com/widgets/1 Gone (410)");
    }

    #[test]
    fn test_error_display() {
        let error = ResourceError::invalid_uri("::nope", "relative URL without a base");
        assert_eq!(
            error.to_string(),
            "invalid URI `::nope`: relative URL without a base"
        );

        let error = ResourceError::TooManyRedirects {
            uri: "http://example.com/loop".to_string(),
            limit: 10,
        };
        assert!(error.to_string().contains("too many redirects"));
        assert!(error.http().is_none());
    }
}
