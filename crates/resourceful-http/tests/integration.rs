use mockito::Matcher;
use resourceful_http::{
    BodyOptions, HttpConfig, HttpErrorKind, ParseAs, RequestOptions, Resource, ResourceConfig,
    ResourceError, StaticAuthInfo, TransportErrorKind,
};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn resource(url: &str) -> Resource {
    Resource::new(url).expect("valid resource")
}

fn with_credentials(url: &str, realm: &str) -> Resource {
    let provider = StaticAuthInfo::new().with_realm(realm, "bob", "hunter2");
    let config = ResourceConfig::new().auth_info(Arc::new(provider));
    Resource::with_config(url, config).expect("valid resource")
}

/// Answer a single connection with `raw`, after reading the request head.
fn serve_once(raw: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = stream.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            head.extend_from_slice(&buf[..read]);
        }
        stream.write_all(raw.as_bytes()).unwrap();
    });

    format!("http://{}", address)
}

#[test]
fn test_get_returns_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/widgets/1")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "name": "sprocket"}"#)
        .create();

    let mut resource = resource(&format!("{}/widgets/1", server.url()));
    let response = resource
        .get(RequestOptions::new().accept("application/json"))
        .unwrap();

    assert_eq!(response.code(), 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["name"], "sprocket");
    mock.assert();
}

#[test]
fn test_get_json_body() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/widgets")
        .with_status(200)
        .with_body(r#"[{"id": 1}, {"id": 2}]"#)
        .create();

    let mut resource = resource(&format!("{}/widgets", server.url()));
    let body = resource
        .get_body(BodyOptions::new().parse_as(ParseAs::Json))
        .unwrap();
    assert_eq!(body.as_json().unwrap().as_array().unwrap().len(), 2);

    let value = resource.get_json_body(RequestOptions::default()).unwrap();
    assert_eq!(value[1]["id"], 2);
}

#[test]
fn test_permanent_redirect_is_remembered() {
    let mut server = mockito::Server::new();
    let old = server
        .mock("GET", "/old")
        .with_status(301)
        .with_header("location", &format!("{}/new", server.url()))
        .expect(1)
        .create();
    let new = server
        .mock("GET", "/new")
        .match_header("accept", "text/plain")
        .with_status(200)
        .with_body("moved here")
        .expect(2)
        .create();

    let mut resource = resource(&format!("{}/old", server.url()));
    let response = resource.get(RequestOptions::new().accept("text/plain")).unwrap();
    assert_eq!(response.text(), "moved here");
    assert_eq!(resource.uri().path(), "/new");

    resource.reset();
    resource.get(RequestOptions::new().accept("text/plain")).unwrap();

    old.assert();
    new.assert();
}

#[test]
fn test_temporary_redirect_until_reset() {
    let mut server = mockito::Server::new();
    let original = server
        .mock("GET", "/report")
        .with_status(302)
        .with_header("location", "/report/latest")
        .expect(2)
        .create();
    let latest = server
        .mock("GET", "/report/latest")
        .with_status(200)
        .with_body("latest")
        .expect(3)
        .create();

    let mut resource = resource(&format!("{}/report", server.url()));
    resource.get(RequestOptions::default()).unwrap();
    assert_eq!(resource.uri().path(), "/report");
    assert_eq!(resource.effective_uri().path(), "/report/latest");

    // straight to the effective URI
    resource.get(RequestOptions::default()).unwrap();

    resource.reset();
    resource.get(RequestOptions::default()).unwrap();

    original.assert();
    latest.assert();
}

#[test]
fn test_redirect_loop_is_bounded() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/a")
        .with_status(307)
        .with_header("location", "/b")
        .expect_at_least(1)
        .create();
    server
        .mock("GET", "/b")
        .with_status(307)
        .with_header("location", "/a")
        .expect_at_least(1)
        .create();

    let config = ResourceConfig::new().max_redirects(4);
    let mut resource = Resource::with_config(&format!("{}/a", server.url()), config).unwrap();

    let error = resource.get(RequestOptions::default()).unwrap_err();
    assert!(matches!(error, ResourceError::TooManyRedirects { limit: 4, .. }));
}

#[test]
fn test_post_see_other() {
    let mut server = mockito::Server::new();
    let post = server
        .mock("POST", "/orders")
        .match_header("content-type", "application/json")
        .match_body(r#"{"item":"sprocket"}"#)
        .with_status(303)
        .with_header("location", "/orders/7")
        .create();
    let get = server
        .mock("GET", "/orders/7")
        .with_status(200)
        .with_body("order 7")
        .create();

    let resource = resource(&format!("{}/orders", server.url()));
    let response = resource
        .post(r#"{"item":"sprocket"}"#, "application/json", RequestOptions::default())
        .unwrap();

    assert_eq!(response.text(), "order 7");
    assert_eq!(resource.effective_uri().path(), "/orders");
    post.assert();
    get.assert();
}

#[test]
fn test_put_does_not_follow_redirects() {
    let mut server = mockito::Server::new();
    let put = server
        .mock("PUT", "/doc")
        .with_status(307)
        .with_header("location", "/doc/v2")
        .create();
    let moved = server.mock("GET", "/doc/v2").expect(0).create();

    let resource = resource(&format!("{}/doc", server.url()));
    let error = resource
        .put("v2", "text/plain", RequestOptions::default())
        .unwrap_err();

    let http = error.http().expect("classified error");
    assert_eq!(http.kind(), HttpErrorKind::Redirected);
    assert_eq!(http.response().location(), Some("/doc/v2"));
    assert_eq!(
        http.message(),
        format!(
            "Received Temporary Redirect in response to PUT {}/doc (307)",
            server.url()
        )
    );
    put.assert();
    moved.assert();
}

#[test]
fn test_classified_errors() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/missing").with_status(404).create();
    server
        .mock("POST", "/broken")
        .with_status(500)
        .with_body("boom")
        .create();

    let mut missing = resource(&format!("{}/missing", server.url()));
    let error = missing.get(RequestOptions::default()).unwrap_err();
    assert_eq!(error.http().unwrap().kind(), HttpErrorKind::Client);
    assert_eq!(
        error.to_string(),
        format!("{}/missing Not Found (404)", server.url())
    );

    let broken = resource(&format!("{}/broken", server.url()));
    let error = broken
        .post("x", "text/plain", RequestOptions::default())
        .unwrap_err();
    let http = error.http().unwrap();
    assert_eq!(http.kind(), HttpErrorKind::Server);
    assert_eq!(http.response().text(), "boom");
}

#[test]
fn test_server_reason_phrase_is_kept() {
    let base = serve_once(
        "HTTP/1.1 404 Widget Missing\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
    );

    let mut resource = resource(&format!("{}/w", base));
    let error = resource.get(RequestOptions::default()).unwrap_err();

    let http = error.http().expect("classified error");
    assert_eq!(http.kind(), HttpErrorKind::Client);
    assert_eq!(http.response().reason_phrase(), "Widget Missing");
    assert_eq!(error.to_string(), format!("{}/w Widget Missing (404)", base));
}

#[test]
fn test_basic_auth_retry() {
    let mut server = mockito::Server::new();
    let challenge = server
        .mock("GET", "/private")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("www-authenticate", r#"Basic realm="files""#)
        .create();
    let authorized = server
        .mock("GET", "/private")
        .match_header("authorization", "Basic Ym9iOmh1bnRlcjI=")
        .with_status(200)
        .with_body("welcome")
        .create();

    let mut resource = with_credentials(&format!("{}/private", server.url()), "files");
    let response = resource.get(RequestOptions::default()).unwrap();

    assert_eq!(response.text(), "welcome");
    challenge.assert();
    authorized.assert();
}

#[test]
fn test_digest_auth_retry() {
    let mut server = mockito::Server::new();
    let challenge = server
        .mock("GET", "/vault?shelf=2")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header(
            "www-authenticate",
            r#"Digest realm="vault", nonce="dcd98b7102dd2f0e", qop="auth", opaque="5ccc069c""#,
        )
        .create();
    let authorized = server
        .mock("GET", "/vault?shelf=2")
        .match_header(
            "authorization",
            Matcher::Regex(
                r#"^Digest username="bob", realm="vault", nonce="dcd98b7102dd2f0e", uri="/vault\?shelf=2", response="[0-9a-f]{32}", qop=auth, nc=00000001, cnonce="[0-9a-f]{16}", opaque="5ccc069c"$"#
                    .to_string(),
            ),
        )
        .with_status(200)
        .create();

    let mut resource = with_credentials(&format!("{}/vault?shelf=2", server.url()), "vault");
    let response = resource.get(RequestOptions::default()).unwrap();

    assert_eq!(response.code(), 200);
    challenge.assert();
    authorized.assert();
}

#[test]
fn test_unauthorized_without_credentials_is_returned() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/private")
        .with_status(401)
        .with_header("www-authenticate", r#"Basic realm="files""#)
        .expect(1)
        .create();

    let mut resource = with_credentials(&format!("{}/private", server.url()), "elsewhere");
    let response = resource.get(RequestOptions::default()).unwrap();

    assert_eq!(response.code(), 401);
    assert_eq!(response.realm().as_deref(), Some("files"));
    mock.assert();
}

#[test]
fn test_rejected_credentials_are_not_retried_twice() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PUT", "/private")
        .with_status(401)
        .with_header("www-authenticate", r#"Basic realm="files""#)
        .expect(2)
        .create();

    let resource = with_credentials(&format!("{}/private", server.url()), "files");
    let error = resource
        .put("x", "text/plain", RequestOptions::default())
        .unwrap_err();

    assert_eq!(error.http().unwrap().status(), 401);
    mock.assert();
}

#[test]
fn test_auth_retry_resends_body() {
    let mut server = mockito::Server::new();
    let challenge = server
        .mock("PUT", "/private/doc")
        .match_header("authorization", Matcher::Missing)
        .match_body("x")
        .with_status(401)
        .with_header("www-authenticate", r#"Basic realm="files""#)
        .create();
    let authorized = server
        .mock("PUT", "/private/doc")
        .match_header("authorization", "Basic Ym9iOmh1bnRlcjI=")
        .match_header("content-type", "text/plain")
        .match_body("x")
        .with_status(200)
        .create();

    let resource = with_credentials(&format!("{}/private/doc", server.url()), "files");
    let response = resource
        .put("x", "text/plain", RequestOptions::default())
        .unwrap();

    assert_eq!(response.code(), 200);
    challenge.assert();
    authorized.assert();
}

#[test]
fn test_connection_failure_is_annotated() {
    let config = ResourceConfig::new().http(HttpConfig {
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
        ..HttpConfig::default()
    });
    let mut resource = Resource::with_config("http://127.0.0.1:1/nothing", config).unwrap();

    let error = resource.get(RequestOptions::default()).unwrap_err();
    match error {
        ResourceError::Transport(e) => {
            assert!(matches!(
                e.kind(),
                TransportErrorKind::Connect | TransportErrorKind::Timeout
            ));
            assert!(e
                .to_string()
                .ends_with("(while GET http://127.0.0.1:1/nothing)"));
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[test]
fn test_config_from_yaml_drives_resource() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/private")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("www-authenticate", r#"Basic realm="files""#)
        .create();
    server
        .mock("GET", "/private")
        .match_header("authorization", "Basic Ym9iOmh1bnRlcjI=")
        .match_header("user-agent", "integration/1.0")
        .with_status(200)
        .create();

    let config = ResourceConfig::from_yaml(
        r#"
logger: true
http:
  user_agent: integration/1.0
auth_info:
  - account: bob
    password: hunter2
"#,
    )
    .unwrap();
    let mut resource = Resource::with_config(&format!("{}/private", server.url()), config).unwrap();

    assert_eq!(resource.get(RequestOptions::default()).unwrap().code(), 200);
}
