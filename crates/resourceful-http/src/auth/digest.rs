//! HTTP Digest access authentication (RFC 7616, RFC 2617).

use md5::Md5;
use sha2::{Digest, Sha256};

use super::{AuthScheme, Challenge, Credentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl Algorithm {
    /// Missing algorithm means MD5.
    fn parse(name: Option<&str>) -> Option<Self> {
        let Some(name) = name else {
            return Some(Self::Md5);
        };
        match name.to_ascii_uppercase().as_str() {
            "MD5" => Some(Self::Md5),
            "MD5-SESS" => Some(Self::Md5Sess),
            "SHA-256" => Some(Self::Sha256),
            "SHA-256-SESS" => Some(Self::Sha256Sess),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
            Self::Sha256 => "SHA-256",
            Self::Sha256Sess => "SHA-256-sess",
        }
    }

    fn is_session(&self) -> bool {
        matches!(self, Self::Md5Sess | Self::Sha256Sess)
    }

    fn hash(&self, data: &str) -> String {
        match self {
            Self::Md5 | Self::Md5Sess => format!("{:x}", Md5::digest(data.as_bytes())),
            Self::Sha256 | Self::Sha256Sess => format!("{:x}", Sha256::digest(data.as_bytes())),
        }
    }
}

/// Quality of protection chosen for a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Qop {
    /// Server sent no qop (RFC 2069 style).
    Legacy,
    Auth,
}

impl Qop {
    fn choose(offered: Option<&str>) -> Option<Self> {
        match offered {
            None => Some(Self::Legacy),
            Some(list) => list
                .split(',')
                .any(|q| q.trim().eq_ignore_ascii_case("auth"))
                .then_some(Self::Auth),
        }
    }
}

/// Whether a Digest challenge can be answered.
pub(crate) fn supports(challenge: &Challenge) -> bool {
    challenge.is(AuthScheme::Digest)
        && challenge.param("nonce").is_some()
        && Algorithm::parse(challenge.param("algorithm")).is_some()
        && Qop::choose(challenge.param("qop")).is_some()
}

/// Authorization header value answering `challenge`, or `None` when the
/// challenge uses an algorithm or qop this client cannot produce.
pub(crate) fn digest_authorization(
    challenge: &Challenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
) -> Option<String> {
    compute(challenge, credentials, method, uri, &generate_cnonce())
}

fn generate_cnonce() -> String {
    format!("{:016x}", rand::random::<u64>())
}

const NONCE_COUNT: &str = "00000001";

fn compute(
    challenge: &Challenge,
    credentials: &Credentials,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> Option<String> {
    if !supports(challenge) {
        return None;
    }
    let algorithm = Algorithm::parse(challenge.param("algorithm"))?;
    let qop = Qop::choose(challenge.param("qop"))?;
    let realm = challenge.realm().unwrap_or_default();
    let nonce = challenge.param("nonce")?;

    let mut ha1 = algorithm.hash(&format!(
        "{}:{}:{}",
        credentials.account(),
        realm,
        credentials.password().expose()
    ));
    if algorithm.is_session() {
        ha1 = algorithm.hash(&format!("{}:{}:{}", ha1, nonce, cnonce));
    }
    let ha2 = algorithm.hash(&format!("{}:{}", method, uri));

    let response = match qop {
        Qop::Auth => algorithm.hash(&format!(
            "{}:{}:{}:{}:auth:{}",
            ha1, nonce, NONCE_COUNT, cnonce, ha2
        )),
        Qop::Legacy => algorithm.hash(&format!("{}:{}:{}", ha1, nonce, ha2)),
    };

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\"",
        escape(credentials.account()),
        escape(realm),
        escape(nonce),
        escape(uri)
    );
    if challenge.param("algorithm").is_some() {
        header.push_str(&format!(", algorithm={}", algorithm.name()));
    }
    header.push_str(&format!(", response=\"{}\"", response));
    if qop == Qop::Auth {
        header.push_str(&format!(
            ", qop=auth, nc={}, cnonce=\"{}\"",
            NONCE_COUNT, cnonce
        ));
    }
    if let Some(opaque) = challenge.param("opaque") {
        header.push_str(&format!(", opaque=\"{}\"", escape(opaque)));
    }

    Some(header)
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc2617_challenge() -> Challenge {
        Challenge::parse_all(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .remove(0)
    }

    fn mufasa() -> Credentials {
        Credentials::new("Mufasa", "Circle Of Life")
    }

    #[test]
    fn test_rfc2617_example_response() {
        let header = compute(
            &rfc2617_challenge(),
            &mufasa(),
            "GET",
            "/dir/index.html",
            "0a4f113b",
        )
        .unwrap();

        assert!(header.starts_with("Digest username=\"Mufasa\""));
        assert!(header.contains("realm=\"testrealm@host.com\""));
        assert!(header.contains("uri=\"/dir/index.html\""));
        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
        assert!(header.contains("qop=auth, nc=00000001, cnonce=\"0a4f113b\""));
        assert!(header.contains("opaque=\"5ccc069c403ebaf9f0171e9517f40e41\""));
        assert!(!header.contains("algorithm="));
        assert!(!header.contains("Circle Of Life"));
    }

    #[test]
    fn test_legacy_digest_without_qop() {
        let challenge = Challenge::parse_all(r#"Digest realm="r", nonce="n""#).remove(0);
        let header = compute(&challenge, &mufasa(), "GET", "/", "c").unwrap();

        let ha1 = Algorithm::Md5.hash("Mufasa:r:Circle Of Life");
        let ha2 = Algorithm::Md5.hash("GET:/");
        let expected = Algorithm::Md5.hash(&format!("{}:n:{}", ha1, ha2));

        assert!(header.contains(&format!("response=\"{}\"", expected)));
        assert!(!header.contains("cnonce"));
        assert!(!header.contains("qop"));
    }

    #[test]
    fn test_sha256_session() {
        let challenge = Challenge::parse_all(
            r#"Digest realm="r", nonce="n", qop="auth", algorithm=SHA-256-sess"#,
        )
        .remove(0);
        let header = compute(&challenge, &mufasa(), "PUT", "/x", "c").unwrap();

        let ha1 = Algorithm::Sha256.hash(&format!(
            "{}:n:c",
            Algorithm::Sha256.hash("Mufasa:r:Circle Of Life")
        ));
        let ha2 = Algorithm::Sha256.hash("PUT:/x");
        let expected = Algorithm::Sha256.hash(&format!("{}:n:00000001:c:auth:{}", ha1, ha2));

        assert!(header.contains("algorithm=SHA-256-sess"));
        assert!(header.contains(&format!("response=\"{}\"", expected)));
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_md5_hash_length() {
        assert_eq!(Algorithm::Md5.hash("").len(), 32);
        assert_eq!(
            Algorithm::Md5.hash(""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_unsupported_challenges() {
        let auth_int_only =
            Challenge::parse_all(r#"Digest realm="r", nonce="n", qop="auth-int""#).remove(0);
        assert!(!supports(&auth_int_only));

        let unknown_algorithm =
            Challenge::parse_all(r#"Digest realm="r", nonce="n", algorithm=SHA-512-256"#)
                .remove(0);
        assert!(!supports(&unknown_algorithm));

        let no_nonce = Challenge::parse_all(r#"Digest realm="r""#).remove(0);
        assert!(!supports(&no_nonce));

        let basic = Challenge::parse_all(r#"Basic realm="r""#).remove(0);
        assert!(!supports(&basic));
        assert!(digest_authorization(&basic, &mufasa(), "GET", "/").is_none());
    }

    #[test]
    fn test_cnonce_is_random_hex() {
        let a = generate_cnonce();
        let b = generate_cnonce();
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_username_is_escaped() {
        let challenge = Challenge::parse_all(r#"Digest realm="r", nonce="n""#).remove(0);
        let credentials = Credentials::new("a\"b", "pw");
        let header = compute(&challenge, &credentials, "GET", "/", "c").unwrap();
        assert!(header.starts_with(r#"Digest username="a\"b""#));
    }
}
