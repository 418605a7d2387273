//! HTTP authentication: credential lookup and the Basic and Digest schemes.

mod challenge;
mod digest;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use resourceful_common_secret::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

pub use challenge::Challenge;
pub(crate) use digest::{digest_authorization, supports as digest_supported};

/// Supplies credentials for an authentication realm.
///
/// Resources ask on every 401 and never cache the answer.
#[cfg_attr(test, mockall::automock)]
pub trait AuthInfoProvider: Send + Sync {
    /// Credentials for `realm`, or `None` if the realm is unknown.
    fn lookup(&self, realm: &str) -> Option<Credentials>;
}

/// An account name and its password.
#[derive(Clone, Deserialize, PartialEq)]
pub struct Credentials {
    account: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(account: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            account: account.into(),
            password: password.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("password", &self.password)
            .finish()
    }
}

/// Authentication schemes a resource can answer a challenge with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    Basic,
    Digest,
}

impl AuthScheme {
    /// Scheme name as it appears in challenge and authorization headers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Digest => "Digest",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Digest => f.write_str("digest"),
        }
    }
}

/// Credentials keyed by realm, with an optional fallback for any realm.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthInfo {
    realms: HashMap<String, Credentials>,
    fallback: Option<Credentials>,
}

impl StaticAuthInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add credentials for `realm`.
    pub fn with_realm(
        mut self,
        realm: impl Into<String>,
        account: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        self.insert(realm, Credentials::new(account, password));
        self
    }

    /// Credentials used for realms that have no entry of their own.
    pub fn with_fallback(
        mut self,
        account: impl Into<String>,
        password: impl Into<SecretString>,
    ) -> Self {
        self.set_fallback(Credentials::new(account, password));
        self
    }

    pub fn set_fallback(&mut self, credentials: Credentials) {
        self.fallback = Some(credentials);
    }

    pub fn insert(&mut self, realm: impl Into<String>, credentials: Credentials) {
        self.realms.insert(realm.into(), credentials);
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty() && self.fallback.is_none()
    }
}

impl AuthInfoProvider for StaticAuthInfo {
    fn lookup(&self, realm: &str) -> Option<Credentials> {
        self.realms
            .get(realm)
            .or(self.fallback.as_ref())
            .cloned()
    }
}

/// `Basic base64(account:password)`.
pub(crate) fn basic_authorization(credentials: &Credentials) -> String {
    let token = STANDARD.encode(format!(
        "{}:{}",
        credentials.account(),
        credentials.password().expose()
    ));
    format!("Basic {}", token)
}
