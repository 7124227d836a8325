//! Cookie-backed credential storage.
//!
//! A [`CookieJar`] is a set of named cookie cells. The client keeps one
//! jar for its whole lifetime; the server builds one per request from the
//! `Cookie` header. Either way the session credential is read and cleared
//! through the same [`CredentialStore`] interface.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::ClientConfig;
use crate::reactive::Signal;

/// Named cookie cells.
#[derive(Clone, Default)]
pub struct CookieJar {
    cookies: Arc<DashMap<String, Signal<Option<String>>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a request `Cookie` header (`a=1; b=2`).
    ///
    /// Pairs without `=` are ignored. Values are percent-decoded when valid.
    pub fn from_header(header: &str) -> Self {
        let jar = Self::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let raw = value.trim();
            let value = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_owned());
            jar.set(name, Some(value));
        }
        jar
    }

    /// The cell for `name`, created empty on first access.
    pub fn cell(&self, name: &str) -> Signal<Option<String>> {
        self.cookies
            .entry(name.to_owned())
            .or_insert_with(|| Signal::new(None))
            .clone()
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.cookies.get(name).and_then(|cell| cell.get())
    }

    pub fn set(&self, name: &str, value: Option<String>) {
        self.cell(name).set(value);
    }
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.cookies.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("CookieJar").field("names", &names).finish()
    }
}

/// A cookie the application knows by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCookie {
    name: String,
}

impl AppCookie {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The session credential cookie as configured.
    pub fn session_token(config: &ClientConfig) -> Self {
        Self::new(config.session_cookie.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, jar: &CookieJar) -> Signal<Option<String>> {
        jar.cell(&self.name)
    }

    pub fn set(&self, jar: &CookieJar, value: Option<String>) {
        jar.set(&self.name, value);
    }
}

/// Read/write access to the session credential.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;

    fn set(&self, value: Option<String>);

    fn clear(&self) {
        self.set(None);
    }
}

/// A credential stored in one cookie of one jar.
#[derive(Debug, Clone)]
pub struct CookieCredentials {
    jar: CookieJar,
    cookie: AppCookie,
}

impl CookieCredentials {
    pub fn new(jar: CookieJar, cookie: AppCookie) -> Self {
        Self { jar, cookie }
    }
}

impl CredentialStore for CookieCredentials {
    fn get(&self) -> Option<String> {
        self.cookie.get(&self.jar).get().filter(|token| !token.is_empty())
    }

    fn set(&self, value: Option<String>) {
        self.cookie.set(&self.jar, value);
    }
}
