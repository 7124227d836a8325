//! Execution contexts.
//!
//! A dispatch runs either while serving one request on the server or in
//! the long-lived client. The two differ in where the credential lives and
//! whether a redirect can be issued, so the context is passed explicitly.

use std::sync::Arc;

use super::cookies::{AppCookie, CookieCredentials, CookieJar};
use crate::config::ClientConfig;
use crate::error::{StashError, StashResult};

/// Redirect capability of the client.
pub trait Navigator: Send + Sync {
    /// Full path of the current location, including the query string.
    fn current_path(&self) -> String;

    /// Navigate away. Fire-and-forget.
    fn navigate_to(&self, path: &str);
}

/// One incoming server request.
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub path: String,
    pub cookies: CookieJar,
}

impl RequestScope {
    pub fn new(path: impl Into<String>, cookie_header: &str) -> Self {
        Self {
            path: path.into(),
            cookies: CookieJar::from_header(cookie_header),
        }
    }
}

/// Server side. The request scope is absent when code runs outside a request.
#[derive(Debug, Clone, Default)]
pub struct ServerContext {
    request: Option<RequestScope>,
}

impl ServerContext {
    pub fn for_request(request: RequestScope) -> Self {
        Self { request: Some(request) }
    }

    /// A server context with no request attached.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn request(&self) -> StashResult<&RequestScope> {
        self.request.as_ref().ok_or(StashError::MissingContext)
    }
}

/// Client side: persistent cookies plus navigation.
#[derive(Clone)]
pub struct ClientContext {
    pub cookies: CookieJar,
    pub navigator: Arc<dyn Navigator>,
}

impl ClientContext {
    pub fn new(cookies: CookieJar, navigator: Arc<dyn Navigator>) -> Self {
        Self { cookies, navigator }
    }

    /// Navigate to the login page, remembering where we came from.
    pub fn redirect_to_login(&self, config: &ClientConfig) {
        let target = login_redirect_path(config, &self.navigator.current_path());
        tracing::debug!(target = %target, "redirecting to login");
        self.navigator.navigate_to(&target);
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("cookies", &self.cookies)
            .field("current_path", &self.navigator.current_path())
            .finish()
    }
}

/// Where a dispatch is running.
#[derive(Debug, Clone)]
pub enum ExecutionContext {
    Server(ServerContext),
    Client(ClientContext),
    /// Neither side could be resolved.
    Detached,
}

impl ExecutionContext {
    /// The cookie jar holding credentials for this context.
    pub fn cookies(&self) -> StashResult<&CookieJar> {
        match self {
            Self::Server(server) => Ok(&server.request()?.cookies),
            Self::Client(client) => Ok(&client.cookies),
            Self::Detached => Err(StashError::MissingContext),
        }
    }

    /// Credential accessor for `cookie` in this context.
    pub fn credentials(&self, cookie: &AppCookie) -> StashResult<CookieCredentials> {
        Ok(CookieCredentials::new(self.cookies()?.clone(), cookie.clone()))
    }

    /// The path being served or displayed.
    pub fn current_path(&self) -> StashResult<String> {
        match self {
            Self::Server(server) => Ok(server.request()?.path.clone()),
            Self::Client(client) => Ok(client.navigator.current_path()),
            Self::Detached => Err(StashError::MissingContext),
        }
    }
}

/// `<login_path>?url=<current, percent-encoded>`.
pub fn login_redirect_path(config: &ClientConfig, current: &str) -> String {
    format!("{}?url={}", config.login_path, urlencoding::encode(current))
}
