//! Client configuration.
//!
//! Loaded once at startup and shared by the dispatcher and route guard.

use serde::Deserialize;

use crate::error::{StashError, StashResult};

const ENV_API_URL: &str = "STASH_API_URL";
const ENV_LOGIN_PATH: &str = "STASH_LOGIN_PATH";
const ENV_DASHBOARD_PATH: &str = "STASH_DASHBOARD_PATH";
const ENV_SESSION_COOKIE: &str = "STASH_SESSION_COOKIE";

/// Where the API lives and where authentication redirects go.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL handed to the transport on every request.
    pub api_url: String,

    /// Path of the login page. A `url` query parameter is appended.
    pub login_path: String,

    /// Landing page for authenticated users.
    pub dashboard_path: String,

    /// Name of the cookie carrying the session credential.
    pub session_cookie: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:12151".into(),
            login_path: "/auth/login".into(),
            dashboard_path: "/dashboard".into(),
            session_cookie: "session_token".into(),
        }
    }
}

impl ClientConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> StashResult<Self> {
        serde_json::from_str(raw).map_err(|e| StashError::Config(e.to_string()))
    }

    /// Read `STASH_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: lookup(ENV_API_URL).unwrap_or(defaults.api_url),
            login_path: lookup(ENV_LOGIN_PATH).unwrap_or(defaults.login_path),
            dashboard_path: lookup(ENV_DASHBOARD_PATH).unwrap_or(defaults.dashboard_path),
            session_cookie: lookup(ENV_SESSION_COOKIE).unwrap_or(defaults.session_cookie),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ClientConfig::from_json(r#"{"apiUrl":"https://api.example.org"}"#).unwrap();
        assert_eq!(config.api_url, "https://api.example.org");
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.session_cookie, "session_token");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(ClientConfig::from_json("{"), Err(StashError::Config(_))));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = ClientConfig::from_lookup(|name| match name {
            ENV_LOGIN_PATH => Some("/signin".into()),
            _ => None,
        });
        assert_eq!(config.login_path, "/signin");
        assert_eq!(config.dashboard_path, "/dashboard");
    }
}
