//! Route guard.
//!
//! Decides, before a page renders, whether the current session may see
//! it. The guard only reads credentials and the user store; issuing the
//! redirect is left to the caller.

use crate::auth::login_redirect_path;
use crate::error::StashResult;
use crate::store::{Store, Stores};

/// Section holding login and registration pages.
pub const AUTH_SECTION: &str = "/auth";

/// Result of guarding one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(String),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// `path` equals `section` or lies below it.
fn within(path: &str, section: &str) -> bool {
    match path.strip_prefix(section) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Guard a navigation to `path`.
///
/// - Auth pages with a credential: load the user and go to the dashboard.
/// - Dashboard pages without a credential: go to login, remembering `path`.
/// - Admin pages for anyone but an admin: back to the dashboard.
pub async fn authorize(path: &str, stores: &Stores) -> StashResult<GuardOutcome> {
    let config = stores.dispatcher().config();
    let signed_in = stores.dispatcher().has_credential(stores.context());

    if within(path, AUTH_SECTION) {
        if !signed_in {
            return Ok(GuardOutcome::Allow);
        }
        stores.user_info()?.refresh_if_needed().await;
        tracing::debug!(path, "already signed in, leaving auth pages");
        return Ok(GuardOutcome::Redirect(config.dashboard_path.clone()));
    }

    if !within(path, &config.dashboard_path) {
        return Ok(GuardOutcome::Allow);
    }

    if !signed_in {
        tracing::debug!(path, "no session for dashboard page");
        return Ok(GuardOutcome::Redirect(login_redirect_path(config, path)));
    }

    let admin_section = format!("{}/admin", config.dashboard_path);
    if within(path, &admin_section) {
        let user = stores.user_info()?.use_state().await.get();
        let is_admin = user.as_ref().is_some_and(|u| u.role.has_admin_access());
        if !is_admin {
            tracing::warn!(path, user = user.as_ref().map(|u| u.username.as_str()), "admin page refused");
            return Ok(GuardOutcome::Redirect(config.dashboard_path.clone()));
        }
    }

    Ok(GuardOutcome::Allow)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_matching_respects_segments() {
        assert!(within("/auth", "/auth"));
        assert!(within("/auth/login?url=%2F", "/auth"));
        assert!(within("/dashboard?tab=2", "/dashboard"));
        assert!(!within("/authors", "/auth"));
        assert!(!within("/", "/dashboard"));
    }

    #[test]
    fn only_allow_is_allowed() {
        assert!(GuardOutcome::Allow.is_allowed());
        assert!(!GuardOutcome::Redirect("/".into()).is_allowed());
    }
}
