//! Authentication-aware request dispatch.
//!
//! Every remote call goes through [`Dispatcher::dispatch`]:
//!
//! 1. Resolve the credential store for the execution context.
//! 2. Derive a transport handle carrying the credential, or none. A
//!    client with no credential is sent to the login page unless the
//!    caller suppressed the redirect.
//! 3. Run the handler.
//! 4. On the client, a response rejecting the credential clears it and
//!    triggers the same login redirect.
//! 5. Any fault along the way becomes a 500 [`Failure`]. Nothing is
//!    rethrown.

use std::future::Future;
use std::sync::Arc;

use crate::api::{ApiClient, ApiResponse, Failure, TransportConfig};
use crate::auth::context::ExecutionContext;
use crate::auth::cookies::{AppCookie, CredentialStore};
use crate::config::ClientConfig;
use crate::error::StashResult;

/// Per-call dispatch options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Send the client to the login page when the credential is missing or rejected.
    pub redirect_on_missing_credential: bool,
}

impl DispatchOptions {
    /// Never redirect; used by background fetches.
    pub fn silent() -> Self {
        Self { redirect_on_missing_credential: false }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self { redirect_on_missing_credential: true }
    }
}

/// Attaches credentials to the transport and enforces the auth policy.
pub struct Dispatcher {
    api: Arc<dyn ApiClient>,
    config: ClientConfig,
    session: AppCookie,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn ApiClient>, config: ClientConfig) -> Self {
        let session = AppCookie::session_token(&config);
        Self { api, config, session }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The cookie holding the session credential.
    pub fn session_cookie(&self) -> &AppCookie {
        &self.session
    }

    /// Whether `ctx` currently holds a session credential.
    pub fn has_credential(&self, ctx: &ExecutionContext) -> bool {
        ctx.credentials(&self.session)
            .map(|c| c.get().is_some())
            .unwrap_or(false)
    }

    /// Run `handler` against the configured transport.
    ///
    /// Returns the handler's response unchanged, or a 500 failure if
    /// anything faulted.
    pub async fn dispatch<T, F, Fut>(
        &self,
        ctx: &ExecutionContext,
        options: DispatchOptions,
        handler: F,
    ) -> ApiResponse<T>
    where
        F: FnOnce(Arc<dyn ApiClient>) -> Fut,
        Fut: Future<Output = StashResult<ApiResponse<T>>>,
    {
        match self.try_dispatch(ctx, options, handler).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "request dispatch failed");
                ApiResponse::Failure(Failure::from(err))
            }
        }
    }

    async fn try_dispatch<T, F, Fut>(
        &self,
        ctx: &ExecutionContext,
        options: DispatchOptions,
        handler: F,
    ) -> StashResult<ApiResponse<T>>
    where
        F: FnOnce(Arc<dyn ApiClient>) -> Fut,
        Fut: Future<Output = StashResult<ApiResponse<T>>>,
    {
        let credentials = ctx.credentials(&self.session)?;
        let token = credentials.get();

        let transport = self
            .api
            .with_config(TransportConfig::for_credential(&self.config.api_url, token.as_deref()));

        if token.is_none() {
            tracing::warn!(cookie = self.session.name(), "dispatching without a credential");
            if let ExecutionContext::Client(client) = ctx {
                if options.redirect_on_missing_credential {
                    client.redirect_to_login(&self.config);
                }
            }
        }

        let response = handler(transport).await?;

        if let ExecutionContext::Client(client) = ctx {
            if let Some(failure) = response.as_failure().filter(|f| f.is_auth_rejection()) {
                tracing::warn!(code = failure.code, message = %failure.message, "credential rejected, clearing session");
                credentials.clear();
                if options.redirect_on_missing_credential {
                    client.redirect_to_login(&self.config);
                }
            }
        }

        Ok(response)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish()
    }
}
