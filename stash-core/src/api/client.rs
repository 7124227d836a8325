//! The transport capability the dispatcher drives.
//!
//! Implementations wrap a generated HTTP client. The dispatcher derives a
//! handle with [`ApiClient::with_config`] for every call, so the credential
//! a handler sends is the one read from its own context. The shared client
//! is never mutated.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use super::envelope::ApiResponse;
use super::types::{ApiKey, DevPackage, DevPackageRelease, UserInfo};
use crate::error::StashResult;

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Settings pushed into the transport before a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub headers: IndexMap<String, String>,
    /// Return error bodies as failure envelopes instead of raising.
    pub ignore_response_error: bool,
}

impl TransportConfig {
    /// Config with a bearer credential attached when one is present.
    pub fn for_credential(base_url: &str, credential: Option<&str>) -> Self {
        let mut headers = IndexMap::new();
        if let Some(token) = credential {
            headers.insert(AUTHORIZATION_HEADER.to_owned(), format!("Bearer {token}"));
        }
        Self {
            base_url: base_url.to_owned(),
            headers,
            ignore_response_error: true,
        }
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION_HEADER).map(String::as_str)
    }
}

/// Remote operations used by the stores.
///
/// `Err` means the call itself faulted; API-level errors come back as
/// [`ApiResponse::Failure`].
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// A handle sending every request with `config`. `self` is left as is.
    fn with_config(&self, config: TransportConfig) -> Arc<dyn ApiClient>;

    async fn get_account(&self) -> StashResult<ApiResponse<UserInfo>>;

    async fn get_dev_packages(&self) -> StashResult<ApiResponse<Vec<DevPackage>>>;

    async fn get_dev_package(&self, name: &str) -> StashResult<ApiResponse<DevPackage>>;

    async fn get_dev_package_releases(&self, name: &str) -> StashResult<ApiResponse<Vec<DevPackageRelease>>>;

    async fn get_api_keys(&self) -> StashResult<ApiResponse<Vec<ApiKey>>>;
}
