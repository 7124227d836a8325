//! Concrete stores for the package API.
//!
//! [`Stores`] is the context object that builds them: it carries the
//! registry, the dispatcher and the execution context, so every store for
//! the same key built from it shares state.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};

use super::basic::{BasicStore, Fetcher, StoreOptions};
use super::metadata::StoreWithMetadata;
use crate::api::{ApiClient, ApiKey, ApiResponse, DevPackage, DevPackageRelease, DevPackageView, UserInfo};
use crate::auth::{DispatchOptions, Dispatcher, ExecutionContext};
use crate::error::StashResult;
use crate::reactive::StateRegistry;
use crate::request::LazyReusableRequest;

pub const USER_INFO_KEY: &str = "userInfo";
pub const DEV_PACKAGES_KEY: &str = "devPackages";
pub const API_KEYS_KEY: &str = "apiKeys";

pub fn dev_package_key(name: &str) -> String {
    format!("devPackage::{name}")
}

pub fn dev_package_releases_key(name: &str) -> String {
    format!("devPackageReleases::{name}")
}

type Operation<T> =
    Arc<dyn Fn(Arc<dyn ApiClient>) -> BoxFuture<'static, StashResult<ApiResponse<T>>> + Send + Sync>;

/// Fetches one entity through the dispatcher.
///
/// Failures are logged and become `None`.
pub struct ApiFetcher<T> {
    label: &'static str,
    dispatcher: Arc<Dispatcher>,
    ctx: ExecutionContext,
    /// Skip the call entirely when no credential is stored.
    require_credential: bool,
    operation: Operation<T>,
}

impl<T> ApiFetcher<T> {
    pub fn new<F, Fut>(label: &'static str, dispatcher: Arc<Dispatcher>, ctx: ExecutionContext, operation: F) -> Self
    where
        F: Fn(Arc<dyn ApiClient>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StashResult<ApiResponse<T>>> + Send + 'static,
    {
        Self {
            label,
            dispatcher,
            ctx,
            require_credential: false,
            operation: Arc::new(move |api| operation(api).boxed()),
        }
    }

    pub fn requiring_credential(mut self) -> Self {
        self.require_credential = true;
        self
    }
}

#[async_trait]
impl<T: Send + 'static> Fetcher<T> for ApiFetcher<T> {
    async fn fetch(&self) -> Option<T> {
        if self.require_credential && !self.dispatcher.has_credential(&self.ctx) {
            tracing::debug!(label = self.label, "no credential, skipping fetch");
            return None;
        }

        let operation = Arc::clone(&self.operation);
        let response = self
            .dispatcher
            .dispatch(&self.ctx, DispatchOptions::default(), move |api| operation(api))
            .await;
        match response.into_result() {
            Ok(data) => Some(data),
            Err(failure) => {
                tracing::error!(label = self.label, code = failure.code, message = %failure.message, "fetch failed");
                None
            }
        }
    }
}

pub type UserInfoStore = BasicStore<UserInfo, ApiFetcher<UserInfo>>;
pub type DevPackagesStore = BasicStore<Vec<DevPackage>, ApiFetcher<Vec<DevPackage>>>;
pub type DevPackageStore = StoreWithMetadata<DevPackage, DevPackageView, ApiFetcher<DevPackage>>;
pub type ApiKeysStore = BasicStore<Vec<ApiKey>, ApiFetcher<Vec<ApiKey>>>;

/// Builds the application's stores against one registry and context.
#[derive(Clone)]
pub struct Stores {
    registry: StateRegistry,
    dispatcher: Arc<Dispatcher>,
    ctx: ExecutionContext,
}

impl Stores {
    pub fn new(registry: StateRegistry, dispatcher: Arc<Dispatcher>, ctx: ExecutionContext) -> Self {
        Self { registry, dispatcher, ctx }
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn fetcher<T, F, Fut>(&self, label: &'static str, operation: F) -> ApiFetcher<T>
    where
        F: Fn(Arc<dyn ApiClient>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StashResult<ApiResponse<T>>> + Send + 'static,
    {
        ApiFetcher::new(label, Arc::clone(&self.dispatcher), self.ctx.clone(), operation)
    }

    /// The signed-in account. Loads on first use; empty without a credential.
    pub fn user_info(&self) -> StashResult<UserInfoStore> {
        let fetcher = self
            .fetcher("user info", |api| async move { api.get_account().await })
            .requiring_credential();
        BasicStore::new(&self.registry, USER_INFO_KEY, StoreOptions::auto_fetch(), fetcher)
    }

    pub fn dev_packages(&self) -> StashResult<DevPackagesStore> {
        let fetcher = self.fetcher("dev packages", |api| async move { api.get_dev_packages().await });
        BasicStore::new(&self.registry, DEV_PACKAGES_KEY, StoreOptions::default(), fetcher)
    }

    pub fn dev_package(&self, name: &str) -> StashResult<DevPackageStore> {
        let package = name.to_owned();
        let fetcher = self.fetcher("dev package", move |api| {
            let package = package.clone();
            async move { api.get_dev_package(&package).await }
        });
        StoreWithMetadata::new(
            &self.registry,
            dev_package_key(name),
            StoreOptions::auto_fetch(),
            DevPackageView::default(),
            fetcher,
        )
    }

    pub fn api_keys(&self) -> StashResult<ApiKeysStore> {
        let fetcher = self.fetcher("api keys", |api| async move { api.get_api_keys().await });
        BasicStore::new(&self.registry, API_KEYS_KEY, StoreOptions::default(), fetcher)
    }

    /// Releases of one package, loaded on demand.
    pub fn releases(&self, name: &str) -> StashResult<LazyReusableRequest<Vec<DevPackageRelease>>> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let ctx = self.ctx.clone();
        let package = name.to_owned();
        LazyReusableRequest::new(&self.registry, dev_package_releases_key(name), move || {
            let (dispatcher, ctx, package) = (Arc::clone(&dispatcher), ctx.clone(), package.clone());
            async move {
                dispatcher
                    .dispatch(&ctx, DispatchOptions::default(), |api| async move {
                        api.get_dev_package_releases(&package).await
                    })
                    .await
            }
        })
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("registry", &self.registry)
            .field("ctx", &self.ctx)
            .finish()
    }
}
