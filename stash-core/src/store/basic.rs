//! The basic store and the traits every store implements.
//!
//! A store binds a key to a registry cell holding `Option<T>` and to a
//! [`Fetcher`] that knows how to load `T`. The cell is either `None` or a
//! complete value; fetch results are written in one assignment.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::merge::Merge;
use crate::error::{StashError, StashResult};
use crate::reactive::{ReadSignal, Signal, StateRegistry};

/// Construction-time store options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// `use_state` loads the value first when the cell is empty.
    pub enable_auto_fetch_if_empty: bool,
}

impl StoreOptions {
    pub fn auto_fetch() -> Self {
        Self { enable_auto_fetch_if_empty: true }
    }
}

/// Loads the value behind a store.
///
/// `fetch` must not fail: errors are logged and reported as `None`.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    async fn fetch(&self) -> Option<T>;

    /// Whether a cached value counts as loaded. Presence is the only signal.
    fn validate(&self, value: &Option<T>) -> bool {
        value.is_some()
    }
}

/// A [`Fetcher`] backed by a closure.
pub struct FnFetcher<T> {
    fetch: Arc<dyn Fn() -> BoxFuture<'static, Option<T>> + Send + Sync>,
}

/// Wrap an async closure as a fetcher.
pub fn fetch_fn<T, F, Fut>(fetch: F) -> FnFetcher<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    FnFetcher { fetch: Arc::new(move || fetch().boxed()) }
}

#[async_trait]
impl<T: Send + 'static> Fetcher<T> for FnFetcher<T> {
    async fn fetch(&self) -> Option<T> {
        (self.fetch)().await
    }
}

/// Lifecycle shared by all stores.
#[async_trait]
pub trait Store: Send + Sync {
    type Value: Clone + Send + Sync + 'static;

    fn key(&self) -> &str;

    fn options(&self) -> StoreOptions;

    /// The cell, without any fetching.
    fn state(&self) -> ReadSignal<Option<Self::Value>>;

    /// Whether the cell currently holds a loaded value.
    fn is_valid(&self) -> bool;

    /// Fetch and overwrite the cell, even if it holds a value.
    async fn refresh(&self);

    /// Set the cell back to empty.
    fn clear(&self);

    /// Refresh only when the cell is empty.
    async fn refresh_if_needed(&self) {
        if !self.is_valid() {
            self.refresh().await;
        }
    }

    /// The cell, loading it first if the store auto-fetches.
    async fn use_state(&self) -> ReadSignal<Option<Self::Value>> {
        if self.options().enable_auto_fetch_if_empty {
            self.refresh_if_needed().await;
        }
        self.state()
    }
}

/// Stores whose value can be patched locally.
pub trait Modifiable: Store {
    type Patch;

    /// Merge `patch` into the loaded value.
    ///
    /// Fails with [`StashError::StoreUpdateWithoutData`] and leaves the
    /// cell alone when nothing is loaded. Does not fetch and does not talk
    /// to the remote side.
    fn update(&self, patch: Self::Patch) -> StashResult<()>;
}

/// The plain store: one keyed cell and a fetcher.
pub struct BasicStore<T, F> {
    key: String,
    pub(super) state: Signal<Option<T>>,
    options: StoreOptions,
    fetcher: F,
}

impl<T, F> BasicStore<T, F>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    /// Bind `key` in `registry`. Stores built with the same key share the cell.
    pub fn new(registry: &StateRegistry, key: impl Into<String>, options: StoreOptions, fetcher: F) -> StashResult<Self> {
        let key = key.into();
        let state = registry.hydratable(&key, || None)?;
        Ok(Self { key, state, options, fetcher })
    }
}

#[async_trait]
impl<T, F> Store for BasicStore<T, F>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    type Value = T;

    fn key(&self) -> &str {
        &self.key
    }

    fn options(&self) -> StoreOptions {
        self.options
    }

    fn state(&self) -> ReadSignal<Option<T>> {
        self.state.read_only()
    }

    fn is_valid(&self) -> bool {
        self.state.with(|value| self.fetcher.validate(value))
    }

    async fn refresh(&self) {
        let data = self.fetcher.fetch().await;
        tracing::debug!(key = %self.key, loaded = data.is_some(), "store refreshed");
        self.state.set(data);
    }

    fn clear(&self) {
        tracing::debug!(key = %self.key, "store cleared");
        self.state.set(None);
    }
}

impl<T, F> Modifiable for BasicStore<T, F>
where
    T: Merge + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    type Patch = T::Patch;

    fn update(&self, patch: T::Patch) -> StashResult<()> {
        merge_into(&self.key, &self.state, patch)
    }
}

/// Read, merge, write back. No guard against a write landing in between.
pub(crate) fn merge_into<T>(key: &str, state: &Signal<Option<T>>, patch: T::Patch) -> StashResult<()>
where
    T: Merge + Clone + Send + Sync + 'static,
{
    let Some(mut current) = state.get() else {
        tracing::error!(key, "cannot update store: no value is loaded");
        return Err(StashError::StoreUpdateWithoutData { key: key.to_owned() });
    };
    current.merge(patch);
    state.set(Some(current));
    Ok(())
}

impl<T, F> std::fmt::Debug for BasicStore<T, F>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicStore")
            .field("key", &self.key)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
