//! Stores that carry a second, metadata cell.
//!
//! The metadata lives under `<key>::metadata` and starts at a
//! caller-supplied default. It is independent of the main value except
//! that [`Store::clear`] resets both together.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::basic::{merge_into, BasicStore, Fetcher, Modifiable, Store, StoreOptions};
use super::merge::Merge;
use crate::error::StashResult;
use crate::reactive::{ReadSignal, Signal, StateRegistry};

/// Registry key of the metadata cell belonging to `key`.
pub fn metadata_key(key: &str) -> String {
    format!("{key}::metadata")
}

/// Stores exposing a metadata cell.
pub trait WithMetadata: Store {
    type Metadata: Merge + Clone + Send + Sync + 'static;

    fn use_metadata(&self) -> ReadSignal<Self::Metadata>;

    /// Merge `patch` into the metadata. Always succeeds.
    fn update_metadata(&self, patch: <Self::Metadata as Merge>::Patch);
}

/// A [`BasicStore`] plus a metadata cell.
pub struct StoreWithMetadata<T, M, F> {
    base: BasicStore<T, F>,
    metadata: Signal<M>,
    default_metadata: M,
}

impl<T, M, F> StoreWithMetadata<T, M, F>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    M: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    pub fn new(
        registry: &StateRegistry,
        key: impl Into<String>,
        options: StoreOptions,
        default_metadata: M,
        fetcher: F,
    ) -> StashResult<Self> {
        let base = BasicStore::new(registry, key, options, fetcher)?;
        let seed = default_metadata.clone();
        let metadata = registry.hydratable(&metadata_key(base.key()), move || seed)?;
        Ok(Self { base, metadata, default_metadata })
    }
}

#[async_trait]
impl<T, M, F> Store for StoreWithMetadata<T, M, F>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    M: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    type Value = T;

    fn key(&self) -> &str {
        self.base.key()
    }

    fn options(&self) -> StoreOptions {
        self.base.options()
    }

    fn state(&self) -> ReadSignal<Option<T>> {
        self.base.state()
    }

    fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    async fn refresh(&self) {
        self.base.refresh().await;
    }

    fn clear(&self) {
        self.base.clear();
        self.metadata.set(self.default_metadata.clone());
    }
}

impl<T, M, F> WithMetadata for StoreWithMetadata<T, M, F>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    M: Merge + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    type Metadata = M;

    fn use_metadata(&self) -> ReadSignal<M> {
        self.metadata.read_only()
    }

    fn update_metadata(&self, patch: M::Patch) {
        self.metadata.update(|current| {
            let mut next = current.clone();
            next.merge(patch);
            next
        });
    }
}

impl<T, M, F> Modifiable for StoreWithMetadata<T, M, F>
where
    T: Merge + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    M: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: Fetcher<T>,
{
    type Patch = T::Patch;

    fn update(&self, patch: T::Patch) -> StashResult<()> {
        merge_into(self.base.key(), &self.base.state, patch)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
