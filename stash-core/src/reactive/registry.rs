//! Keyed State Registry
//!
//! The registry maps string keys to cells. Asking for the same key twice
//! returns the same [`Signal`], which is what gives stores their
//! key-scoped singleton behavior: two stores built with the same key on
//! the same registry read and write one slot.
//!
//! # Lifecycle
//!
//! Cells are created on first access and live as long as the registry.
//! Nothing is collected implicitly.
//!
//! # Hydration
//!
//! Cells created through [`StateRegistry::hydratable`] carry a MessagePack
//! codec. [`StateRegistry::snapshot`] encodes all of them into a
//! [`Payload`]; [`StateRegistry::hydrate`] applies a payload to another
//! registry, overwriting live cells and staging the rest so their first
//! access decodes from the payload instead of running the initializer.
//! This is how state loaded while serving a request reaches the client.

use std::any::{type_name, Any};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::signal::Signal;
use crate::error::{StashError, StashResult};

/// Type-erased encode/decode over one registered signal.
trait CellCodec: Send + Sync {
    fn encode(&self, key: &str) -> StashResult<Vec<u8>>;
    fn decode_into(&self, key: &str, bytes: &[u8]) -> StashResult<()>;
}

struct SignalCodec<T>(Signal<T>);

impl<T> CellCodec for SignalCodec<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn encode(&self, key: &str) -> StashResult<Vec<u8>> {
        self.0
            .with(|value| rmp_serde::to_vec_named(value))
            .map_err(|source| StashError::Encode { key: key.to_owned(), source })
    }

    fn decode_into(&self, key: &str, bytes: &[u8]) -> StashResult<()> {
        let value = decode::<T>(key, bytes)?;
        self.0.set(value);
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StashResult<T> {
    rmp_serde::from_slice(bytes).map_err(|source| StashError::Decode { key: key.to_owned(), source })
}

struct Entry {
    cell: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    codec: Option<Arc<dyn CellCodec>>,
}

impl Entry {
    fn signal<T>(&self, key: &str) -> StashResult<Signal<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.cell
            .downcast_ref::<Signal<T>>()
            .cloned()
            .ok_or_else(|| StashError::TypeMismatch {
                key: key.to_owned(),
                expected: type_name::<T>(),
                found: self.type_name,
            })
    }
}

struct RegistryInner {
    /// Live cells in creation order.
    cells: RwLock<IndexMap<String, Entry>>,

    /// Hydration entries waiting for their cell to be created.
    staged: DashMap<String, Vec<u8>>,
}

/// Explicit keyed state container, passed to every store at construction.
///
/// Cloning the registry clones the handle.
#[derive(Clone)]
pub struct StateRegistry {
    inner: Arc<RegistryInner>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                cells: RwLock::new(IndexMap::new()),
                staged: DashMap::new(),
            }),
        }
    }

    /// Get or create the cell for `key`.
    ///
    /// `init` runs only when the key is new. Requesting a key that already
    /// holds a different type is a [`StashError::TypeMismatch`].
    pub fn cell<T, F>(&self, key: &str, init: F) -> StashResult<Signal<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Some(entry) = self.inner.cells.read().get(key) {
            return entry.signal(key);
        }
        self.insert_with(key, || Ok(Signal::new(init())), |_| None)
    }

    /// Like [`cell`](Self::cell), but the value takes part in snapshots and
    /// is seeded from a staged hydration entry when one exists.
    pub fn hydratable<T, F>(&self, key: &str, init: F) -> StashResult<Signal<T>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Some(entry) = self.inner.cells.read().get(key) {
            return entry.signal(key);
        }
        self.insert_with(
            key,
            || {
                let initial = match self.inner.staged.remove(key) {
                    Some((_, bytes)) => {
                        tracing::debug!(key, "seeding state from hydration payload");
                        decode::<T>(key, &bytes)?
                    }
                    None => init(),
                };
                Ok(Signal::new(initial))
            },
            |signal| Some(Arc::new(SignalCodec(signal.clone())) as Arc<dyn CellCodec>),
        )
    }

    fn insert_with<T, C, K>(&self, key: &str, create: C, codec: K) -> StashResult<Signal<T>>
    where
        T: Clone + Send + Sync + 'static,
        C: FnOnce() -> StashResult<Signal<T>>,
        K: FnOnce(&Signal<T>) -> Option<Arc<dyn CellCodec>>,
    {
        // Build outside the lock; the initializer may touch the registry.
        let signal = create()?;
        let codec = codec(&signal);

        let mut cells = self.inner.cells.write();
        if let Some(existing) = cells.get(key) {
            // Lost a creation race; the first writer wins.
            return existing.signal(key);
        }
        tracing::debug!(key, ty = type_name::<T>(), "registering state cell");
        cells.insert(
            key.to_owned(),
            Entry {
                cell: Arc::new(signal.clone()),
                type_name: type_name::<T>(),
                codec,
            },
        );
        Ok(signal)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.cells.read().contains_key(key)
    }

    /// Keys in creation order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.cells.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode every hydratable cell.
    pub fn snapshot(&self) -> StashResult<Payload> {
        let codecs: Vec<(String, Arc<dyn CellCodec>)> = self
            .inner
            .cells
            .read()
            .iter()
            .filter_map(|(k, e)| e.codec.clone().map(|c| (k.clone(), c)))
            .collect();

        let mut entries = IndexMap::with_capacity(codecs.len());
        for (key, codec) in codecs {
            let bytes = codec.encode(&key)?;
            entries.insert(key, bytes);
        }
        Ok(Payload { entries })
    }

    /// Apply a payload produced by [`snapshot`](Self::snapshot).
    ///
    /// Live hydratable cells are overwritten (subscribers fire). Keys not
    /// yet registered are staged. Keys that are live but not hydratable
    /// are skipped.
    pub fn hydrate(&self, payload: Payload) -> StashResult<()> {
        for (key, bytes) in payload.entries {
            let live = self
                .inner
                .cells
                .read()
                .get(&key)
                .map(|e| e.codec.clone());
            match live {
                Some(Some(codec)) => codec.decode_into(&key, &bytes)?,
                Some(None) => tracing::warn!(key, "payload entry targets a non-hydratable cell"),
                None => {
                    self.inner.staged.insert(key, bytes);
                }
            }
        }
        Ok(())
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRegistry")
            .field("keys", &self.keys())
            .field("staged", &self.inner.staged.len())
            .finish()
    }
}

/// Encoded hydratable state, keyed like the registry it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    entries: IndexMap<String, Vec<u8>>,
}

impl Payload {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the whole payload for transfer.
    pub fn to_bytes(&self) -> StashResult<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|source| StashError::Encode {
            key: "<payload>".into(),
            source,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> StashResult<Self> {
        decode("<payload>", bytes)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
