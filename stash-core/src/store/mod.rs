//! Key-scoped stores.
//!
//! A store caches one remote entity in a registry cell and knows how to
//! fetch, refresh, clear and (for modifiable stores) patch it.
//!
//! # Composition
//!
//! - [`Store`]: the lifecycle every store has (`use_state`, `refresh`,
//!   `refresh_if_needed`, `clear`).
//! - [`Modifiable`]: adds a local merge-style `update`.
//! - [`WithMetadata`]: adds a second cell reset together with the value.
//!
//! [`BasicStore`] and [`StoreWithMetadata`] implement these over any
//! [`Fetcher`]; the concrete API stores are type aliases over them.
//!
//! # Concurrency
//!
//! Overlapping refreshes are not coalesced. Each one fetches and writes
//! the cell when it completes, so a slower, older request can overwrite a
//! newer result. `update` reads then writes with the same exposure.

mod basic;
mod entities;
mod merge;
mod metadata;

pub use basic::{fetch_fn, BasicStore, Fetcher, FnFetcher, Modifiable, Store, StoreOptions};
pub use entities::{
    dev_package_key, dev_package_releases_key, ApiFetcher, ApiKeysStore, DevPackageStore, DevPackagesStore,
    Stores, UserInfoStore, API_KEYS_KEY, DEV_PACKAGES_KEY, USER_INFO_KEY,
};
pub use merge::Merge;
pub use metadata::{metadata_key, StoreWithMetadata, WithMetadata};
