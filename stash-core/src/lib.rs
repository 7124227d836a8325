//! Stash Core
//!
//! This crate provides the state layer of a package-registry front end.
//! It implements:
//!
//! - Reactive cells (signals, computeds, effects) and a keyed registry
//! - Key-scoped stores with fetch, refresh, clear and local patching
//! - An authentication-aware dispatcher for every remote call
//! - Lazy request wrappers, including one that survives re-initialization
//!
//! The same code runs while serving a request and in the long-lived
//! client. The difference is carried by an explicit [`ExecutionContext`]
//! and a [`StateRegistry`], never by ambient globals.
//!
//! # Architecture
//!
//! - `reactive`: cells, explicit dependencies, the keyed registry and hydration
//! - `store`: the store traits, generic stores and the API-backed stores
//! - `auth`: cookies, execution contexts and the dispatcher
//! - `request`: one-shot and reusable request wrappers
//! - `api`: response envelopes, entity types and the transport trait
//! - `guard`: route authorization on top of the user store
//!
//! # Example
//!
//! ```rust,ignore
//! use stash_core::{Dispatcher, ExecutionContext, StateRegistry, Store, Stores};
//!
//! let dispatcher = Arc::new(Dispatcher::new(api, ClientConfig::from_env()));
//! let stores = Stores::new(StateRegistry::new(), dispatcher, ctx);
//!
//! // Loads the account on first use; later calls reuse the cell.
//! let user = stores.user_info()?.use_state().await;
//! println!("{:?}", user.get());
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod reactive;
pub mod request;
pub mod store;

pub use api::{ApiClient, ApiResponse, Failure};
pub use auth::{DispatchOptions, Dispatcher, ExecutionContext};
pub use config::ClientConfig;
pub use error::{StashError, StashResult};
pub use guard::{authorize, GuardOutcome};
pub use reactive::{Computed, Effect, Signal, StateRegistry};
pub use request::{AsyncData, LazyRequest, LazyReusableRequest};
pub use store::{Modifiable, Store, Stores, WithMetadata};
