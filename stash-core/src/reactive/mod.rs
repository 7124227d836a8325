//! Reactive Primitives
//!
//! This module implements the cells the store layer is built on: signals,
//! computeds, effects, and the keyed registry that hands them out.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. Writing it notifies every
//! subscriber after the new value is in place.
//!
//! ## Computeds
//!
//! A Computed is a derived value with an optional setter. It caches its
//! result and is invalidated when one of its declared dependencies fires.
//!
//! ## Effects
//!
//! An Effect reruns a side-effecting closure whenever one of the cells it
//! watches changes.
//!
//! ## Registry
//!
//! The [`StateRegistry`] maps string keys to signals so independently built
//! stores that share a key share state.
//!
//! # Implementation Notes
//!
//! Dependencies are explicit. Nothing is tracked implicitly through
//! thread-local state: a computed lists what it depends on, and a cell
//! notifies exactly the subscribers that registered with it.

mod computed;
mod effect;
mod registry;
mod signal;
mod subscriber;

pub use computed::{Computed, ComputedState};
pub use effect::{Effect, WatchTarget};
pub use registry::{Payload, StateRegistry};
pub use signal::{ReadSignal, Signal};
pub use subscriber::{Dependency, Notifier, SubscriberId};
