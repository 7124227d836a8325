//! Request wrappers.
//!
//! - [`LazyRequest`]: run an async handler on demand with a `loading` flag.
//! - [`AsyncData`]: a lazily executed fetch binding with its own cells.
//! - [`LazyReusableRequest`]: a keyed [`AsyncData`] behind a link that
//!   survives rebinding.

mod async_data;
mod lazy;
mod reusable;

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

pub use async_data::AsyncData;
pub use lazy::LazyRequest;
pub use reusable::{request_key, Binding, LazyReusableRequest, Link};

/// A shareable async operation producing `T`.
pub type Handler<T> = Arc<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>;

/// Box an async closure as a [`Handler`].
pub fn handler<T, F, Fut>(run: F) -> Handler<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    Arc::new(move || run().boxed())
}
