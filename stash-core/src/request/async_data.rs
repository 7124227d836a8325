//! The lazy fetch binding the request wrappers are built on.
//!
//! An [`AsyncData`] owns fresh `data`, `loading` and `error` cells and a
//! handler. Creating one does not run the handler; [`AsyncData::refresh`]
//! does. Every binding has its own cells, so recreating a binding means
//! new cell instances.

use std::sync::atomic::{AtomicU64, Ordering};

use super::Handler;
use crate::api::{ApiResponse, Failure};
use crate::reactive::{ReadSignal, Signal};

static BINDING_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A lazily executed fetch and the cells it writes.
pub struct AsyncData<T> {
    id: u64,
    handler: Handler<ApiResponse<T>>,
    data: Signal<Option<T>>,
    loading: Signal<bool>,
    error: Signal<Option<Failure>>,
}

impl<T> AsyncData<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create the binding. The handler is not called.
    pub fn new(handler: Handler<ApiResponse<T>>) -> Self {
        Self {
            id: BINDING_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            handler,
            data: Signal::new(None),
            loading: Signal::new(false),
            error: Signal::new(None),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn data(&self) -> &Signal<Option<T>> {
        &self.data
    }

    pub fn loading(&self) -> ReadSignal<bool> {
        self.loading.read_only()
    }

    pub fn error(&self) -> ReadSignal<Option<Failure>> {
        self.error.read_only()
    }

    /// Run the handler and publish its outcome.
    ///
    /// A failure empties `data` and is kept in `error`.
    pub async fn refresh(&self) {
        self.loading.set(true);
        match (self.handler)().await {
            ApiResponse::Success(data) => {
                self.error.set(None);
                self.data.set(Some(data));
            }
            ApiResponse::Failure(failure) => {
                tracing::debug!(binding = self.id, code = failure.code, "async data failed");
                self.data.set(None);
                self.error.set(Some(failure));
            }
        }
        self.loading.set(false);
    }

    /// Drop the loaded value and any error.
    pub fn clear(&self) {
        self.data.set(None);
        self.error.set(None);
        self.loading.set(false);
    }
}

impl<T> Clone for AsyncData<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: self.handler.clone(),
            data: self.data.clone(),
            loading: self.loading.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T> std::fmt::Debug for AsyncData<T>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncData")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("loading", &self.loading.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::handler;

    #[tokio::test]
    async fn created_lazily_then_refreshed() {
        let binding = AsyncData::new(handler(|| async { ApiResponse::Success(7_u32) }));
        assert_eq!(binding.data().get(), None);
        assert!(!binding.loading().get());

        binding.refresh().await;
        assert_eq!(binding.data().get(), Some(7));
        assert!(!binding.loading().get());
    }

    #[tokio::test]
    async fn failure_is_recorded() {
        let binding: AsyncData<u32> =
            AsyncData::new(handler(|| async { ApiResponse::failure(404, "Not found") }));
        binding.data().set(Some(1));

        binding.refresh().await;
        assert_eq!(binding.data().get(), None);
        assert_eq!(binding.error().get().map(|f| f.code), Some(404));

        binding.clear();
        assert_eq!(binding.error().get(), None);
    }
}
