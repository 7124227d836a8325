//! Keyed, re-initializable request wrapper.
//!
//! # The link
//!
//! Each key owns a [`Link`] in the registry: a tagged [`Binding`] (either
//! unbound or pointing at the live [`AsyncData`]) and a generation counter.
//! Every wrapper built for the key exposes `data`/`loading`/`error` as
//! [`Computed`] views that read through the link and depend only on the
//! generation counter.
//!
//! The generation is bumped when the binding is swapped and whenever the
//! live binding publishes a change. A view captured before a swap therefore
//! keeps following the live binding instead of a dead set of cells.
//! Views detach from the link once their last handle is dropped, so
//! building a wrapper per use does not grow the link's subscriber list.
//!
//! # States
//!
//! - Unbound: views read `None` / `false`.
//! - Bound: views proxy to the binding. `init` is a no-op from here;
//!   only [`LazyReusableRequest::recreate`] installs a fresh binding.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;

use super::async_data::AsyncData;
use super::{handler, Handler};
use crate::api::{ApiResponse, Failure};
use crate::error::{StashError, StashResult};
use crate::reactive::{Computed, Dependency, Notifier, Signal, StateRegistry, SubscriberId};

/// Registry key of the link for request `key`. Kept apart from store keys.
pub fn request_key(key: &str) -> String {
    format!("$request::{key}")
}

/// Which binding a link currently points at.
pub enum Binding<T> {
    Unbound,
    Bound(AsyncData<T>),
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Unbound => Self::Unbound,
            Self::Bound(binding) => Self::Bound(binding.clone()),
        }
    }
}

/// Shared indirection for one request key.
pub struct Link<T> {
    binding: RwLock<Binding<T>>,
    generation: Signal<u64>,
    /// Identity of the relay subscribed to the live binding's cells.
    relay: SubscriberId,
}

impl<T> Link<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            binding: RwLock::new(Binding::Unbound),
            generation: Signal::new(0),
            relay: SubscriberId::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn binding(&self) -> Binding<T> {
        self.binding.read().clone()
    }

    /// Bind `make()` unless something is bound already. Returns the live binding.
    fn ensure_bound(&self, make: impl FnOnce() -> AsyncData<T>) -> AsyncData<T> {
        let created = {
            let mut slot = self.binding.write();
            if let Binding::Bound(live) = &*slot {
                return live.clone();
            }
            let fresh = make();
            *slot = Binding::Bound(fresh.clone());
            fresh
        };
        self.attach(None, &created);
        created
    }

    /// Replace whatever is bound with `fresh`.
    fn rebind(&self, fresh: AsyncData<T>) {
        let previous = std::mem::replace(&mut *self.binding.write(), Binding::Bound(fresh.clone()));
        let previous = match previous {
            Binding::Bound(old) => Some(old),
            Binding::Unbound => None,
        };
        self.attach(previous.as_ref(), &fresh);
    }

    fn attach(&self, previous: Option<&AsyncData<T>>, fresh: &AsyncData<T>) {
        if let Some(old) = previous {
            old.data().unsubscribe(self.relay);
            old.loading().unsubscribe(self.relay);
            old.error().unsubscribe(self.relay);
        }

        let generation = self.generation.clone();
        let relay: Notifier = Arc::new(move || generation.update(|g| g + 1));
        fresh.data().subscribe(self.relay, Arc::clone(&relay));
        fresh.loading().subscribe(self.relay, Arc::clone(&relay));
        fresh.error().subscribe(self.relay, relay);

        tracing::debug!(binding = fresh.id(), replaced = previous.map(AsyncData::id), "request link rebound");
        self.generation.update(|g| g + 1);
    }
}

/// A keyed fetch whose binding can be torn down and recreated while the
/// `data`/`loading` handles given to callers stay valid.
pub struct LazyReusableRequest<T> {
    key: String,
    link: Arc<Link<T>>,
    handler: Handler<ApiResponse<T>>,
    data: Computed<Option<T>>,
    loading: Computed<bool>,
    error: Computed<Option<Failure>>,
}

impl<T> LazyReusableRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap `run` under `key`. Nothing is bound or fetched yet.
    ///
    /// Wrappers created with the same key on the same registry share the link.
    pub fn new<F, Fut>(registry: &StateRegistry, key: impl Into<String>, run: F) -> StashResult<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResponse<T>> + Send + 'static,
    {
        let key = key.into();
        let link = registry.cell(&request_key(&key), || Arc::new(Link::<T>::new()))?.get();

        let data = {
            let (read, write) = (Arc::clone(&link), Arc::clone(&link));
            Computed::with_setter(
                move || match &*read.binding.read() {
                    Binding::Bound(live) => live.data().get(),
                    Binding::Unbound => None,
                },
                move |value| match &*write.binding.read() {
                    Binding::Bound(live) => {
                        live.data().set(value);
                        Ok(())
                    }
                    Binding::Unbound => Err(StashError::ReadOnly("unbound request data".into())),
                },
            )
            .depends_on(&link.generation)
        };

        let loading = {
            let read = Arc::clone(&link);
            Computed::new(move || match &*read.binding.read() {
                Binding::Bound(live) => live.loading().get(),
                Binding::Unbound => false,
            })
            .depends_on(&link.generation)
        };

        let error = {
            let read = Arc::clone(&link);
            Computed::new(move || match &*read.binding.read() {
                Binding::Bound(live) => live.error().get(),
                Binding::Unbound => None,
            })
            .depends_on(&link.generation)
        };

        Ok(Self {
            key,
            link,
            handler: handler(run),
            data,
            loading,
            error,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_bound(&self) -> bool {
        matches!(*self.link.binding.read(), Binding::Bound(_))
    }

    pub fn generation(&self) -> u64 {
        self.link.generation()
    }

    /// Identity of the live binding, if any.
    pub fn binding_id(&self) -> Option<u64> {
        match self.link.binding() {
            Binding::Bound(live) => Some(live.id()),
            Binding::Unbound => None,
        }
    }

    /// Create the binding if there is none. Does not fetch.
    pub fn init(&self) {
        self.link.ensure_bound(|| AsyncData::new(self.handler.clone()));
    }

    /// Install a fresh binding even if one exists.
    pub fn recreate(&self) {
        self.link.rebind(AsyncData::new(self.handler.clone()));
    }

    /// Bind if needed, run the fetch, and hand back the `data` view.
    pub async fn fetch_data(&self) -> Computed<Option<T>> {
        let live = self.link.ensure_bound(|| AsyncData::new(self.handler.clone()));
        live.refresh().await;
        self.data.clone()
    }

    /// Clear the live binding's cells. No-op while unbound.
    pub fn clear_data(&self) {
        if let Binding::Bound(live) = self.link.binding() {
            live.clear();
        }
    }

    pub fn data(&self) -> Computed<Option<T>> {
        self.data.clone()
    }

    pub fn loading(&self) -> Computed<bool> {
        self.loading.clone()
    }

    pub fn error(&self) -> Computed<Option<Failure>> {
        self.error.clone()
    }
}

impl<T> std::fmt::Debug for LazyReusableRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyReusableRequest")
            .field("key", &self.key)
            .field("bound", &matches!(*self.link.binding.read(), Binding::Bound(_)))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counter_request(registry: &StateRegistry, key: &str) -> (LazyReusableRequest<u32>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let request = LazyReusableRequest::new(registry, key, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { ApiResponse::Success(n * 10) }
        })
        .unwrap();
        (request, calls)
    }

    #[test]
    fn unbound_reads_are_empty() {
        let registry = StateRegistry::new();
        let (request, calls) = counter_request(&registry, "r");

        assert!(!request.is_bound());
        assert_eq!(request.data().get(), None);
        assert!(!request.loading().get());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn init_is_idempotent() {
        let registry = StateRegistry::new();
        let (request, _) = counter_request(&registry, "r");

        request.init();
        let generation = request.generation();
        request.init();
        assert!(request.is_bound());
        assert_eq!(request.generation(), generation);
    }

    #[tokio::test]
    async fn fetch_data_binds_and_loads() {
        let registry = StateRegistry::new();
        let (request, calls) = counter_request(&registry, "r");

        let data = request.fetch_data().await;
        assert_eq!(data.get(), Some(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn views_follow_recreated_binding() {
        let registry = StateRegistry::new();
        let (request, _) = counter_request(&registry, "r");
        let captured = request.fetch_data().await;
        assert_eq!(captured.get(), Some(10));

        request.recreate();
        assert_eq!(captured.get(), None);

        request.fetch_data().await;
        assert_eq!(captured.get(), Some(20));
    }

    #[tokio::test]
    async fn unbound_setter_is_rejected() {
        let registry = StateRegistry::new();
        let (request, _) = counter_request(&registry, "r");
        assert!(request.data().set(Some(1)).is_err());

        request.init();
        request.data().set(Some(5)).unwrap();
        assert_eq!(request.data().get(), Some(5));
    }

    #[test]
    fn dropped_wrappers_release_the_link() {
        let registry = StateRegistry::new();
        let (kept, _) = counter_request(&registry, "r");
        for _ in 0..100 {
            let _ = counter_request(&registry, "r");
        }
        assert_eq!(kept.link.generation.subscriber_count(), 3);
    }

    #[tokio::test]
    async fn view_outlives_its_wrapper() {
        let registry = StateRegistry::new();
        let view = {
            let (request, _) = counter_request(&registry, "r");
            request.data()
        };

        let (other, _) = counter_request(&registry, "r");
        other.fetch_data().await;
        assert_eq!(view.get(), Some(10));
    }
}
