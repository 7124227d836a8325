//! Computed Implementation
//!
//! A Computed is a derived cell: a getter over other cells, an optional
//! setter, and a cached result.
//!
//! # How Computeds Work
//!
//! 1. Dependencies are declared with [`Computed::depends_on`]. The computed
//!    subscribes to each of them.
//!
//! 2. On first access the getter runs and the result is cached.
//!
//! 3. When a dependency notifies, the computed is marked dirty and forwards
//!    the notification to its own subscribers. Nothing is recomputed yet.
//!
//! 4. The next `get` reruns the getter.
//!
//! 5. When the last clone is dropped, the computed unsubscribes from every
//!    dependency it tracked.
//!
//! The getter may read any state it likes, including state that is not a
//! declared dependency (for instance "whichever binding is live right now").
//! It only gets re-evaluated when a declared dependency fires, which is
//! what the link signal in [`crate::request`] relies on.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::subscriber::{Dependency, Notifier, SubscriberId, Subscribers};
use crate::error::{StashError, StashResult};

static COMPUTED_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_computed_id() -> u64 {
    COMPUTED_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Dirty state for a computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency fired since the last evaluation.
    Dirty,
}

type Getter<T> = Arc<dyn Fn() -> T + Send + Sync>;
type Setter<T> = Arc<dyn Fn(T) -> StashResult<()> + Send + Sync>;
type Detach = Box<dyn Fn(SubscriberId) + Send + Sync>;

/// Subscriptions shared by all clones of one computed.
struct Links {
    id: SubscriberId,
    detach: Mutex<Vec<Detach>>,
}

impl Drop for Links {
    fn drop(&mut self) {
        for hook in self.detach.get_mut().drain(..) {
            hook(self.id);
        }
    }
}

/// A derived cell that recomputes after one of its dependencies changed.
pub struct Computed<T> {
    id: u64,

    /// Identity used when subscribing to dependencies.
    links: Arc<Links>,

    compute: Getter<T>,

    /// Write path; `None` makes the computed read-only.
    setter: Option<Setter<T>>,

    /// The cached value (None if never computed).
    value: Arc<RwLock<Option<T>>>,

    state: Arc<RwLock<ComputedState>>,

    /// Subscribers to this computed.
    subscribers: Subscribers,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a read-only computed. The getter runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            id: next_computed_id(),
            links: Arc::new(Links {
                id: SubscriberId::new(),
                detach: Mutex::new(Vec::new()),
            }),
            compute: Arc::new(compute),
            setter: None,
            value: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(ComputedState::Dirty)),
            subscribers: Subscribers::default(),
        }
    }

    /// Create a writable computed.
    pub fn with_setter<F, S>(compute: F, setter: S) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        S: Fn(T) -> StashResult<()> + Send + Sync + 'static,
    {
        let mut computed = Self::new(compute);
        computed.setter = Some(Arc::new(setter));
        computed
    }

    /// Declare a dependency.
    pub fn depends_on<D: Dependency + Clone + 'static>(self, dependency: &D) -> Self {
        self.track(dependency);
        self
    }

    /// Subscribe to `dependency` after construction.
    pub fn track<D: Dependency + Clone + 'static>(&self, dependency: &D) {
        let state = Arc::clone(&self.state);
        let subscribers = self.subscribers.clone();
        dependency.subscribe(
            self.links.id,
            Arc::new(move || {
                *state.write() = ComputedState::Dirty;
                subscribers.notify_all();
            }),
        );
        let target = dependency.clone();
        self.links
            .detach
            .lock()
            .push(Box::new(move |id| target.unsubscribe(id)));
    }

    /// Stop listening to `dependency`.
    pub fn untrack(&self, dependency: &impl Dependency) {
        dependency.unsubscribe(self.links.id);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value, recomputing if a dependency fired.
    pub fn get(&self) -> T {
        if *self.state.read() == ComputedState::Clean {
            if let Some(value) = self.value.read().clone() {
                return value;
            }
        }
        self.recompute()
    }

    /// Write through the setter.
    pub fn set(&self, value: T) -> StashResult<()> {
        match &self.setter {
            Some(setter) => setter(value),
            None => Err(StashError::ReadOnly(format!("computed #{}", self.id))),
        }
    }

    pub fn state(&self) -> ComputedState {
        *self.state.read()
    }

    pub fn has_value(&self) -> bool {
        self.value.read().is_some()
    }

    fn recompute(&self) -> T {
        // Mark clean first so a dependency firing mid-evaluation leaves us dirty.
        *self.state.write() = ComputedState::Clean;
        let next = (self.compute)();
        *self.value.write() = Some(next.clone());
        next
    }
}

impl<T> Dependency for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self, id: SubscriberId, notify: Notifier) {
        self.subscribers.insert(id, notify);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.remove(id);
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            links: Arc::clone(&self.links),
            compute: Arc::clone(&self.compute),
            setter: self.setter.clone(),
            value: Arc::clone(&self.value),
            state: Arc::clone(&self.state),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("value", &*self.value.read())
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
