//! Signal Implementation
//!
//! A Signal is the mutable reactive cell every store and request binding
//! is built on. It holds a value and a list of subscribers.
//!
//! # How Signals Work
//!
//! 1. Cloning a signal clones the handle, not the value. All clones read
//!    and write the same slot.
//!
//! 2. A write replaces the value under the write lock, releases it, and
//!    then notifies every subscriber. Readers observe the old or the new
//!    value, never a mix.
//!
//! 3. Subscriptions are explicit. Derived cells and watchers call
//!    [`Dependency::subscribe`] for every cell they read.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::subscriber::{Dependency, Notifier, SubscriberId, Subscribers};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A reactive cell holding a value of type `T`.
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T> {
    /// Unique identifier for this signal.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Callbacks run after every write.
    subscribers: Subscribers,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: next_signal_id(),
            value: Arc::new(RwLock::new(value)),
            subscribers: Subscribers::default(),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
        self.subscribers.notify_all();
    }

    /// Compute a new value from the current one and store it.
    ///
    /// The read and the write are two steps; a concurrent writer can land
    /// in between and will be overwritten.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(next);
    }

    /// Hand out a read-only view of this signal.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal { inner: self.clone() }
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> Dependency for Signal<T>
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

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*self.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Read-only handle to a [`Signal`].
///
/// Stores return these from `use_state` so callers can observe but not
/// bypass the store's operations.
pub struct ReadSignal<T> {
    inner: Signal<T>,
}

impl<T> ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn get(&self) -> T {
        self.inner.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    pub fn id(&self) -> u64 {
        self.inner.id()
    }
}

impl<T> Dependency for ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self, id: SubscriberId, notify: Notifier) {
        self.inner.subscribe(id, notify);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.inner.unsubscribe(id);
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> Debug for ReadSignal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadSignal").field(&self.inner).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_notifies_and_unsubscribes() {
        let signal = Signal::new(0);
        let call_count = Arc::new(AtomicI32::new(0));
        let counter = call_count.clone();

        let id = SubscriberId::new();
        signal.subscribe(id, Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        signal.set(1);
        signal.set(2);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);

        signal.unsubscribe(id);
        signal.set(3);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn notifier_sees_new_value() {
        let signal = Signal::new(String::from("old"));
        let seen = Arc::new(RwLock::new(String::new()));

        let (reader, sink) = (signal.clone(), seen.clone());
        signal.subscribe(SubscriberId::new(), Arc::new(move || {
            *sink.write() = reader.get();
        }));

        signal.set("new".into());
        assert_eq!(*seen.read(), "new");
    }

    #[test]
    fn read_only_view_tracks_writes() {
        let signal = Signal::new(Some(1));
        let view = signal.read_only();

        signal.set(None);
        assert_eq!(view.get(), None);
        assert_eq!(view.id(), signal.id());
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1.id(), signal2.id());
    }
}
