//! Subscriber bookkeeping for the reactive cells.
//!
//! Every cell keeps an explicit list of notification callbacks keyed by
//! [`SubscriberId`]. There is no ambient tracking: a derived cell or a
//! watcher names the cells it depends on and subscribes to them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

/// Unique identifier for a subscriber.
///
/// Used to remove a subscription again and to keep one callback per
/// subscriber per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new process-unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked after a cell changed.
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Anything a subscriber can attach to.
pub trait Dependency: Send + Sync {
    /// Register `notify` under `id`, replacing an earlier callback for the same id.
    fn subscribe(&self, id: SubscriberId, notify: Notifier);

    /// Drop the callback registered under `id`, if any.
    fn unsubscribe(&self, id: SubscriberId);
}

/// Shared list of notification callbacks.
///
/// Most cells have a handful of subscribers, so the list lives inline.
#[derive(Clone, Default)]
pub(crate) struct Subscribers {
    inner: Arc<RwLock<SmallVec<[(SubscriberId, Notifier); 4]>>>,
}

impl Subscribers {
    pub(crate) fn insert(&self, id: SubscriberId, notify: Notifier) {
        let mut list = self.inner.write();
        match list.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = notify,
            None => list.push((id, notify)),
        }
    }

    pub(crate) fn remove(&self, id: SubscriberId) {
        self.inner.write().retain(|(existing, _)| *existing != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Call every callback.
    ///
    /// The list is copied out first so callbacks may (un)subscribe freely.
    pub(crate) fn notify_all(&self) {
        let snapshot: SmallVec<[Notifier; 4]> =
            self.inner.read().iter().map(|(_, n)| Arc::clone(n)).collect();
        for notify in snapshot {
            notify();
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn insert_replaces_callback_for_same_id() {
        let subs = Subscribers::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = SubscriberId::new();

        let h = hits.clone();
        subs.insert(id, Arc::new(move || { h.fetch_add(1, Ordering::SeqCst); }));
        let h = hits.clone();
        subs.insert(id, Arc::new(move || { h.fetch_add(10, Ordering::SeqCst); }));

        assert_eq!(subs.len(), 1);
        subs.notify_all();
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn callbacks_may_unsubscribe_while_notified() {
        let subs = Subscribers::default();
        let id = SubscriberId::new();
        let inner = subs.clone();
        subs.insert(id, Arc::new(move || inner.remove(id)));

        subs.notify_all();
        assert_eq!(subs.len(), 0);
    }
}
