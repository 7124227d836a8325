//! Effect Implementation
//!
//! An Effect is a side-effecting watcher over a fixed set of cells.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs once.
//!
//! 2. It subscribes to every dependency it was given. Each notification
//!    reruns it synchronously, on the writer's stack.
//!
//! 3. After [`Effect::dispose`] it detaches from its dependencies and never
//!    runs again.
//!
//! Effects are how callers observe store fan-out without polling.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::subscriber::{Dependency, SubscriberId};

type Detach = Box<dyn Fn(SubscriberId) + Send + Sync>;

/// A side-effecting computation rerun whenever a dependency changes.
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let reader = count.clone();
/// let effect = Effect::watch(&[&count], move || println!("{}", reader.get()));
/// count.set(5); // prints 5
/// ```
pub struct Effect {
    subscriber_id: SubscriberId,

    run: Arc<dyn Fn() + Send + Sync>,

    disposed: Arc<AtomicBool>,

    run_count: Arc<AtomicUsize>,

    /// Unsubscribe hooks, one per dependency.
    detach: Arc<Mutex<Vec<Detach>>>,
}

impl Effect {
    /// Run `run` now and again after any of `dependencies` changes.
    pub fn watch<F>(dependencies: &[&dyn WatchTarget], run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self {
            subscriber_id: SubscriberId::new(),
            run: Arc::new(run),
            disposed: Arc::new(AtomicBool::new(false)),
            run_count: Arc::new(AtomicUsize::new(0)),
            detach: Arc::new(Mutex::new(Vec::new())),
        };

        for dependency in dependencies {
            dependency.attach(&effect);
        }
        effect.execute();
        effect
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    /// Run the effect body unless disposed.
    pub fn execute(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        (self.run)();
        self.run_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Detach from all dependencies; the effect will not run again.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks = std::mem::take(&mut *self.detach.lock());
        for hook in hooks {
            hook(self.subscriber_id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Number of times the body has run, including the initial run.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }

    fn runner(&self) -> Arc<dyn Fn() + Send + Sync> {
        let run = Arc::clone(&self.run);
        let disposed = Arc::clone(&self.disposed);
        let run_count = Arc::clone(&self.run_count);
        Arc::new(move || {
            if !disposed.load(Ordering::SeqCst) {
                run();
                run_count.fetch_add(1, Ordering::SeqCst);
            }
        })
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            subscriber_id: self.subscriber_id,
            run: Arc::clone(&self.run),
            disposed: Arc::clone(&self.disposed),
            run_count: Arc::clone(&self.run_count),
            detach: Arc::clone(&self.detach),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("subscriber_id", &self.subscriber_id)
            .field("run_count", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Object-safe adapter so an effect can watch cells of different types.
pub trait WatchTarget {
    fn attach(&self, effect: &Effect);
}

impl<D> WatchTarget for D
where
    D: Dependency + Clone + 'static,
{
    fn attach(&self, effect: &Effect) {
        self.subscribe(effect.subscriber_id, effect.runner());
        let target = self.clone();
        effect
            .detach
            .lock()
            .push(Box::new(move |id| target.unsubscribe(id)));
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
