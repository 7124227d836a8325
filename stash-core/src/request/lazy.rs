//! One-shot request wrapper with a loading flag.

use std::future::Future;

use super::{handler, Handler};
use crate::reactive::{ReadSignal, Signal};

/// Wraps an async operation as `execute()` plus a `loading` cell.
///
/// Nothing is cached; each `execute` reruns the handler. Overlapping calls
/// are not coalesced and all of them toggle the same `loading` cell, so the
/// flag reflects whichever call wrote last.
pub struct LazyRequest<T> {
    handler: Handler<T>,
    loading: Signal<bool>,
}

impl<T> LazyRequest<T>
where
    T: Send + 'static,
{
    pub fn new<F, Fut>(run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self { handler: handler(run), loading: Signal::new(false) }
    }

    pub fn loading(&self) -> ReadSignal<bool> {
        self.loading.read_only()
    }

    /// Run the handler, flagging `loading` for its duration.
    pub async fn execute(&self) -> T {
        self.loading.set(true);
        let result = (self.handler)().await;
        self.loading.set(false);
        result
    }
}

impl<T> Clone for LazyRequest<T> {
    fn clone(&self) -> Self {
        Self { handler: self.handler.clone(), loading: self.loading.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn every_execute_reruns_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let request = LazyRequest::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { n }
        });

        assert_eq!(request.execute().await, 1);
        assert_eq!(request.execute().await, 2);
        assert!(!request.loading().get());
    }

    #[tokio::test]
    async fn loading_is_set_while_pending() {
        let (tx, rx) = tokio::sync::oneshot::channel::<u8>();
        let rx = Arc::new(parking_lot::Mutex::new(Some(rx)));
        let request = LazyRequest::new(move || {
            let rx = rx.lock().take();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(0),
                    None => 0,
                }
            }
        });

        let loading = request.loading();
        let pending = request.execute();
        tokio::pin!(pending);
        assert!(futures_util::poll!(&mut pending).is_pending());
        assert!(loading.get());

        tx.send(3).unwrap();
        assert_eq!(pending.await, 3);
        assert!(!loading.get());
    }

    /// Overlapping executes are independent: the first to finish clears
    /// `loading` while the other is still in flight.
    #[tokio::test]
    async fn overlapping_executes_race_on_loading() {
        let (tx_first, rx_first) = tokio::sync::oneshot::channel::<u8>();
        let (tx_second, rx_second) = tokio::sync::oneshot::channel::<u8>();
        let pending = Arc::new(parking_lot::Mutex::new(std::collections::VecDeque::from([rx_first, rx_second])));
        let request = LazyRequest::new(move || {
            let rx = pending.lock().pop_front();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(0),
                    None => 0,
                }
            }
        });
        let loading = request.loading();

        let (first, second, loading_mid_flight) = futures_util::join!(request.execute(), request.execute(), async {
            tx_second.send(2).unwrap();
            tokio::task::yield_now().await;
            let observed = loading.get();
            tx_first.send(1).unwrap();
            observed
        });

        assert_eq!((first, second), (1, 2));
        assert!(!loading_mid_flight);
        assert!(!loading.get());
    }
}

