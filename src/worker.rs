use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

/// Shared flag telling in-flight work that its owner is gone.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs blocking work on worker threads and hands results back to the UI thread.
///
/// Results queue up until the owner drains them with [`Dispatcher::try_next`]
/// (from a UI timer) or [`Dispatcher::wait_next`]. Dropping the dispatcher
/// cancels its token: work that hasn't started yet is skipped and late
/// results are discarded.
pub struct Dispatcher<E> {
    tx: mpsc::Sender<Option<E>>,
    rx: mpsc::Receiver<Option<E>>,
    pending: Cell<usize>,
    cancel: CancelToken,
}

impl<E: Send + 'static> Dispatcher<E> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            pending: Cell::new(0),
            cancel: CancelToken::new(),
        }
    }

    /// Cancels queued and in-flight work; their results are dropped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    pub(crate) fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    pub fn spawn<W>(&self, label: &'static str, work: W)
    where
        W: FnOnce() -> E + Send + 'static,
    {
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        self.pending.set(self.pending.get() + 1);
        tracing::trace!(label, pending = self.pending.get(), "dispatching worker");

        std::thread::spawn(move || {
            if cancel.is_cancelled() {
                tracing::debug!(label, "skipping cancelled work");
                let _ = tx.send(None);
                return;
            }
            let result = work();
            let _ = tx.send(Some(result));
        });
    }

    /// Pops one finished result without blocking.
    pub fn try_next(&self) -> Option<E> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    self.pending.set(self.pending.get().saturating_sub(1));
                    if let Some(event) = message.filter(|_| !self.cancel.is_cancelled()) {
                        return Some(event);
                    }
                }
                Err(mpsc::TryRecvError::Empty) | Err(mpsc::TryRecvError::Disconnected) => {
                    return None;
                }
            }
        }
    }

    /// Blocks until a result arrives; `None` once nothing is in flight.
    pub fn wait_next(&self) -> Option<E> {
        while self.pending.get() > 0 {
            let message = self.rx.recv().ok()?;
            self.pending.set(self.pending.get().saturating_sub(1));
            if let Some(event) = message.filter(|_| !self.cancel.is_cancelled()) {
                return Some(event);
            }
        }
        None
    }
}

impl<E: Send + 'static> Default for Dispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Drop for Dispatcher<E> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn results_are_delivered_in_completion_order_and_drain_pending() {
        let dispatcher = Dispatcher::<u32>::new();
        dispatcher.spawn("one", || 1);
        dispatcher.spawn("two", || 2);
        assert_eq!(dispatcher.pending(), 2);

        let mut received = vec![
            dispatcher.wait_next().expect("first result"),
            dispatcher.wait_next().expect("second result"),
        ];
        received.sort_unstable();

        assert_eq!(received, vec![1, 2]);
        assert_eq!(dispatcher.pending(), 0);
        assert!(dispatcher.wait_next().is_none());
    }

    #[test]
    fn cancelled_dispatcher_skips_new_work() {
        let dispatcher = Dispatcher::<()>::new();
        let runs = Arc::new(AtomicUsize::new(0));
        dispatcher.cancel();

        let counter = Arc::clone(&runs);
        dispatcher.spawn("skipped", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(dispatcher.wait_next().is_none());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn cancel_discards_results_that_finish_later() {
        let dispatcher = Dispatcher::<u32>::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        dispatcher.spawn("late", move || {
            let _ = release_rx.recv();
            7
        });

        dispatcher.cancel();
        release_tx.send(()).expect("worker is waiting");

        assert!(dispatcher.wait_next().is_none());
        assert_eq!(dispatcher.pending(), 0);
        assert!(dispatcher.try_next().is_none());
    }

    #[test]
    fn dropping_dispatcher_cancels_token() {
        let dispatcher = Dispatcher::<()>::new();
        let token = dispatcher.cancel_token();
        assert!(!token.is_cancelled());
        drop(dispatcher);
        assert!(token.is_cancelled());
    }
}
