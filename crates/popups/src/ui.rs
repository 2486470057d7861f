//! UI-thread job queue. Delayed popups execute here because `execute()`
//! usually mutates on-screen state.

use std::{sync::Arc, time::Duration};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, warn};

pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Posts work onto the UI/main thread.
pub trait UiDispatcher: Send + Sync {
    /// Returns `false` when the job was not accepted; it will never run.
    fn dispatch(&self, job: UiJob) -> bool;
}

const UI_QUEUE_CAPACITY: usize = 64;

/// Bounded queue of UI jobs, drained by whichever loop owns the UI thread.
pub struct UiQueue {
    tx: Sender<UiJob>,
    rx: Receiver<UiJob>,
}

struct QueueDispatcher {
    tx: Sender<UiJob>,
}

impl UiDispatcher for QueueDispatcher {
    fn dispatch(&self, job: UiJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => {
                debug!("queued ui job");
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!("ui job queue is full; rejecting job");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("ui job queue disconnected; rejecting job");
                false
            }
        }
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UiQueue {
    pub fn new() -> Self {
        Self::with_capacity(UI_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    pub fn dispatcher(&self) -> Arc<dyn UiDispatcher> {
        Arc::new(QueueDispatcher {
            tx: self.tx.clone(),
        })
    }

    /// Runs every job queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Blocks up to `timeout` for one job and runs it.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn dispatched_jobs_run_on_drain_in_order() {
        let queue = UiQueue::new();
        let dispatcher = queue.dispatcher();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = Arc::clone(&seen);
            assert!(dispatcher.dispatch(Box::new(move || seen.lock().expect("lock").push(i))));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*seen.lock().expect("lock"), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_rejects_instead_of_blocking() {
        let queue = UiQueue::with_capacity(1);
        let dispatcher = queue.dispatcher();
        let ran = Arc::new(AtomicUsize::new(0));
        let accepted: Vec<bool> = (0..3)
            .map(|_| {
                let ran = Arc::clone(&ran);
                dispatcher.dispatch(Box::new(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                }))
            })
            .collect();
        assert_eq!(accepted, vec![true, false, false]);
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(!queue.run_next(Duration::from_millis(5)));
    }
}
