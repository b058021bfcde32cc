//! Dispatch Targets
//!
//! A dispatch target decides where observer callbacks run. Collections and
//! relays receive one at construction time instead of reaching for a
//! process-wide main-thread scheduler.
//!
//! - [`ImmediateDispatcher`] runs every job inline, so a notification has
//!   been delivered by the time the mutating call returns.
//! - [`QueueDispatcher`] hands jobs to a [`DispatchQueue`], which the UI loop
//!   drains on its own thread, either by polling [`DispatchQueue::run_pending`]
//!   once per frame or by awaiting [`DispatchQueue::run`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

/// A unit of work delivered to observers.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Capability to run observer callbacks somewhere.
pub trait Dispatcher: Send + Sync {
    /// Run or schedule the job.
    fn dispatch(&self, job: Job);
}

/// Runs every job on the calling thread, immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDispatcher;

impl Dispatcher for ImmediateDispatcher {
    fn dispatch(&self, job: Job) {
        job();
    }
}

impl ImmediateDispatcher {
    /// Shared handle to the inline dispatcher.
    pub fn shared() -> Arc<dyn Dispatcher> {
        Arc::new(ImmediateDispatcher)
    }
}

/// Sending half of a dispatch queue.
#[derive(Clone)]
pub struct QueueDispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, job: Job) {
        if self.tx.send(job).is_err() {
            tracing::debug!("dispatch queue closed, dropping job");
        }
    }
}

impl fmt::Debug for QueueDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueDispatcher")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Receiving half of a dispatch queue, owned by the UI loop.
pub struct DispatchQueue {
    rx: mpsc::UnboundedReceiver<Job>,
}

/// Create a connected dispatcher/queue pair.
pub fn queue() -> (QueueDispatcher, DispatchQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueDispatcher { tx }, DispatchQueue { rx })
}

impl DispatchQueue {
    /// Run every job queued so far and return how many ran.
    ///
    /// Jobs enqueued by the jobs themselves are run in the same call.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Run jobs as they arrive until every dispatcher has been dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
        tracing::trace!("dispatch queue drained");
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn immediate_runs_inline() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        ImmediateDispatcher.dispatch(Box::new(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queue_defers_until_drained() {
        let (dispatcher, mut queue) = queue();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let ran = ran.clone();
            dispatcher.dispatch(Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn closed_queue_drops_jobs() {
        let (dispatcher, queue) = queue();
        drop(queue);

        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        dispatcher.dispatch(Box::new(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn run_drains_until_senders_drop() {
        let (dispatcher, queue) = queue();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        dispatcher.dispatch(Box::new(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        }));
        drop(dispatcher);

        queue.run().await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
