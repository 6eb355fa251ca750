//! Deferred work queue
//!
//! Single-consumer FIFO standing in for the host's serialized main context.
//! Work submitted with [`DeferredQueue::defer`] runs later, one job at a time,
//! in submission order, either when the host pumps the queue with
//! [`DeferredQueue::drain`] or on the consumer task started by
//! [`DeferredQueue::spawn_consumer`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A unit of deferred work
pub type DeferredJob = Box<dyn FnOnce() + Send + 'static>;

/// Clonable handle to the deferred queue
#[derive(Clone)]
pub struct DeferredQueue {
    sender: mpsc::UnboundedSender<DeferredJob>,
    receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<DeferredJob>>>>,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(Some(receiver))),
        }
    }

    /// Queue `job` to run after the current call stack
    pub fn defer<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Box::new(job)).is_err() {
            warn!("Deferred queue consumer is gone, dropping job");
        }
    }

    /// Run queued jobs on the calling thread until the queue is empty
    ///
    /// Jobs queued by running jobs are picked up in the same call. Returns the
    /// number of jobs run; always 0 once a consumer task owns the queue.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = {
                let mut receiver = self.receiver.lock();
                match receiver.as_mut() {
                    Some(rx) => rx.try_recv().ok(),
                    None => None,
                }
            };
            match job {
                Some(job) => {
                    job();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            debug!("Drained {} deferred jobs", ran);
        }
        ran
    }

    /// Hand the queue to a consumer task on the current tokio runtime
    ///
    /// Returns `None` if a consumer was already started.
    pub fn spawn_consumer(&self) -> Option<JoinHandle<()>> {
        let mut receiver = self.receiver.lock().take()?;
        Some(tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job();
            }
            debug!("Deferred queue closed");
        }))
    }
}
