use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{Receiver, Sender, unbounded};

use super::error::PoolError;
use super::result::TaskFailure;
use super::task::Job;

/// Message sent from a worker back to the control thread
pub(crate) struct Completion<T> {
    pub sequence: u64,
    pub outcome: Result<T, TaskFailure>,
}

/// Fixed-size set of worker threads plus the completion channel.
///
/// Workers only ever touch the sending half of the channel; pending and
/// in-flight bookkeeping stays on the control thread.
pub(crate) struct WorkerPool<T> {
    threads: rayon::ThreadPool,
    done_tx: Sender<Completion<T>>,
    done_rx: Receiver<Completion<T>>,
    abandoned: Arc<AtomicBool>,
}

impl<T> WorkerPool<T>
where
    T: Send + 'static,
{
    pub fn start(workers: usize) -> Result<Self, PoolError> {
        let threads = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("taskman-worker-{index}"))
            .panic_handler(|_| tracing::error!("Worker thread panicked outside a task"))
            .build()?;
        let (done_tx, done_rx) = unbounded();

        tracing::debug!("Started {} worker threads", workers);

        Ok(Self {
            threads,
            done_tx,
            done_rx,
            abandoned: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn current_num_threads(&self) -> usize {
        self.threads.current_num_threads()
    }

    pub fn submit(&self, sequence: u64, job: Job<T>) {
        let done_tx = self.done_tx.clone();
        let abandoned = self.abandoned.clone();

        self.threads.spawn(move || {
            // Jobs still queued when the pool shut down are skipped
            if abandoned.load(Ordering::Acquire) {
                return;
            }
            let outcome = job();
            // A closed channel means nobody is waiting for this result anymore
            let _ = done_tx.send(Completion { sequence, outcome });
        });
    }

    /// Block until at least one job completes, then take everything else
    /// that is already finished.
    pub fn wait_first(&self) -> Vec<Completion<T>> {
        let mut batch = Vec::new();
        if let Ok(first) = self.done_rx.recv() {
            batch.push(first);
            batch.extend(self.done_rx.try_iter());
        }
        batch
    }
}

impl<T> WorkerPool<T> {
    /// Stop tracking outstanding work. Running targets finish on their own;
    /// queued ones are skipped.
    pub fn abandon(self) {
        self.abandoned.store(true, Ordering::Release);
        tracing::debug!("Worker threads released");
        // Dropping the rayon pool lets its threads exit once idle
    }
}
