use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::time::Instant;

use crate::config::PoolConfig;

use super::error::PoolError;
use super::progress::{PoolStats, Progress, ProgressCallback, log_progress};
use super::result::TaskResult;
use super::task::{Task, WorkItem};
use super::workers::WorkerPool;

/// Lifecycle of a [`DynamicTaskPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// No worker threads created yet
    Uninitialized,
    /// Work is pending or in flight
    Running,
    /// Workers alive, nothing left to do
    Idle,
    /// Shut down; the pool accepts no more work
    Terminated,
}

/// Bookkeeping kept on the control thread for a submitted task
struct InFlight<M> {
    name: String,
    weight: u64,
    metadata: Option<M>,
}

/// Thread pool running an open-ended, self-extending set of tasks.
///
/// Tasks are buffered by [`add`](Self::add) and submitted when the pool is
/// streamed. Results come back in completion order, and the consumer may add
/// more work while iterating, which keeps the stream alive until both the
/// pending list and the in-flight set are empty.
///
/// The pool value is the control capability: it is neither `Send` nor
/// `Sync`, so a task target running on a worker can never reach `add`.
///
/// ```compile_fail
/// use taskman::{DynamicTaskPool, Task};
///
/// let mut pool = DynamicTaskPool::<u32>::with_workers(2);
/// std::thread::spawn(move || {
///     pool.add(Task::value(|| 1)).unwrap();
/// });
/// ```
pub struct DynamicTaskPool<T, M = ()> {
    workers: usize,
    progress: Option<ProgressCallback>,
    runtime: Option<WorkerPool<T>>,
    pending: Vec<WorkItem<T, M>>,
    in_flight: HashMap<u64, InFlight<M>>,
    // Completed results not yet handed to a consumer, with their weights.
    // They count as completed once handed out.
    ready: VecDeque<(u64, TaskResult<T, M>)>,
    stats: PoolStats,
    next_sequence: u64,
    terminated: bool,
    // Pins the pool to the thread that owns it
    _control: PhantomData<*const ()>,
}

impl<T, M> DynamicTaskPool<T, M>
where
    T: Send + 'static,
{
    pub fn new(config: PoolConfig) -> Self {
        let progress: Option<ProgressCallback> = if config.show_progress {
            Some(Box::new(log_progress))
        } else {
            None
        };

        Self {
            workers: config.resolved_workers(),
            progress,
            runtime: None,
            pending: Vec::new(),
            in_flight: HashMap::new(),
            ready: VecDeque::new(),
            stats: PoolStats::default(),
            next_sequence: 0,
            terminated: false,
            _control: PhantomData,
        }
    }

    /// Pool with an explicit worker count (`0` picks the CPU count)
    pub fn with_workers(workers: usize) -> Self {
        Self::new(PoolConfig {
            max_workers: workers,
            ..PoolConfig::default()
        })
    }

    /// Replace the progress reporter
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Progress<'_>) + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn without_progress(mut self) -> Self {
        self.progress = None;
        self
    }

    /// Run `f` with a fresh pool and shut it down afterwards, whether `f`
    /// returns or unwinds.
    pub fn scope<R>(config: PoolConfig, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut pool = Self::new(config);
        f(&mut pool)
        // `pool` drops here and Drop runs shutdown
    }

    /// Buffer a task and return its sequence number. Nothing is submitted
    /// until the pool is streamed.
    pub fn add(&mut self, task: Task<T, M>) -> Result<u64, PoolError> {
        if self.terminated {
            return Err(PoolError::Terminated);
        }
        Ok(self.enqueue(task))
    }

    fn enqueue(&mut self, task: Task<T, M>) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push(WorkItem::from_task(sequence, task));
        sequence
    }

    /// Start streaming results.
    ///
    /// With nothing pending or in flight this returns an empty stream and no
    /// worker threads are created. Otherwise the workers are started on first
    /// use and the session counters are reset.
    pub fn stream(&mut self) -> Result<TaskStream<'_, T, M>, PoolError> {
        if self.terminated {
            return Err(PoolError::Terminated);
        }

        if self.pending.is_empty() && self.in_flight.is_empty() && self.ready.is_empty() {
            return Ok(TaskStream::empty(self));
        }

        if self.runtime.is_none() {
            self.runtime = Some(WorkerPool::start(self.workers)?);
        }

        // Work left over from an earlier stream still counts toward this one
        let carried_weight: u64 = self.ready.iter().map(|(weight, _)| weight).sum();
        self.stats = PoolStats {
            tasks_submitted: (self.in_flight.len() + self.ready.len()) as u64,
            tasks_completed: 0,
            weight_submitted: self.in_flight.values().map(|item| item.weight).sum::<u64>()
                + carried_weight,
            weight_completed: 0,
        };

        Ok(TaskStream::new(self))
    }

    /// Drain the whole dynamic workload and return every result ordered by
    /// sequence number.
    pub fn all(&mut self) -> Result<Vec<TaskResult<T, M>>, PoolError> {
        let mut results: Vec<_> = self.stream()?.collect();
        results.sort_by_key(|result| result.sequence);
        Ok(results)
    }

    /// [`all`](Self::all), then shut down. The pool is consumed.
    pub fn exec(mut self) -> Result<Vec<TaskResult<T, M>>, PoolError> {
        let results = self.all();
        self.shutdown();
        results
    }

    fn submit_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        tracing::debug!("Submitting {} tasks", self.pending.len());
        for item in self.pending.drain(..) {
            self.stats.record_submit(item.weight);
            self.in_flight.insert(
                item.sequence,
                InFlight {
                    name: item.name,
                    weight: item.weight,
                    metadata: item.metadata,
                },
            );
            runtime.submit(item.sequence, item.job);
        }
    }
}

impl<T, M> DynamicTaskPool<T, M> {
    /// Release the worker threads and forget all queued and in-flight work.
    ///
    /// Targets already running are abandoned, not cancelled: they run to
    /// completion on their own but their results are discarded. Calling this
    /// more than once is a no-op.
    pub fn shutdown(&mut self) {
        if self.terminated {
            return;
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.abandon();
        }
        if !self.pending.is_empty() || !self.in_flight.is_empty() {
            tracing::debug!(
                "Shutting down with {} pending and {} in-flight tasks",
                self.pending.len(),
                self.in_flight.len()
            );
        }
        self.pending.clear();
        self.in_flight.clear();
        self.ready.clear();
        self.stats = PoolStats::default();
        self.terminated = true;
    }

    pub fn state(&self) -> PoolState {
        if self.terminated {
            PoolState::Terminated
        } else if self.runtime.is_none() {
            PoolState::Uninitialized
        } else if self.pending.is_empty() && self.in_flight.is_empty() && self.ready.is_empty() {
            PoolState::Idle
        } else {
            PoolState::Running
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Upper bound on concurrently running targets
    pub fn worker_count(&self) -> usize {
        self.workers
    }
}

impl<T, M> Default for DynamicTaskPool<T, M>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl<T, M> Drop for DynamicTaskPool<T, M> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Lazy sequence of results produced by [`DynamicTaskPool::stream`].
///
/// The stream borrows the pool mutably, so work discovered while iterating is
/// added through [`TaskStream::add`]:
///
/// ```rust
/// use taskman::{DynamicTaskPool, Task};
///
/// fn countdown(n: u32) -> anyhow::Result<u32> {
///     Ok(n)
/// }
///
/// let mut pool = DynamicTaskPool::<u32>::with_workers(2).without_progress();
/// pool.add(Task::call(countdown, 3)).unwrap();
///
/// let mut seen = Vec::new();
/// let mut stream = pool.stream().unwrap();
/// while let Some(result) = stream.next() {
///     let n = result.into_value().unwrap();
///     if n > 0 {
///         stream.add(Task::call(countdown, n - 1));
///     }
///     seen.push(n);
/// }
/// assert_eq!(seen, vec![3, 2, 1, 0]);
/// ```
pub struct TaskStream<'a, T, M = ()> {
    pool: &'a mut DynamicTaskPool<T, M>,
    started: Instant,
    finished: bool,
}

impl<'a, T, M> TaskStream<'a, T, M>
where
    T: Send + 'static,
{
    fn new(pool: &'a mut DynamicTaskPool<T, M>) -> Self {
        Self {
            pool,
            started: Instant::now(),
            finished: false,
        }
    }

    fn empty(pool: &'a mut DynamicTaskPool<T, M>) -> Self {
        Self {
            finished: true,
            ..Self::new(pool)
        }
    }

    /// Enqueue more work; it is submitted before the next result is taken.
    /// Work added after the stream has ended waits for the next `stream`.
    pub fn add(&mut self, task: Task<T, M>) -> u64 {
        self.pool.enqueue(task)
    }

    /// Live counters for this session
    pub fn stats(&self) -> PoolStats {
        self.pool.stats
    }

    /// Block until at least one in-flight task finishes and queue its
    /// result. Returns false when there is nothing left to wait on.
    ///
    /// The result is not counted as completed until it is handed out.
    fn collect_batch(&mut self) -> bool {
        let batch = match self.pool.runtime.as_ref() {
            Some(runtime) => runtime.wait_first(),
            None => return false,
        };
        if batch.is_empty() {
            return false;
        }

        for completion in batch {
            let Some(item) = self.pool.in_flight.remove(&completion.sequence) else {
                continue;
            };

            match &completion.outcome {
                Ok(_) => tracing::trace!("Task \"{}\" #{} completed", item.name, completion.sequence),
                Err(failure) => tracing::warn!(
                    "Task \"{}\" #{} failed: {}",
                    item.name,
                    completion.sequence,
                    failure
                ),
            }

            self.pool.ready.push_back((
                item.weight,
                TaskResult {
                    sequence: completion.sequence,
                    name: item.name,
                    metadata: item.metadata,
                    outcome: completion.outcome,
                },
            ));
        }
        true
    }

    /// Count a result as completed and report progress right before it is
    /// handed out, for successes and failures alike
    fn hand_out(&mut self, weight: u64, result: TaskResult<T, M>) -> TaskResult<T, M> {
        self.pool.stats.record_complete(weight);

        if let Some(callback) = self.pool.progress.as_mut() {
            let stats = self.pool.stats;
            callback(&Progress {
                name: &result.name,
                tasks_done: stats.tasks_completed,
                tasks_total: stats.tasks_submitted,
                weight_done: stats.weight_completed,
                weight_total: stats.weight_submitted,
                elapsed: self.started.elapsed(),
            });
        }

        result
    }
}

impl<T, M> Iterator for TaskStream<'_, T, M>
where
    T: Send + 'static,
{
    type Item = TaskResult<T, M>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            // Keep workers busy with anything added since the last result
            self.pool.submit_pending();

            if let Some((weight, result)) = self.pool.ready.pop_front() {
                return Some(self.hand_out(weight, result));
            }

            if self.pool.in_flight.is_empty() {
                tracing::debug!(
                    "Stream drained after {} tasks in {}ms",
                    self.pool.stats.tasks_completed,
                    self.started.elapsed().as_millis()
                );
                self.finished = true;
                return None;
            }

            if !self.collect_batch() {
                tracing::error!(
                    "Completion channel closed with {} tasks in flight",
                    self.pool.in_flight.len()
                );
                self.finished = true;
                return None;
            }
        }
    }
}

impl<T, M> std::iter::FusedIterator for TaskStream<'_, T, M> where T: Send + 'static {}
