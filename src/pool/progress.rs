use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Callback invoked on the control thread once per completed task
pub type ProgressCallback = Box<dyn FnMut(&Progress<'_>)>;

/// Snapshot handed to the progress callback.
///
/// `tasks_total` and `weight_total` are live counters: work added while
/// streaming raises them between two calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress<'a> {
    pub name: &'a str,
    pub tasks_done: u64,
    pub tasks_total: u64,
    pub weight_done: u64,
    pub weight_total: u64,
    pub elapsed: Duration,
}

impl Progress<'_> {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

impl fmt::Display for Progress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task \"{}\" progress {}/{}, ",
            self.name, self.tasks_done, self.tasks_total
        )?;
        // Unweighted runs would just repeat the task counts
        if self.weight_total != self.tasks_total {
            write!(
                f,
                "batch progress {}/{}, ",
                self.weight_done, self.weight_total
            )?;
        }
        write!(f, "elapsed {}ms", self.elapsed.as_millis())
    }
}

/// Default progress reporter: one log line per completed task
pub fn log_progress(progress: &Progress<'_>) {
    tracing::info!("  -- {progress}");
}

/// Session counters, reset each time a stream starts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub weight_submitted: u64,
    pub weight_completed: u64,
}

impl PoolStats {
    /// True when every submitted task has completed
    pub fn is_drained(&self) -> bool {
        self.tasks_completed == self.tasks_submitted
    }

    pub(crate) fn record_submit(&mut self, weight: u64) {
        self.tasks_submitted += 1;
        self.weight_submitted += weight;
    }

    pub(crate) fn record_complete(&mut self, weight: u64) {
        self.tasks_completed += 1;
        self.weight_completed += weight;
    }
}
