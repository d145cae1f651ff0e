use thiserror::Error;

/// Faults surfaced to the controller. Failures raised by task targets are
/// never reported through this type; they travel inside [`TaskResult`].
///
/// [`TaskResult`]: super::TaskResult
#[derive(Debug, Error)]
pub enum PoolError {
    /// The worker threads could not be created.
    #[error("failed to start worker threads: {0}")]
    WorkerSpawn(#[from] rayon::ThreadPoolBuildError),

    /// The pool was shut down and no longer accepts or streams work.
    #[error("task pool has been shut down")]
    Terminated,

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),
}
