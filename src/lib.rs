//! # taskman - Dynamic Work-Queue Executor
//!
//! Runs an open-ended, self-extending set of independent tasks on a bounded
//! pool of worker threads and streams results back to the controlling thread
//! as they complete.
//!
//! ## Features
//!
//! - **Dynamic intake**: Add tasks while consuming results (tree walks, pagination)
//! - **First-completion streaming**: Results arrive as soon as any task finishes
//! - **Weighted progress**: Task counts plus caller-defined batch weights
//! - **Failure isolation**: Errors and panics become data, never aborting the stream
//! - **Ordered collection**: `all()` recovers submission order by sequence number
//!
//! ## Quick Start
//!
//! ```rust
//! use taskman::{DynamicTaskPool, Task};
//!
//! let mut pool = DynamicTaskPool::<u32>::with_workers(4).without_progress();
//! pool.add(Task::value(|| 1).name("one")).unwrap();
//! pool.add(Task::value(|| 2).name("two")).unwrap();
//!
//! let results = pool.exec().unwrap();
//! assert_eq!(results[1].value(), Some(&2));
//! ```

pub mod cli;
pub mod config;
pub mod pool;

pub use config::PoolConfig;
pub use pool::{
    DynamicTaskPool, PoolError, PoolState, PoolStats, Progress, Task, TaskFailure, TaskResult,
    TaskStream,
};

/// Version reported by the `taskman` binary
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
