//! Dynamic work-queue executor
//!
//! This module runs an open-ended set of independent tasks on a bounded pool of
//! worker threads and streams their results back to a single controlling thread
//! as they complete. New tasks can be added *while* results are being consumed,
//! which is what makes tree expansion (directory scans) and pagination (crawlers)
//! natural to express.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Task Intake**: Buffers tasks with a sequence number, weight and metadata
//! - **Submission Batching**: Hands every buffered task to the workers at once
//! - **First-Completion Waiting**: Blocks only until *some* task finishes
//! - **Progress Accounting**: Task counts and weighted "batch" counts per session
//! - **Failure Capture**: Errors and panics become data, never aborting the stream
//!
//! ## What This Module Does NOT Do:
//! - **Prioritization**: Tasks run in submission order, results arrive in completion order
//! - **Cancellation**: Shutdown abandons outstanding work, it does not interrupt it
//! - **Backpressure**: The pending list is unbounded
//!
//! # Data Flow
//!
//! ```text
//! ┌─────────────────┐  add   ┌──────────────────┐ submit ┌─────────────────┐
//! │   Controller    │───────▶│  pending (Vec)   │───────▶│  rayon workers  │
//! │                 │        └──────────────────┘        │                 │
//! │ • consumes      │                                    │ • run targets   │
//! │   results       │  next  ┌──────────────────┐  send  │ • catch panics  │
//! │ • adds more     │◀───────│ completion chan  │◀───────│                 │
//! └─────────────────┘        └──────────────────┘        └─────────────────┘
//! ```
//!
//! Pending and in-flight bookkeeping is owned by the controller and mutated only
//! between results. The crossbeam completion channel is the only state shared
//! with worker threads.
//!
//! # Example Usage
//!
//! ```rust
//! use taskman::{DynamicTaskPool, Task};
//!
//! fn square(n: u64) -> anyhow::Result<u64> {
//!     Ok(n * n)
//! }
//!
//! let mut pool = DynamicTaskPool::<u64>::with_workers(2).without_progress();
//! for n in 0..3 {
//!     pool.add(Task::call(square, n)).unwrap();
//! }
//!
//! let values: Vec<u64> = pool
//!     .exec()
//!     .unwrap()
//!     .into_iter()
//!     .filter_map(|result| result.into_value())
//!     .collect();
//! assert_eq!(values, vec![0, 1, 4]);
//! ```

pub mod core;
pub mod error;
pub mod progress;
pub mod result;
pub mod task;
mod workers;


// Re-export main types for easier access
pub use self::core::{DynamicTaskPool, PoolState, TaskStream};
pub use error::PoolError;
pub use progress::{PoolStats, Progress, ProgressCallback, log_progress};
pub use result::{Frame, TaskFailure, TaskResult};
pub use task::Task;
