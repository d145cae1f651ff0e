//! Command implementations for the taskman CLI
//!
//! Each command seeds a [`DynamicTaskPool`](crate::pool::DynamicTaskPool) and
//! grows the workload from inside its result loop.

pub mod pages;
pub mod scan;
