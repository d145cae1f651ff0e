//! Configuration management for taskman
//!
//! Pool settings are layered with figment: embedded defaults, then an optional
//! project file, then `TASKMAN_*` environment variables.

pub mod core;

#[cfg(test)]
mod tests;

pub use self::core::PoolConfig;
