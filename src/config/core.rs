use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pool::PoolError;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Settings for a [`DynamicTaskPool`](crate::pool::DynamicTaskPool)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of worker threads (0 = auto-detect)
    pub max_workers: usize,
    /// Percentage of CPU cores to use when auto-detecting (1-100)
    pub thread_percentage: u8,
    /// Log a line for every completed task
    pub show_progress: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 0,
            thread_percentage: 100,
            show_progress: true,
        }
    }
}

impl PoolConfig {
    /// Load defaults, project config files and environment overrides
    pub fn load(custom_config: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        // A custom config replaces the project lookup; its format follows the extension
        if let Some(custom_path) = custom_config {
            figment = match Path::new(custom_path)
                .extension()
                .and_then(|ext| ext.to_str())
            {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        } else {
            figment = figment
                .merge(Toml::file("taskman.toml"))
                .merge(Json::file("taskman.json"))
                .merge(Yaml::file("taskman.yaml"))
                .merge(Yaml::file("taskman.yml"));
        }

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed("TASKMAN_"));

        let config: PoolConfig = figment.extract()?;
        config.validate()?;

        tracing::debug!("Loaded pool config: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if !(1..=100).contains(&self.thread_percentage) {
            return Err(PoolError::InvalidConfig(format!(
                "thread_percentage must be between 1 and 100, got {}",
                self.thread_percentage
            )));
        }
        Ok(())
    }

    /// Number of worker threads the pool will start
    ///
    /// ```text
    /// max_workers > 0  → max_workers
    /// max_workers == 0 → max(1, cpu_cores * thread_percentage / 100)
    /// ```
    ///
    /// `thread_percentage` is clamped to 1..=100 here, so a config that
    /// skipped [`validate`](Self::validate) never oversubscribes the CPU.
    pub fn resolved_workers(&self) -> usize {
        if self.max_workers > 0 {
            return self.max_workers;
        }

        let available_cores = num_cpus::get();
        let percentage = self.thread_percentage.clamp(1, 100) as usize;
        std::cmp::max(1, (available_cores * percentage) / 100)
    }

    /// Same settings with an explicit worker count, if one is given
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        if let Some(workers) = workers {
            self.max_workers = workers;
        }
        self
    }
}
