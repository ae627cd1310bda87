//! Simulator Configuration
//!
//! Features:
//! - Sensible defaults for every algorithm parameter
//! - JSON configuration files
//! - Environment variable overrides
//! - Configuration validation

use crate::deadlock::banker::DEFAULT_MAX_PASSES;
use crate::deadlock::graph::DEFAULT_NODE_COUNT;
use crate::error::{Error, Result};
use crate::scheduler::{Algorithm, AlgorithmKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["pretty", "compact"];

/// Complete simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimulatorConfig {
    pub scheduler: SchedulerConfig,
    pub detection: DetectionConfig,
    pub banker: BankerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Round Robin time slice
    pub quantum: u32,

    /// Priority gained per tick of waiting
    pub aging_rate: i64,

    /// Idle ticks charged when the running process changes
    pub context_switch_overhead: u32,

    /// Disciplines run when none are named explicitly. May be empty.
    pub algorithms: Vec<AlgorithmKind>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            quantum: 3,
            aging_rate: 1,
            context_switch_overhead: 0,
            algorithms: AlgorithmKind::ALL.to_vec(),
        }
    }
}

impl SchedulerConfig {
    pub fn algorithm(&self, kind: AlgorithmKind) -> Algorithm {
        kind.with_params(self.quantum, self.aging_rate, self.context_switch_overhead)
    }

    pub fn algorithms(&self) -> Vec<Algorithm> {
        self.algorithms.iter().map(|k| self.algorithm(*k)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub default_process_count: usize,
    pub default_resource_count: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            default_process_count: DEFAULT_NODE_COUNT,
            default_resource_count: DEFAULT_NODE_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankerConfig {
    /// Upper bound on scans of the process list
    pub max_passes: usize,
}

impl Default for BankerConfig {
    fn default() -> Self {
        BankerConfig {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file. Missing sections keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: SimulatorConfig = serde_json::from_str(&text).map_err(|e| {
            Error::ConfigError(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, value: String) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| Error::ConfigError(format!("Invalid {}: {}", key, value)))
        }

        if let Some(v) = lookup("OSSIM_QUANTUM") {
            self.scheduler.quantum = parsed("OSSIM_QUANTUM", v)?;
        }
        if let Some(v) = lookup("OSSIM_AGING_RATE") {
            self.scheduler.aging_rate = parsed("OSSIM_AGING_RATE", v)?;
        }
        if let Some(v) = lookup("OSSIM_CONTEXT_SWITCH") {
            self.scheduler.context_switch_overhead = parsed("OSSIM_CONTEXT_SWITCH", v)?;
        }
        if let Some(v) = lookup("OSSIM_MAX_PASSES") {
            self.banker.max_passes = parsed("OSSIM_MAX_PASSES", v)?;
        }

        // Logging
        if let Some(level) = lookup("OSSIM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.quantum == 0 {
            return Err(Error::ConfigError(
                "scheduler.quantum must be at least 1".to_string(),
            ));
        }
        if self.banker.max_passes == 0 {
            return Err(Error::ConfigError(
                "banker.max_passes must be at least 1".to_string(),
            ));
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::ConfigError(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            )));
        }
        if !VALID_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(Error::ConfigError(format!(
                "Invalid log format: {}. Must be one of: {}",
                self.logging.format,
                VALID_FORMATS.join(", ")
            )));
        }

        Ok(())
    }
}

/// Configuration builder for programmatic setup
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: SimulatorConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quantum(mut self, quantum: u32) -> Self {
        self.config.scheduler.quantum = quantum;
        self
    }

    pub fn with_aging_rate(mut self, rate: i64) -> Self {
        self.config.scheduler.aging_rate = rate;
        self
    }

    pub fn with_context_switch(mut self, overhead: u32) -> Self {
        self.config.scheduler.context_switch_overhead = overhead;
        self
    }

    pub fn with_algorithms(mut self, kinds: impl IntoIterator<Item = AlgorithmKind>) -> Self {
        self.config.scheduler.algorithms = kinds.into_iter().collect();
        self
    }

    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.config.banker.max_passes = passes;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Result<SimulatorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
