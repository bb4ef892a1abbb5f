//! Feed configuration, loadable from YAML. Every field is optional.
//!
//! ```yaml
//! capacity: 20
//! interval_ms: 5000
//! threat_threshold: 60
//! rng_seed: 1234
//! ```

use crate::data::{Generator, DEFAULT_CAPACITY, DEFAULT_THREAT_THRESHOLD};
use crate::feed::DEFAULT_INTERVAL;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("interval_ms must be at least 1")]
    ZeroInterval,

    #[error("threat_threshold {0} is above 100")]
    ThresholdOutOfRange(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Maximum number of events kept in the feed.
    pub capacity: usize,
    /// Time between ticks.
    pub interval_ms: u64,
    /// Events generated at mount; defaults to `capacity`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_count: Option<usize>,
    /// Minimum score for the `threats` filter.
    pub threat_threshold: u8,
    /// Fixed seed for a reproducible feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            capacity: DEFAULT_CAPACITY,
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            seed_count: None,
            threat_threshold: DEFAULT_THREAT_THRESHOLD,
            rng_seed: None,
        }
    }
}

impl FeedConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<FeedConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        FeedConfig::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<FeedConfig, ConfigError> {
        // an empty document means "all defaults"
        let config = if text.trim().is_empty() {
            FeedConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.threat_threshold > 100 {
            return Err(ConfigError::ThresholdOutOfRange(self.threat_threshold));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn seed_count(&self) -> usize {
        self.seed_count.unwrap_or(self.capacity)
    }

    pub fn generator(&self) -> Generator {
        match self.rng_seed {
            Some(seed) => Generator::seeded(seed),
            None => Generator::from_entropy(),
        }
    }
}
