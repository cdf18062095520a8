use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::stages::cycle::DEFAULT_SAMPLE_THRESHOLD;
use crate::stages::normalizer::{DEFAULT_SORT_THRESHOLD, DEFAULT_WRAP_THRESHOLD_US};

/// Tunables for the loop reconstruction pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum trailing window re-sorted per batch
    pub sort_threshold: usize,

    /// Backwards jump (µs) read as a reader clock rollover
    pub wrap_threshold_us: u64,

    /// Trailing events examined for cycle detection
    pub sample_threshold: usize,

    /// Optional cap on retained history entries
    pub history_limit: Option<usize>,

    /// Inbox size of the async pipeline
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sort_threshold: DEFAULT_SORT_THRESHOLD,
            wrap_threshold_us: DEFAULT_WRAP_THRESHOLD_US,
            sample_threshold: DEFAULT_SAMPLE_THRESHOLD,
            history_limit: None,
            channel_capacity: 100,
        }
    }
}

impl PipelineConfig {
    /// Build from a JSON value; missing fields take their defaults
    pub fn from_json(config: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(config).context("Invalid pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read pipeline config from {:?}", path))?;
        let value: Value = serde_json::from_str(&json)
            .context(format!("Failed to parse pipeline config at {:?}", path))?;
        Self::from_json(value)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_threshold < 2 {
            anyhow::bail!("sample_threshold must be at least 2, got {}", self.sample_threshold);
        }
        if self.wrap_threshold_us == 0 {
            anyhow::bail!("wrap_threshold_us must be non-zero");
        }
        if self.channel_capacity == 0 {
            anyhow::bail!("channel_capacity must be non-zero");
        }
        if let Some(limit) = self.history_limit {
            // The cap must leave the whole normalization window in place
            if limit <= self.sort_threshold.max(self.sample_threshold) {
                anyhow::bail!(
                    "history_limit {} must exceed both sort_threshold and sample_threshold",
                    limit
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = PipelineConfig::from_json(json!({})).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.sort_threshold, 16);
        assert_eq!(config.wrap_threshold_us, 3_000_000);
        assert_eq!(config.sample_threshold, 64);
    }

    #[test]
    fn test_rejects_degenerate_values() {
        assert!(PipelineConfig::from_json(json!({"sample_threshold": 0})).is_err());
        assert!(PipelineConfig::from_json(json!({"wrap_threshold_us": 0})).is_err());
        assert!(PipelineConfig::from_json(json!({"history_limit": 10})).is_err());
        assert!(PipelineConfig::from_json(json!({"sort_threshold": "many"})).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"sample_threshold": 32, "history_limit": 500}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.sample_threshold, 32);
        assert_eq!(config.history_limit, Some(500));
        assert_eq!(config.sort_threshold, 16);

        assert!(PipelineConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
