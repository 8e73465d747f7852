//! Run configuration.
//!
//! Settings come from an optional YAML file (camelCase keys, any key may be
//! omitted) and are then overridden by command-line flags. The merged value
//! is validated once; a run never starts with an invalid configuration.
//!
//! ```yaml
//! batchSize: 50
//! concurrentLimit: 2
//! delayMin: 3000
//! delayMax: 7000
//! settleMs: 2000
//! itemTimeoutMs: 30000
//! onExisting: replace
//! ```

use crate::errors::HarvestError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// What to do with an identifier the store already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPolicy {
    /// Collect it again and overwrite the stored record.
    #[default]
    Replace,
    /// Leave the stored record alone and make no remote call.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_limit: usize,
    /// Lower bound of the inter-batch delay, in milliseconds.
    #[serde(default = "default_delay_min")]
    pub delay_min: u64,
    /// Upper bound of the inter-batch delay, in milliseconds.
    #[serde(default = "default_delay_max")]
    pub delay_max: u64,
    /// Pause between navigation and extraction, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_item_timeout_ms")]
    pub item_timeout_ms: Option<u64>,
    #[serde(default)]
    pub on_existing: ExistingPolicy,
}

fn default_batch_size() -> usize {
    50
}
fn default_concurrent_limit() -> usize {
    2
}
fn default_delay_min() -> u64 {
    3000
}
fn default_delay_max() -> u64 {
    7000
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_item_timeout_ms() -> Option<u64> {
    Some(30_000)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrent_limit: default_concurrent_limit(),
            delay_min: default_delay_min(),
            delay_max: default_delay_max(),
            settle_ms: default_settle_ms(),
            item_timeout_ms: default_item_timeout_ms(),
            on_existing: ExistingPolicy::default(),
        }
    }
}

/// Per-key overrides, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub batch_size: Option<usize>,
    pub concurrent_limit: Option<usize>,
    pub delay_min: Option<u64>,
    pub delay_max: Option<u64>,
    pub settle_ms: Option<u64>,
    /// `Some(0)` disables the item timeout.
    pub item_timeout_ms: Option<u64>,
    pub on_existing: Option<ExistingPolicy>,
}

impl RunConfig {
    /// Parse a YAML document. Does not validate.
    pub fn from_yaml(text: &str) -> Result<Self, HarvestError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
            .map_err(|e| HarvestError::Configuration(format!("cannot parse configuration: {e}")))
    }

    /// Load the file (if any), apply overrides and validate.
    #[instrument(level = "info", skip_all)]
    pub async fn load(
        path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, HarvestError> {
        let base = match path {
            Some(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    HarvestError::Configuration(format!("cannot read {}: {e}", path.display()))
                })?;
                info!(path = %path.display(), "Loaded configuration file");
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };

        let config = base.with_overrides(overrides);
        config.validate()?;
        info!(
            batch_size = config.batch_size,
            concurrent_limit = config.concurrent_limit,
            delay_min = config.delay_min,
            delay_max = config.delay_max,
            settle_ms = config.settle_ms,
            item_timeout_ms = ?config.item_timeout_ms,
            on_existing = ?config.on_existing,
            "Run configuration resolved"
        );
        Ok(config)
    }

    pub fn with_overrides(mut self, o: &ConfigOverrides) -> Self {
        if let Some(v) = o.batch_size {
            self.batch_size = v;
        }
        if let Some(v) = o.concurrent_limit {
            self.concurrent_limit = v;
        }
        if let Some(v) = o.delay_min {
            self.delay_min = v;
        }
        if let Some(v) = o.delay_max {
            self.delay_max = v;
        }
        if let Some(v) = o.settle_ms {
            self.settle_ms = v;
        }
        match o.item_timeout_ms {
            Some(0) => self.item_timeout_ms = None,
            Some(v) => self.item_timeout_ms = Some(v),
            None => {}
        }
        if let Some(v) = o.on_existing {
            self.on_existing = v;
        }
        self
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.batch_size == 0 {
            return Err(HarvestError::Configuration(
                "batchSize must be greater than 0".to_string(),
            ));
        }
        if self.concurrent_limit == 0 {
            return Err(HarvestError::Configuration(
                "concurrentLimit must be greater than 0".to_string(),
            ));
        }
        if self.delay_max < self.delay_min {
            return Err(HarvestError::Configuration(format!(
                "delayMax ({}) must not be less than delayMin ({})",
                self.delay_max, self.delay_min
            )));
        }
        if self.item_timeout_ms == Some(0) {
            return Err(HarvestError::Configuration(
                "itemTimeoutMs must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_ms.map(Duration::from_millis)
    }
}
