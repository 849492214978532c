//! Watch subsystem configuration.
//!
//! Loaded from an optional TOML file with `WATCH`-prefixed environment
//! variables taking priority, the way the rest of the server loads its
//! sections.

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[cfg(test)]
mod config_test;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Cadence of the expiration sweep in milliseconds
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Deadline applied when a client supplies no timeout
    #[serde(default = "default_watch_timeout_ms")]
    pub default_watch_timeout_ms: u64,

    /// Upper bound a client-requested timeout is clamped to
    #[serde(default = "default_max_watch_timeout_ms")]
    pub max_watch_timeout_ms: u64,

    /// Most keys a single watch may cover
    #[serde(default = "default_max_keys_per_watch")]
    pub max_keys_per_watch: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: default_sweep_interval_ms(),
            default_watch_timeout_ms: default_watch_timeout_ms(),
            max_watch_timeout_ms: default_max_watch_timeout_ms(),
            max_keys_per_watch: default_max_keys_per_watch(),
        }
    }
}

impl WatchConfig {
    /// Validates the watch subsystem configuration
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "sweep_interval_ms must be greater than 0".into(),
            )));
        }
        if self.max_watch_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_watch_timeout_ms must be greater than 0".into(),
            )));
        }
        if self.default_watch_timeout_ms == 0 || self.default_watch_timeout_ms > self.max_watch_timeout_ms {
            return Err(Error::Config(ConfigError::Message(
                "default_watch_timeout_ms must be within (0, max_watch_timeout_ms]".into(),
            )));
        }
        if self.max_keys_per_watch == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_keys_per_watch must be greater than 0".into(),
            )));
        }
        Ok(())
    }

    /// Absolute deadline for a watch admitted at `now_ms`: the requested
    /// TTL clamped into `[1, max_watch_timeout_ms]`, with the default
    /// applied when the client supplies none.
    pub fn expire_at(
        &self,
        now_ms: i64,
        requested_ttl_ms: Option<u64>,
    ) -> i64 {
        let ttl = requested_ttl_ms
            .unwrap_or(self.default_watch_timeout_ms)
            .clamp(1, self.max_watch_timeout_ms);
        now_ms + ttl as i64
    }

    /// Loads the watch section from `config/watch.toml` (optional) with
    /// `WATCH`-prefixed environment variables taking priority.
    pub fn load() -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(File::with_name("config/watch").required(false))
            .add_source(
                Environment::with_prefix("WATCH")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

fn default_sweep_interval_ms() -> u64 {
    100
}
fn default_watch_timeout_ms() -> u64 {
    30_000
}
// in ms
fn default_max_watch_timeout_ms() -> u64 {
    3_600_000
}
fn default_max_keys_per_watch() -> usize {
    64
}
