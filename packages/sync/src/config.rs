//! Session settings, read from the `session` section of `folio.config.json`

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Undo levels kept per album
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

fn default_history_limit() -> usize {
    100
}

fn default_auto_save_interval() -> u64 {
    90
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    1000
}

fn default_multiplier() -> u32 {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            sync: SyncConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_save_interval_secs: default_auto_save_interval(),
            poll_interval_secs: default_poll_interval(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            multiplier: default_multiplier(),
        }
    }
}

impl SyncConfig {
    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
