//! Traversal configuration
//!
//! Defaults can be overridden through environment variables:
//!
//! | Variable             | Field                | Default |
//! |----------------------|----------------------|---------|
//! | `LINEAGE_MAX_DEPTH`  | `default_max_depth`  | 64      |
//! | `LINEAGE_SHARD_SIZE` | `shard_size`         | 500     |
//! | `LINEAGE_TIMEOUT_MS` | `default_timeout_ms` | 30000   |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_MAX_DEPTH: &str = "LINEAGE_MAX_DEPTH";
pub const ENV_SHARD_SIZE: &str = "LINEAGE_SHARD_SIZE";
pub const ENV_TIMEOUT_MS: &str = "LINEAGE_TIMEOUT_MS";

/// Configuration for the traversal engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Depth bound hosts use when the caller does not give one (default: 64)
    pub default_max_depth: u32,
    /// Maximum ids per batched store read; larger frontiers are split into
    /// shards read concurrently (default: 500)
    pub shard_size: usize,
    /// Deadline applied when the caller's signal carries none (default: 30s)
    pub default_timeout_ms: u64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 64,
            shard_size: 500,
            default_timeout_ms: 30_000,
        }
    }
}

impl TraversalConfig {
    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Unparseable or zero values fall back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            default_max_depth: positive_or(&lookup, ENV_MAX_DEPTH, defaults.default_max_depth),
            shard_size: positive_or(&lookup, ENV_SHARD_SIZE, defaults.shard_size),
            default_timeout_ms: positive_or(&lookup, ENV_TIMEOUT_MS, defaults.default_timeout_ms),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

fn positive_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            tracing::warn!(key, value = %raw, fallback = %default, "ignoring invalid config value");
            default
        }
    }
}
