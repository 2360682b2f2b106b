//! # Configuration Module
//!
//! Runtime settings of the transaction core, loaded from a YAML file and/or
//! environment variables.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TXN_TIMEOUT_MS` | `30000` | Time budget of a transaction before it is answered with 504 |
//! | `TXN_STRICTLY_REENTRANT` | `true` | Reject non-canonical numeric parameters |
//! | `TXN_MAX_BODY_LENGTH` | `512000` | Largest accepted request body in bytes |
//!
//! ## YAML
//!
//! ```yaml
//! transaction:
//!   timeout_ms: 5000
//!   strictly_reentrant: true
//!   max_body_length: 1048576
//!   default_charsets: [utf-8]
//! ```
//!
//! Environment variables override values read from the file.

use crate::coercion::CoercionOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_BODY_LENGTH: u64 = 512_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    pub timeout_ms: u64,
    pub strictly_reentrant: bool,
    pub max_body_length: u64,
    /// Charsets assumed producible when an operation declares none
    pub default_charsets: Vec<String>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            strictly_reentrant: true,
            max_body_length: DEFAULT_MAX_BODY_LENGTH,
            default_charsets: vec!["utf-8".to_string()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    transaction: TransactionConfig,
}

impl TransactionConfig {
    /// Defaults overridden by `TXN_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Load the `transaction` section of a YAML file, then apply environment overrides.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(file.transaction.with_overrides(|key| env::var(key).ok()))
    }

    /// Apply overrides from any key/value source; unparsable values are ignored.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TXN_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.timeout_ms = v;
        }
        if let Some(v) = lookup("TXN_STRICTLY_REENTRANT").and_then(|s| s.parse().ok()) {
            self.strictly_reentrant = v;
        }
        if let Some(v) = lookup("TXN_MAX_BODY_LENGTH").and_then(|s| s.parse().ok()) {
            self.max_body_length = v;
        }
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn coercion_options(&self) -> CoercionOptions {
        CoercionOptions {
            strictly_reentrant: self.strictly_reentrant,
        }
    }
}
