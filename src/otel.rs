//! Structured logging setup
//!
//! Installs a `tracing` subscriber: an `EnvFilter` built from the configured level and
//! target directives, plus a JSON (production) or pretty (development) formatter.
//! Output can go through a `tracing-appender` non-blocking writer so that logging
//! never stalls a transaction.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TXN_LOG_LEVEL` | `info` | trace/debug/info/warn/error |
//! | `TXN_LOG_FORMAT` | `json` | json/pretty |
//! | `TXN_LOG_TARGET_FILTER` | unset | extra comma-separated directives, e.g. `openapi_txn::negotiation=debug` |
//! | `TXN_LOG_ASYNC` | `true` | write through a background thread |
//! | `TXN_LOG_INCLUDE_LOCATION` | `false` | add file and line to each event |
//!
//! `RUST_LOG`, when set, replaces the level.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error; anything else means info
    pub log_level: String,
    pub format: LogFormat,
    /// Additional `EnvFilter` directives, comma-separated
    pub target_filter: Option<String>,
    pub async_logging: bool,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::default_prod()
    }
}

impl LogConfig {
    /// Production defaults overridden by `TXN_LOG_*` environment variables.
    pub fn from_env() -> Self {
        Self::default_prod().with_overrides(|key| env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("TXN_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = lookup("TXN_LOG_FORMAT") {
            self.format = LogFormat::parse(&format);
        }
        if let Some(filter) = lookup("TXN_LOG_TARGET_FILTER") {
            self.target_filter = Some(filter);
        }
        if let Some(v) = lookup("TXN_LOG_ASYNC").and_then(|s| s.parse().ok()) {
            self.async_logging = v;
        }
        if let Some(v) = lookup("TXN_LOG_INCLUDE_LOCATION").and_then(|s| s.parse().ok()) {
            self.include_location = v;
        }
        self
    }

    /// Verbose, human-readable, synchronous.
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            async_logging: false,
            include_location: true,
        }
    }

    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            target_filter: None,
            async_logging: true,
            include_location: false,
        }
    }

    fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    /// Filter for this configuration; invalid target directives are an error.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        if let Some(targets) = &self.target_filter {
            for directive in targets.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                let parsed = directive
                    .parse::<Directive>()
                    .with_context(|| format!("Invalid log filter directive: {directive}"))?;
                filter = filter.add_directive(parsed);
            }
        }
        Ok(filter)
    }
}

/// Keeps the background writer alive; dropping it flushes pending events.
#[must_use = "dropping the guard stops asynchronous log output"]
#[derive(Debug)]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber described by `config`.
///
/// Fails if a global subscriber is already installed.
///
/// ```no_run
/// use openapi_txn::otel::{init_logging_with_config, LogConfig};
///
/// # fn main() -> anyhow::Result<()> {
/// let _guard = init_logging_with_config(&LogConfig::from_env())?;
/// # Ok(())
/// # }
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = config.env_filter()?;

    let (writer, worker) = if config.async_logging {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(writer), Some(guard))
    } else {
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard { _worker: worker })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_config_defaults() {
        let dev = LogConfig::default_dev();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(!dev.async_logging);
        assert!(dev.include_location);

        let prod = LogConfig::default();
        assert_eq!(prod.log_level, "info");
        assert_eq!(prod.format, LogFormat::Json);
        assert!(prod.async_logging);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TXN_LOG_LEVEL", "warn"),
            ("TXN_LOG_FORMAT", "pretty"),
            ("TXN_LOG_ASYNC", "false"),
            ("TXN_LOG_INCLUDE_LOCATION", "maybe"),
        ]
        .into_iter()
        .collect();
        let config = LogConfig::default_prod().with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.level(), Level::WARN);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.async_logging);
        assert!(!config.include_location);
    }

    #[test]
    fn test_unknown_level_means_info() {
        let config = LogConfig {
            log_level: "chatty".to_string(),
            ..LogConfig::default_prod()
        };
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_invalid_target_filter() {
        let config = LogConfig {
            target_filter: Some("openapi_txn=debug, hyper=loud".to_string()),
            ..LogConfig::default_dev()
        };
        let err = config.env_filter().unwrap_err();
        assert!(err.to_string().contains("Invalid log filter directive"));
    }
}
