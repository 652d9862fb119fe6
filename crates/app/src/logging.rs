//! Tracing subscriber setup for the desktop binary.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    /// Human-readable output; the default for a desktop app.
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter directive, e.g. `info` or `services=debug,info`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// `PROCTOR_LOG` for the filter, `PROCTOR_LOG_FORMAT` (`json` or
    /// `pretty`) for the format.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let level = lookup("PROCTOR_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.level);
        let format = match lookup("PROCTOR_LOG_FORMAT").as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => defaults.format,
        };
        Self { format, level }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("subscriber already initialized")]
    AlreadyInitialized,
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter =
        EnvFilter::try_new(&config.level).map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|_| LogError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        assert_eq!(LogConfig::from_lookup(|_| None), LogConfig::default());
    }

    #[test]
    fn reads_level_and_format() {
        let config = LogConfig::from_lookup(|key| match key {
            "PROCTOR_LOG" => Some("services=debug".into()),
            "PROCTOR_LOG_FORMAT" => Some("JSON".into()),
            _ => None,
        });
        assert_eq!(config.level, "services=debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn bad_filter_is_reported() {
        let config = LogConfig {
            format: LogFormat::Json,
            level: "services=notalevel".into(),
        };
        assert!(matches!(init_logging(&config), Err(LogError::InvalidFilter(_))));
    }
}
