use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the JSON-over-HTTP exam backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamConfig {
    pub api_url: Url,
    pub device_id: Option<String>,
    pub request_timeout: Duration,
    /// Where externally hosted exam pages live. Defaults to the API origin.
    pub content_url: Option<Url>,
}

impl ExamConfig {
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            device_id: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            content_url: None,
        }
    }

    /// Read `PROCTOR_API_URL`, `PROCTOR_DEVICE_ID`,
    /// `PROCTOR_REQUEST_TIMEOUT_SECS` and `PROCTOR_CONTENT_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the API URL is missing or malformed, or the
    /// timeout is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ExamConfig::from_env`] but reads from an arbitrary source.
    ///
    /// # Errors
    ///
    /// See [`ExamConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup("PROCTOR_API_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        let api_url = Url::parse(raw.trim().trim_end_matches('/'))?;

        let device_id = lookup("PROCTOR_DEVICE_ID").filter(|value| !value.trim().is_empty());

        let request_timeout = match lookup("PROCTOR_REQUEST_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(value)),
            },
        };

        let content_url = lookup("PROCTOR_CONTENT_URL")
            .filter(|value| !value.trim().is_empty())
            .map(|value| Url::parse(value.trim()))
            .transpose()?;

        Ok(Self {
            api_url,
            device_id,
            request_timeout,
            content_url,
        })
    }

    /// `{api_url}/{path}`, tolerating a base URL with or without a path prefix.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl ExamConfig {
    /// Origin that legacy content paths are resolved against.
    #[must_use]
    pub fn content_origin(&self) -> Url {
        if let Some(url) = &self.content_url {
            return url.clone();
        }
        let mut origin = self.api_url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin
    }
}

/// Time limits and integrity thresholds for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionPolicy {
    pub full_limit_secs: u32,
    pub half_limit_secs: u32,
    pub legacy_limit_secs: u32,
    /// Focus-loss events allowed before the session is force-submitted. The
    /// event that reaches this count is the forcing one.
    pub violation_allowance: u32,
    /// Focus-loss events closer together than this count once.
    pub violation_coalesce: chrono::Duration,
    pub tick_period: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            full_limit_secs: 5400,
            half_limit_secs: 2700,
            legacy_limit_secs: 2700,
            violation_allowance: 3,
            violation_coalesce: chrono::Duration::seconds(1),
            tick_period: Duration::from_secs(1),
        }
    }
}
