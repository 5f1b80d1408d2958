//! CLI configuration.
//!
//! Loaded with the `config` crate from an optional TOML file, then
//! environment variables prefixed `HYPERPROV_` with `__` between nested keys
//! (`HYPERPROV_CLUSTER__HOST`, `HYPERPROV_POLLING__DEADLINE_SECS`).

use crate::error::CliError;
use hyperprov_catalog::VmTemplate;
use hyperprov_transport::{HttpOptions, RetryPolicy};
use hyperprov_workflow::PollPolicy;
use rootcause::Report;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "HYPERPROV";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub cluster: ClusterSettings,

    #[serde(default)]
    pub polling: PollingSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub vm: VmTemplate,
}

/// Where the cluster is and how to reach it.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSettings {
    /// Host name or IP address of any cluster node.
    pub host: String,

    #[serde(default = "default_username")]
    pub username: String,

    /// Prompted for when absent.
    #[serde(default)]
    pub password: Option<String>,

    /// The cluster ships self-signed certificates.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Task status polling.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Give up on a task after this long; 0 waits forever.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Status queries per task before giving up; at least 1 when set.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_interval_ms() -> u64 {
    10_000
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_deadline_secs() -> u64 {
    30 * 60
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            backoff_factor: default_backoff_factor(),
            deadline_secs: default_deadline_secs(),
            max_attempts: None,
        }
    }
}

/// Retry of connection-level transport failures. Off unless `max_retries > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetrySettings {
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Settings {
    /// Loads settings from `path` (if given) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a value has the wrong
    /// type, or `cluster.host` is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, Report<CliError>> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`] but reads environment variables from `env`
    /// instead of the process when given.
    pub(crate) fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, Report<CliError>> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let settings: Settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| CliError::Config {
                reason: e.to_string(),
            })?;

        if settings.cluster.host.trim().is_empty() {
            return Err(CliError::Config {
                reason: "cluster.host must not be empty".to_string(),
            }
            .into());
        }
        if settings.polling.max_attempts == Some(0) {
            return Err(CliError::Config {
                reason: "polling.max_attempts must be at least 1".to_string(),
            }
            .into());
        }
        Ok(settings)
    }

    /// Poll policy for task tracking.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        let polling = &self.polling;
        let mut policy = PollPolicy::exponential(
            Duration::from_millis(polling.interval_ms),
            polling.backoff_factor,
            Duration::from_millis(polling.max_interval_ms),
        );
        if polling.deadline_secs > 0 {
            policy = policy.with_deadline(Duration::from_secs(polling.deadline_secs));
        }
        if let Some(max_attempts) = polling.max_attempts {
            policy = policy.with_max_attempts(max_attempts);
        }
        policy
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            Duration::from_millis(self.retry.delay_ms),
        )
    }

    #[must_use]
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            request_timeout: Duration::from_secs(self.cluster.request_timeout_secs),
            accept_invalid_certs: self.cluster.accept_invalid_certs,
        }
    }
}
