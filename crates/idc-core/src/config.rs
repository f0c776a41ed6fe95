//! Tool-level settings.
//!
//! Settings are optional and live in a small YAML file (`idc.yaml` by
//! default). They hold defaults that apply to every invocation; per-invocation
//! parameters always win.
//!
//! ```yaml
//! region: eu-west-1
//! diff_policy: only_changed
//! wait:
//!   delay_secs: 5
//!   default_timeout_secs: 300
//! ```

use crate::error::{ConfigError, ParamsError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How scalar attributes are compared before emitting change operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffPolicy {
    /// Emit an operation only when the desired value differs from the current one.
    #[default]
    OnlyChanged,
    /// Emit an operation for every attribute the caller expressed, equal or not.
    ReassertAll,
}

/// Bounded polling after a create, until the resource is visible to a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    timeout: Duration,
    delay: Duration,
}

impl WaitPolicy {
    /// Build a policy. `timeout` and `delay` must be positive and `timeout`
    /// must allow at least one attempt.
    pub fn new(timeout: Duration, delay: Duration) -> Result<Self, ParamsError> {
        if timeout.is_zero() {
            return Err(ParamsError::invalid("wait_timeout", "must be a positive duration"));
        }
        if delay.is_zero() {
            return Err(ParamsError::invalid("wait delay", "must be a positive duration"));
        }
        if timeout < delay {
            return Err(ParamsError::invalid(
                "wait_timeout",
                format!(
                    "must be at least the polling delay of {}s",
                    delay.as_secs_f64()
                ),
            ));
        }
        Ok(Self { timeout, delay })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// `timeout / delay`, floor division.
    pub fn max_attempts(&self) -> u32 {
        let attempts = self.timeout.as_millis() / self.delay.as_millis().max(1);
        u32::try_from(attempts).unwrap_or(u32::MAX)
    }
}

/// Wait defaults from the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitSettings {
    /// Delay between existence checks.
    #[serde(default = "default_wait_delay_secs")]
    pub delay_secs: u64,

    /// Timeout used when a caller asks to wait without giving one.
    #[serde(default = "default_wait_timeout_secs")]
    pub default_timeout_secs: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            delay_secs: default_wait_delay_secs(),
            default_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

/// Complete settings loaded from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Default AWS region when the invocation does not name one.
    #[serde(default)]
    pub region: Option<String>,

    /// Scalar diff policy.
    #[serde(default)]
    pub diff_policy: DiffPolicy,

    /// Post-create wait defaults.
    #[serde(default)]
    pub wait: WaitSettings,
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings if the file exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.wait.delay_secs == 0 {
            return Err(ConfigError::Invalid("wait.delay_secs must be positive".to_string()));
        }
        if self.wait.default_timeout_secs < self.wait.delay_secs {
            return Err(ConfigError::Invalid(
                "wait.default_timeout_secs must be at least wait.delay_secs".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the wait policy for an invocation that asked to wait.
    pub fn wait_policy(&self, timeout_secs: Option<u64>) -> Result<WaitPolicy, ParamsError> {
        WaitPolicy::new(
            Duration::from_secs(timeout_secs.unwrap_or(self.wait.default_timeout_secs)),
            Duration::from_secs(self.wait.delay_secs),
        )
    }
}

fn default_wait_delay_secs() -> u64 {
    5
}

fn default_wait_timeout_secs() -> u64 {
    300
}
