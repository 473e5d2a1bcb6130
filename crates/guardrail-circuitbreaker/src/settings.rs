//! Serializable per-target breaker settings.

use crate::config::{CircuitBreakerConfigBuilder, DEFAULT_RESET_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Breaker settings as they appear in a configuration file.
///
/// ```json
/// { "name": "mailchimp", "failure_threshold": 5, "reset_timeout_ms": 30000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSettings {
    pub name: String,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
    #[serde(default = "default_half_open_max_attempts")]
    pub half_open_max_attempts: u32,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_ms() -> u64 {
    DEFAULT_RESET_TIMEOUT.as_millis() as u64
}

fn default_half_open_max_attempts() -> u32 {
    1
}

impl BreakerSettings {
    /// Settings for `name` with every other field at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
            half_open_max_attempts: default_half_open_max_attempts(),
        }
    }

    /// A builder seeded from these settings; listeners and sink can still be added.
    pub fn builder(&self) -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
            .name(self.name.clone())
            .failure_threshold(self.failure_threshold)
            .reset_timeout(Duration::from_millis(self.reset_timeout_ms))
            .half_open_max_attempts(self.half_open_max_attempts)
    }
}
