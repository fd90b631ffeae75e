use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;
use crate::rubric::RubricConfig;

pub const DEFAULT_REQUEST_TIMEOUT: &str = "15s";
pub const DEFAULT_LEDGER_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout, e.g. "15s"
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// How long a submit waits for the submission history, e.g. "10s"
    #[serde(default = "default_ledger_timeout")]
    pub ledger_timeout: String,

    /// Per-round rubric overrides, layered on the built-in rubrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubrics: Option<Vec<RubricConfig>>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

fn default_ledger_timeout() -> String {
    DEFAULT_LEDGER_TIMEOUT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            ledger_timeout: default_ledger_timeout(),
            rubrics: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration_field("request_timeout", &self.request_timeout)
    }

    pub fn ledger_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration_field("ledger_timeout", &self.ledger_timeout)
    }

    /// Check everything that serde alone cannot. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!(
                "base_url: '{}' must start with http:// or https://",
                self.base_url
            ));
        }
        for result in [self.request_timeout(), self.ledger_timeout()] {
            if let Err(e) = result {
                errors.push(e.to_string());
            }
        }
        if let Some(rubrics) = &self.rubrics {
            if let Err(rubric_errors) = crate::rubric::validate_rubrics(rubrics) {
                errors.extend(rubric_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_duration_field(field: &str, value: &str) -> anyhow::Result<Duration> {
    let duration = humantime::parse_duration(value.trim())
        .map_err(|e| anyhow::anyhow!("{}: invalid duration '{}': {}", field, value, e))?;
    if duration.is_zero() {
        anyhow::bail!("{}: must be greater than zero", field);
    }
    Ok(duration)
}
