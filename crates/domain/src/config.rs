use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Host connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host origin, e.g. `https://paralegal.example.com`. Required.
    #[serde(default)]
    pub base_url: String,
    /// Plaintext API key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Whole-request timeout for non-streaming calls. Streams are not
    /// bounded by it; they end when the host closes the body or the caller
    /// cancels.
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
    #[serde(default = "d_10000")]
    pub connect_timeout_ms: u64,
    /// Retries for idempotent (GET) requests on 5xx and transport errors.
    #[serde(default = "d_2")]
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            api_key_env: d_api_key_env(),
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            max_retries: 2,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Resolve the API key: the explicit `api_key` field wins, then the
    /// `api_key_env` variable. Empty values count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

fn d_api_key_env() -> String {
    "PARALEGAL_API_KEY".into()
}
fn d_30000() -> u64 {
    30_000
}
fn d_10000() -> u64 {
    10_000
}
fn d_2() -> u32 {
    2
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let client = &self.client;

        if client.base_url.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "client.base_url".into(),
                message: "base_url is required".into(),
            });
        } else if !client.base_url.starts_with("http://")
            && !client.base_url.starts_with("https://")
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "client.base_url".into(),
                message: format!("'{}' is not an http(s) URL", client.base_url),
            });
        }

        if client.timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "client.timeout_ms".into(),
                message: "timeout must be greater than 0".into(),
            });
        }

        if client.api_key.is_some() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "client.api_key".into(),
                message: "API key stored in plaintext; prefer api_key_env".into(),
            });
        }

        errors
    }

    /// Override file values with `PARALEGAL_BASE_URL` when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("PARALEGAL_BASE_URL") {
            if !url.is_empty() {
                self.client.base_url = url;
            }
        }
    }
}
