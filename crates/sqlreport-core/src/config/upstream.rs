//! Upstream SQL executor configuration.
//!
//! The executor is a remote HTTP endpoint that accepts rendered SQL and
//! returns JSON rows. Its API token can be configured two ways:
//! 1. `api_token_env` - reference an environment variable
//! 2. `api_token` - provide the token directly

use serde::{Deserialize, Serialize};

/// Configuration for the remote SQL executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the executor endpoint, e.g. `https://db.internal/sql/exec/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_exec_base_url: Option<String>,

    /// Environment variable containing the API token.
    /// Highest precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token_env: Option<String>,

    /// API token used when the caller supplies no bearer credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Whether `localhost` / `127.0.0.1` endpoints are accepted.
    #[serde(default = "default_true")]
    pub allow_localhost: bool,

    /// Path suffix every endpoint URL must end with. Empty disables the check.
    #[serde(default = "default_path_suffix")]
    pub required_path_suffix: String,

    /// Request timeout for a single execution.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            sql_exec_base_url: None,
            api_token_env: None,
            api_token: None,
            allow_localhost: true,
            required_path_suffix: default_path_suffix(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl UpstreamConfig {
    /// Resolve the configured API token.
    ///
    /// Precedence:
    /// 1. api_token_env (environment variable)
    /// 2. api_token (direct value)
    pub fn resolve_api_token(&self) -> Option<String> {
        if let Some(env_var) = &self.api_token_env
            && let Ok(token) = std::env::var(env_var)
            && !token.trim().is_empty()
        {
            return Some(token);
        }
        self.api_token
            .clone()
            .filter(|token| !token.trim().is_empty())
    }

    /// The path suffix check, if enabled.
    pub fn path_suffix(&self) -> Option<&str> {
        Some(self.required_path_suffix.as_str()).filter(|s| !s.trim().is_empty())
    }
}

fn default_true() -> bool {
    true
}

fn default_path_suffix() -> String {
    "/sql/exec/".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}
