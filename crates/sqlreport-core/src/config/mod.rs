//! Configuration types for SqlReport.
//!
//! Configuration is loaded from a single YAML file. Every section has
//! defaults, so an empty file is a valid configuration.
//!
//! ```yaml
//! environment: Prod
//! upstream:
//!   sql_exec_base_url: https://db.internal/sql/exec/
//!   api_token_env: SQLREPORT_API_TOKEN
//! security:
//!   acl_default_deny: true
//! reports:
//!   max_rows: 500
//! ```

pub mod upstream;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use upstream::UpstreamConfig;

/// Complete SqlReport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlReportConfig {
    /// Environment label attached to report runs.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Remote SQL executor.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Access control policy.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Report run limits.
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Log filter.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SqlReportConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            upstream: UpstreamConfig::default(),
            security: SecurityConfig::default(),
            reports: ReportsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Access control policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Deny access to resources that have no ACL entries at all.
    /// When false, a resource without entries is open to every principal.
    #[serde(default)]
    pub acl_default_deny: bool,
}

/// Limits applied to report runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Rows returned by a run before truncation.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Options returned for a variable when the caller gives no limit.
    #[serde(default = "default_options_limit")]
    pub options_limit: usize,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            options_limit: default_options_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_environment() -> String {
    "Prod".to_string()
}

fn default_max_rows() -> usize {
    500
}

fn default_options_limit() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SqlReportConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.reports.max_rows == 0 {
            return Err(ConfigError::Config(
                "reports.max_rows must be greater than zero".to_string(),
            ));
        }
        if self.reports.options_limit == 0 {
            return Err(ConfigError::Config(
                "reports.options_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
