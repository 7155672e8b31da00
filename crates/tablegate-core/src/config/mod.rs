//! Configuration types for the Tablegate server.
//!
//! Everything is loaded from a single YAML file into [`TablegateConfig`]. Every
//! field has a default, so an empty file (or no file at all) is a valid
//! starting point; the server binary layers CLI flags and env vars on top.
//!
//! ```yaml
//! app_name: tablegate
//! server:
//!   bind: 0.0.0.0:8080
//! store:
//!   database_url_env: DATABASE_URL
//! auth:
//!   mode: header
//!   header_name: x-principal
//! policy:
//!   source: /etc/tablegate/policy.json
//! guardrails:
//!   max_select_limit: 500
//! ```

pub mod auth;
pub mod guardrails;
pub mod policy;
pub mod server;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use auth::{AuthConfig, AuthMode};
pub use guardrails::GuardrailsConfig;
pub use policy::PolicyConfig;
pub use server::ServerConfig;
pub use store::StoreConfig;

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablegateConfig {
    /// Service name reported by the liveness endpoints.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub guardrails: GuardrailsConfig,
}

impl Default for TablegateConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            auth: AuthConfig::default(),
            policy: PolicyConfig::default(),
            guardrails: GuardrailsConfig::default(),
        }
    }
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

impl TablegateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// Blank content yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Check values that serde cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.guardrails.max_select_limit < 1 {
            return Err(ConfigError::Config(format!(
                "guardrails.max_select_limit must be at least 1, got {}",
                self.guardrails.max_select_limit
            )));
        }
        if self.server.keepalive_interval_secs == 0 {
            return Err(ConfigError::Config(
                "server.keepalive_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.store.max_connections == 0 {
            return Err(ConfigError::Config(
                "store.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.auth.header_name.trim().is_empty() {
            return Err(ConfigError::Config("auth.header_name must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_app_name() -> String {
    "tablegate".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
