//! Store connection configuration.
//!
//! The connection URL can be given two ways, in order of precedence:
//! 1. `database_url_env` - the name of an environment variable holding the URL
//! 2. `database_url` - the URL itself

use serde::{Deserialize, Serialize};

/// Connection settings for the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Environment variable containing the connection URL. Highest precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url_env: Option<String>,

    /// Connection URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Timeout in seconds when acquiring a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url_env: None,
            database_url: None,
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout(),
        }
    }
}

impl StoreConfig {
    /// Resolve the connection URL.
    ///
    /// An env var reference wins over the inline URL. A referenced variable that
    /// is unset or empty falls back to the inline URL.
    pub fn resolve_url(&self) -> Option<String> {
        self.database_url_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.database_url.clone())
            .filter(|url| !url.trim().is_empty())
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_url() {
        let config = StoreConfig {
            database_url: Some("postgres://localhost/app".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_url().as_deref(), Some("postgres://localhost/app"));
    }

    #[test]
    fn test_missing_env_var_falls_back_to_inline() {
        let config = StoreConfig {
            database_url_env: Some("TABLEGATE_TEST_URL_THAT_IS_NEVER_SET".into()),
            database_url: Some("postgres://localhost/app".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_url().as_deref(), Some("postgres://localhost/app"));
    }

    #[test]
    fn test_nothing_configured() {
        assert_eq!(StoreConfig::default().resolve_url(), None);
    }
}
