//! HTTP listener configuration.

use serde::{Deserialize, Serialize};

/// Settings for the HTTP listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Seconds between keepalive comments on the `GET /mcp` stream.
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            keepalive_interval_secs: default_keepalive_interval(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_keepalive_interval() -> u64 {
    15
}
