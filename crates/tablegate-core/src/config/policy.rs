//! Policy source configuration.

use serde::{Deserialize, Serialize};

/// Where the access-control policy comes from.
///
/// The source is either inline JSON (anything starting with `{`) or a path to
/// a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Environment variable consulted when `source` is unset.
    #[serde(default = "default_source_env")]
    pub source_env: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            source: None,
            source_env: default_source_env(),
        }
    }
}

impl PolicyConfig {
    pub fn resolve_source(&self) -> Option<String> {
        self.source
            .clone()
            .or_else(|| std::env::var(&self.source_env).ok())
            .filter(|s| !s.trim().is_empty())
    }
}

fn default_source_env() -> String {
    "POLICY_JSON".to_string()
}
