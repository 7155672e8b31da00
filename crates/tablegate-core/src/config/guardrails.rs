//! Execution guardrails.

use serde::{Deserialize, Serialize};

/// Limits applied by the translator regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailsConfig {
    /// Upper bound for a SELECT limit. Requested limits are clamped to
    /// `[1, max_select_limit]`.
    #[serde(default = "default_max_select_limit")]
    pub max_select_limit: i64,

    /// Permit DELETE with no filters.
    #[serde(default)]
    pub allow_full_table_delete: bool,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            max_select_limit: default_max_select_limit(),
            allow_full_table_delete: false,
        }
    }
}

impl GuardrailsConfig {
    /// Clamp a requested SELECT limit into the allowed range.
    pub fn clamp_limit(&self, requested: i64) -> i64 {
        requested.clamp(1, self.max_select_limit.max(1))
    }
}

fn default_max_select_limit() -> i64 {
    1000
}
