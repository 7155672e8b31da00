//! Authorization decisions.

use crate::document::{PolicyDocument, WILDCARD, normalize_operation};
use crate::error::{PolicyDenial, PolicyLoadError};
use std::fs;
use std::path::Path;

/// Canonical form of a principal: trimmed and lower-cased.
pub fn normalize_principal(principal: &str) -> String {
    principal.trim().to_lowercase()
}

/// Decides whether a principal may run an operation against a table.
///
/// Holds an immutable snapshot of the policy. Share it behind an `Arc`; every
/// method takes `&self` and there is nothing to lock.
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    document: PolicyDocument,
}

impl PolicyEngine {
    pub fn new(document: PolicyDocument) -> Self {
        Self { document }
    }

    /// Load a policy from its configured source.
    ///
    /// A source whose first non-blank character is `{` is parsed as inline
    /// JSON. Anything else is a path to a JSON file.
    pub fn load(source: &str) -> Result<Self, PolicyLoadError> {
        let raw = source.trim();
        if raw.is_empty() {
            return Err(PolicyLoadError::Missing);
        }

        let document = if raw.starts_with('{') {
            PolicyDocument::from_json(raw)?
        } else {
            let path = Path::new(raw);
            let content = fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            PolicyDocument::from_json(&content)?
        };

        tracing::info!(
            principals = document.principals.len(),
            has_default = document.default.is_some(),
            "Loaded access policy"
        );
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    /// Check one request against the policy.
    ///
    /// Checks run in a fixed order: operation, then dataset, then table. A
    /// principal with no entry of its own falls back to `default`; with no
    /// default either, everything is denied.
    pub fn assert_allowed(
        &self,
        principal: &str,
        operation: &str,
        dataset: &str,
        table: &str,
    ) -> Result<(), PolicyDenial> {
        let principal = normalize_principal(principal);
        let operation = normalize_operation(operation);

        let Some(rules) = self.document.rules_for(&principal) else {
            return Err(PolicyDenial::operation_not_allowed(&operation, &principal));
        };

        if !rules.allows_operation(&operation) {
            return Err(PolicyDenial::operation_not_allowed(&operation, &principal));
        }

        let Some(tables) = rules.tables(dataset) else {
            return Err(PolicyDenial::dataset_not_allowed(dataset, &principal));
        };

        if tables.contains(WILDCARD) || tables.contains(table) {
            Ok(())
        } else {
            Err(PolicyDenial::table_not_allowed(dataset, table, &principal))
        }
    }
}
