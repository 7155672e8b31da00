//! Validation errors for structured request arguments.

use thiserror::Error;

/// A malformed or out-of-range structured input.
///
/// Always raised before any policy or store interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A dataset, table or column name failed the identifier whitelist.
    #[error("Invalid {label}: {name}")]
    InvalidIdentifier { label: String, name: String },

    /// A valid identifier longer than the target store can keep distinct.
    #[error("Invalid {label}: {name} (longer than {max} bytes)")]
    IdentifierTooLong {
        label: String,
        name: String,
        max: usize,
    },

    /// A table field declared a type outside the allow-list.
    #[error("Unsupported field type: {0}")]
    UnsupportedFieldType(String),

    /// A table field declared a mode other than NULLABLE, REQUIRED or REPEATED.
    #[error("Invalid mode '{mode}' for field '{field}': mode must be one of NULLABLE, REQUIRED, REPEATED")]
    InvalidFieldMode { field: String, mode: String },

    /// An operation-specific requirement was not met.
    #[error("{0}")]
    MissingRequirement(&'static str),

    /// An explicitly typed literal could not be parsed.
    #[error("Invalid {kind} literal for '{key}': {reason}")]
    InvalidLiteral {
        key: String,
        kind: &'static str,
        reason: String,
    },

    /// The argument document did not match the expected shape.
    #[error("Invalid arguments: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn invalid_identifier(label: &str, name: &str) -> Self {
        Self::InvalidIdentifier {
            label: label.to_string(),
            name: name.to_string(),
        }
    }
}
