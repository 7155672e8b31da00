//! Identifier whitelist.
//!
//! Dataset, table and column names are the only caller-supplied strings that
//! ever appear in generated query text. They must match
//! `^[A-Za-z_][A-Za-z0-9_]{0,127}$`; everything else is bound as a parameter.

use crate::error::ValidationError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Maximum identifier length in characters.
pub const MAX_IDENTIFIER_LEN: usize = 128;

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}$").expect("identifier pattern is a valid regex")
});

/// Validate `name` against the identifier pattern, returning it unchanged.
///
/// `label` names the role of the identifier ("dataset", "table", "column", ...)
/// and is only used in the error message.
pub fn validate_identifier<'a>(name: &'a str, label: &str) -> Result<&'a str, ValidationError> {
    if IDENT_RE.is_match(name) {
        Ok(name)
    } else {
        Err(ValidationError::invalid_identifier(label, name))
    }
}

/// A name that passed [`validate_identifier`].
///
/// There is no way to build one without going through validation, so any
/// `Identifier` is safe to splice into query text once quoted by a dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: impl Into<String>, label: &str) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_identifier(&name, label)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
