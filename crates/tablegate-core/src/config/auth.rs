//! Caller identity configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the caller's principal is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Every caller is `anonymous`.
    None,
    /// A trusted upstream proxy puts the principal in a header.
    Header,
    /// A signed bearer token carries the principal.
    #[default]
    IdToken,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AuthMode::None),
            "header" => Ok(AuthMode::Header),
            "id_token" => Ok(AuthMode::IdToken),
            other => Err(format!(
                "unknown auth mode '{other}' (expected none, header or id_token)"
            )),
        }
    }
}

/// Identity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,

    /// Header read in `header` mode.
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Audience a bearer token must carry. Not checked when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,

    /// Accepted token issuers. Not checked when empty.
    #[serde(default)]
    pub issuers: Vec<String>,

    /// PEM file holding the token verification key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_file: Option<PathBuf>,

    /// Environment variable holding the PEM verification key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_env: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            header_name: default_header_name(),
            audience: None,
            issuers: Vec::new(),
            public_key_file: None,
            public_key_env: None,
        }
    }
}

fn default_header_name() -> String {
    "x-principal".to_string()
}
