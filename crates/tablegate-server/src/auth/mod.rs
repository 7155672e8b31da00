//! Identity providers for the three configured modes.

mod anonymous;
mod header;
mod jwt;

use std::fs;
use std::sync::Arc;

use tablegate_core::{AuthConfig, AuthMode, ConfigError};
use tablegate_mcp::IdentityProvider;

pub use anonymous::AnonymousIdentity;
pub use header::HeaderIdentity;
pub use jwt::IdTokenIdentity;

/// Build the provider selected by `config.mode`.
pub fn identity_provider(config: &AuthConfig) -> Result<Arc<dyn IdentityProvider>, ConfigError> {
    let provider: Arc<dyn IdentityProvider> = match config.mode {
        AuthMode::None => Arc::new(AnonymousIdentity),
        AuthMode::Header => Arc::new(HeaderIdentity::new(&config.header_name)?),
        AuthMode::IdToken => {
            let pem = verification_key(config)?;
            Arc::new(IdTokenIdentity::from_rsa_pem(
                pem.as_bytes(),
                config.audience.as_deref(),
                &config.issuers,
            )?)
        }
    };
    Ok(provider)
}

fn verification_key(config: &AuthConfig) -> Result<String, ConfigError> {
    let from_env = config
        .public_key_env
        .as_deref()
        .and_then(|var| std::env::var(var).ok())
        .filter(|pem| !pem.trim().is_empty());
    if let Some(pem) = from_env {
        return Ok(pem);
    }
    if let Some(path) = &config.public_key_file {
        return Ok(fs::read_to_string(path)?);
    }
    Err(ConfigError::Config(
        "auth.mode id_token requires auth.public_key_file or auth.public_key_env".to_string(),
    ))
}

/// Trim and lower-case a principal; empty results are rejected by callers.
pub(crate) fn normalize(principal: &str) -> String {
    principal.trim().to_lowercase()
}
