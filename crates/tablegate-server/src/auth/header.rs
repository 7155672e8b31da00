use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};
use tablegate_core::ConfigError;
use tablegate_mcp::{AuthError, IdentityProvider};

use super::normalize;

/// Principal taken from a header set by a trusted upstream proxy.
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| ConfigError::Config(format!("invalid auth.header_name '{name}': {e}")))?;
        Ok(Self { header })
    }
}

#[async_trait]
impl IdentityProvider for HeaderIdentity {
    async fn principal(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(normalize)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::MissingHeader(self.header.to_string()))
    }
}
