use async_trait::async_trait;
use axum::http::HeaderMap;
use tablegate_mcp::{AuthError, IdentityProvider};

/// Every request runs as `anonymous`.
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn principal(&self, _headers: &HeaderMap) -> Result<String, AuthError> {
        Ok("anonymous".to_string())
    }
}
