//! Caller identity seam.
//!
//! The transport asks an [`IdentityProvider`] for the principal behind each
//! request. Providers live with the binary; this crate only needs the trait.

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

/// Missing or invalid proof of identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing {0} header")]
    MissingHeader(String),

    #[error("Missing Bearer token")]
    MissingBearer,

    #[error("Invalid ID token: {0}")]
    InvalidToken(String),

    #[error("No principal in token")]
    NoPrincipal,
}

/// Resolves the normalized principal for a request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn principal(&self, headers: &HeaderMap) -> Result<String, AuthError>;
}
