//! Verified bearer-token identity.
//!
//! Tokens are RS256 JWTs. Signature and expiry are always checked; audience
//! and issuer only when configured. The principal is the `email` claim, falling
//! back to `sub`.

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tablegate_core::ConfigError;
use tablegate_mcp::{AuthError, IdentityProvider};

use super::normalize;

#[derive(Debug, Deserialize)]
struct IdClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    sub: Option<String>,
}

pub struct IdTokenIdentity {
    key: DecodingKey,
    validation: Validation,
}

impl IdTokenIdentity {
    pub fn from_rsa_pem(
        pem: &[u8],
        audience: Option<&str>,
        issuers: &[String],
    ) -> Result<Self, ConfigError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| ConfigError::Config(format!("invalid token verification key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if !issuers.is_empty() {
            validation.set_issuer(issuers);
        }

        Ok(Self { key, validation })
    }

    fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<IdClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let claims = data.claims;
        [claims.email, claims.sub]
            .into_iter()
            .flatten()
            .map(|p| normalize(&p))
            .find(|p| !p.is_empty())
            .ok_or(AuthError::NoPrincipal)
    }
}

#[async_trait]
impl IdentityProvider for IdTokenIdentity {
    async fn principal(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingBearer)?;

        self.verify(token)
    }
}

/// Token from an `Authorization` value; the scheme is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
