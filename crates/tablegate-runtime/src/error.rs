//! Gateway error kinds.

use tablegate_core::ValidationError;
use tablegate_policy::PolicyDenial;
use thiserror::Error;

use crate::store::StoreError;

/// Every way an operation can fail once it reaches the gateway.
///
/// Transports map each kind to their own status or error code.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Malformed or out-of-range input. Raised before any store interaction.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Rejected by policy or by a guardrail. Raised before any store interaction.
    #[error("{0}")]
    Forbidden(String),

    /// The store call failed. The message is passed through unchanged.
    #[error("{0}")]
    Execution(String),
}

impl From<PolicyDenial> for GatewayError {
    fn from(denial: PolicyDenial) -> Self {
        GatewayError::Forbidden(denial.message)
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        GatewayError::Execution(err.to_string())
    }
}
