//! Error types for the transport crate.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tablegate_runtime::GatewayError;
use thiserror::Error;

use crate::identity::AuthError;

/// Errors starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("failed to start server: {0}")]
    StartupFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Error returned by the plain request/response surface.
///
/// Rendered as `{"detail": "<message>"}` with a status per kind.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(GatewayError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(GatewayError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Gateway(GatewayError::Execution(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegate_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(AuthError::MissingBearer), StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("bad json".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::from(GatewayError::from(ValidationError::invalid_identifier("table", "a-b"))),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(GatewayError::Forbidden("no".into())), StatusCode::FORBIDDEN),
            (
                ApiError::from(GatewayError::Execution("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }
}
