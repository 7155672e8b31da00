//! Policy error types.

use std::path::PathBuf;
use thiserror::Error;

/// Which check rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    OperationNotAllowed,
    DatasetNotAllowed,
    TableNotAllowed,
}

/// A policy decision that rejected a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PolicyDenial {
    pub kind: DenialKind,
    pub message: String,
}

impl PolicyDenial {
    pub fn new(kind: DenialKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn operation_not_allowed(operation: &str, principal: &str) -> Self {
        Self::new(
            DenialKind::OperationNotAllowed,
            format!("Operation '{operation}' is not allowed for principal '{principal}'"),
        )
    }

    pub fn dataset_not_allowed(dataset: &str, principal: &str) -> Self {
        Self::new(
            DenialKind::DatasetNotAllowed,
            format!("Dataset '{dataset}' is not allowed for principal '{principal}'"),
        )
    }

    pub fn table_not_allowed(dataset: &str, table: &str, principal: &str) -> Self {
        Self::new(
            DenialKind::TableNotAllowed,
            format!("Table '{dataset}.{table}' is not allowed for principal '{principal}'"),
        )
    }
}

/// The policy source could not be turned into a document.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("no policy source configured: set POLICY_JSON to a JSON document or a path to one")]
    Missing,

    #[error("policy file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("policy is not a valid policy document: {0}")]
    Json(#[from] serde_json::Error),
}
