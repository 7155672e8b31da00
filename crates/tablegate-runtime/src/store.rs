//! The seam between the gateway and the backing store.
//!
//! A [`Store`] executes parameterized queries, creates tables, loads rows and
//! answers a connectivity probe. It never sees caller-supplied text outside of
//! bound parameters and row payloads: query text is produced by the translator
//! from validated identifiers only.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tablegate_core::{Identifier, MAX_IDENTIFIER_LEN, ParamType, ParamValue, TableField};
use thiserror::Error;

use crate::value::StoreValue;

/// Identifier quoting and placeholder syntax of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Backtick-quoted identifiers, `@name` placeholders.
    Standard,
    /// Double-quoted identifiers, `$n` placeholders numbered by bind order.
    Postgres,
}

impl Dialect {
    pub fn quote_ident(&self, ident: &Identifier) -> String {
        // Identifiers cannot contain either quote character, so no escaping.
        match self {
            Dialect::Standard => format!("`{ident}`"),
            Dialect::Postgres => format!("\"{ident}\""),
        }
    }

    /// Qualified `dataset.table` reference.
    pub fn table_ref(&self, dataset: &Identifier, table: &Identifier) -> String {
        format!("{}.{}", self.quote_ident(dataset), self.quote_ident(table))
    }

    /// Longest identifier, in bytes, the store keeps intact.
    ///
    /// PostgreSQL silently truncates names to 63 bytes, so two longer names
    /// sharing a prefix would resolve to the same object.
    pub fn max_identifier_len(&self) -> usize {
        match self {
            Dialect::Standard => MAX_IDENTIFIER_LEN,
            Dialect::Postgres => 63,
        }
    }

    /// Placeholder for a parameter named `name` bound at 1-based `position`.
    pub fn placeholder(&self, name: &str, position: usize) -> String {
        match self {
            Dialect::Standard => format!("@{name}"),
            Dialect::Postgres => format!("${position}"),
        }
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub name: String,
    pub value: ParamValue,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn param_type(&self) -> ParamType {
        self.value.param_type()
    }
}

/// Query text plus its parameters, in bind order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<QueryParameter>,
    /// `true` for reads; `false` for DML, where only the affected count matters.
    pub returns_rows: bool,
}

impl BoundQuery {
    pub fn param(&self, name: &str) -> Option<&QueryParameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// `name:TYPE` pairs, safe to log.
    pub fn param_signature(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|p| format!("{}:{}", p.name, p.param_type()))
            .collect()
    }
}

/// One row as returned by the store, columns in result order.
pub type Row = Vec<(String, StoreValue)>;

/// Outcome of a query execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// Correlation id the store assigned to this execution.
    pub job_id: String,
    pub rows: Vec<Row>,
    /// Rows touched by a DML statement, when the store reports it.
    pub affected_rows: Option<u64>,
}

/// Table definition handed to [`Store::create_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableRequest {
    pub dataset: Identifier,
    pub table: Identifier,
    pub fields: Vec<TableField>,
    pub if_not_exists: bool,
}

/// Store-side failures. All of them surface to callers as execution errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Query(String),

    /// Row-level errors from a bulk insert; the whole insert failed.
    #[error("Insert errors: {}", .0.join("; "))]
    Insert(Vec<String>),

    #[error("Store worker failed: {0}")]
    Worker(String),
}

/// The backing store.
///
/// Implementations must be shareable across tasks: the gateway holds one
/// behind an `Arc` and runs every call on a spawned task.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    fn dialect(&self) -> Dialect;

    /// Run a parameterized query or DML statement.
    async fn query(&self, query: &BoundQuery) -> Result<QueryOutcome, StoreError>;

    /// Create a table and return its fully-qualified name.
    async fn create_table(&self, request: &CreateTableRequest) -> Result<String, StoreError>;

    /// Insert rows through the store's structured load path. All or nothing.
    async fn insert_rows(
        &self,
        dataset: &Identifier,
        table: &Identifier,
        rows: &[Map<String, Value>],
    ) -> Result<u64, StoreError>;

    /// Cheap connectivity check.
    async fn probe(&self) -> Result<(), StoreError>;
}
