//! In-memory [`Store`] double for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tablegate_core::Identifier;

use crate::store::{BoundQuery, CreateTableRequest, Dialect, QueryOutcome, Row, Store, StoreError};

/// One call received by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Query(BoundQuery),
    CreateTable(CreateTableRequest),
    Insert {
        dataset: String,
        table: String,
        rows: usize,
    },
    Probe,
}

/// Records every call and answers with canned data.
///
/// Job ids are `recorded-<n>` where `n` counts calls from 1.
pub struct RecordingStore {
    dialect: Dialect,
    rows: Vec<Row>,
    affected_rows: Option<u64>,
    failure: Option<StoreError>,
    calls: Mutex<Vec<StoreCall>>,
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            dialect: Dialect::Standard,
            rows: Vec::new(),
            affected_rows: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Rows returned by every query.
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = Some(affected_rows);
        self
    }

    /// Fail every call with `error` (after recording it).
    pub fn failing(mut self, error: StoreError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: StoreCall) -> Result<usize, StoreError> {
        let count = match self.calls.lock() {
            Ok(mut calls) => {
                calls.push(call);
                calls.len()
            }
            Err(_) => return Err(StoreError::Worker("call log poisoned".to_string())),
        };
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(count),
        }
    }
}

#[async_trait]
impl Store for RecordingStore {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn query(&self, query: &BoundQuery) -> Result<QueryOutcome, StoreError> {
        let n = self.record(StoreCall::Query(query.clone()))?;
        Ok(QueryOutcome {
            job_id: format!("recorded-{n}"),
            rows: self.rows.clone(),
            affected_rows: self.affected_rows,
        })
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<String, StoreError> {
        self.record(StoreCall::CreateTable(request.clone()))?;
        Ok(format!("{}.{}", request.dataset, request.table))
    }

    async fn insert_rows(
        &self,
        dataset: &Identifier,
        table: &Identifier,
        rows: &[Map<String, Value>],
    ) -> Result<u64, StoreError> {
        self.record(StoreCall::Insert {
            dataset: dataset.to_string(),
            table: table.to_string(),
            rows: rows.len(),
        })?;
        Ok(rows.len() as u64)
    }

    async fn probe(&self) -> Result<(), StoreError> {
        self.record(StoreCall::Probe).map(|_| ())
    }
}
