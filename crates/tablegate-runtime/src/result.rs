//! Result documents returned to callers.

use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of one operation, tagged with the operation name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecuteResult {
    Select {
        row_count: usize,
        rows: Vec<Map<String, Value>>,
        job_id: String,
    },
    CreateTable {
        /// Fully-qualified name of the table.
        table: String,
        created: bool,
    },
    Insert {
        inserted_rows: u64,
    },
    Update {
        affected_rows: u64,
        job_id: String,
    },
    Delete {
        affected_rows: u64,
        job_id: String,
    },
}
