//! PostgreSQL [`Store`].
//!
//! Datasets map to schemas and tables to tables. Query text arrives from the
//! translator already in the Postgres dialect (`"quoted"` identifiers, `$n`
//! placeholders); this crate binds the typed parameters and decodes rows.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{Arguments, PgPool};
use tablegate_core::{Identifier, ParamValue};
use tablegate_runtime::{
    BoundQuery, CreateTableRequest, Dialect, QueryOutcome, QueryParameter, Store, StoreError,
};
use uuid::Uuid;

pub mod ddl;
pub mod decode;

fn args_add<T>(args: &mut PgArguments, v: T) -> Result<(), StoreError>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v).map_err(|e| StoreError::Query(e.to_string()))
}

fn bind(args: &mut PgArguments, param: &QueryParameter) -> Result<(), StoreError> {
    match &param.value {
        ParamValue::Bool(b) => args_add(args, *b),
        ParamValue::Int64(i) => args_add(args, *i),
        ParamValue::Float64(f) => args_add(args, *f),
        ParamValue::Numeric(d) => args_add(args, d.clone()),
        ParamValue::Timestamp(ts) => args_add(args, *ts),
        ParamValue::Date(d) => args_add(args, *d),
        ParamValue::String(s) => args_add(args, s.clone()),
        ParamValue::Null => args_add(args, Option::<String>::None),
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) => StoreError::Query(db.message().to_string()),
        other @ (sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)) => StoreError::Connection(other.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

/// Pool settings.
#[derive(Debug, Clone, Copy)]
pub struct PgStoreOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, options: PgStoreOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Build a store around a pool that is not connected until first use.
    pub fn connect_lazy(database_url: &str, options: PgStoreOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_lazy(database_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Column list shared by every row of an insert, in first-seen order.
///
/// Keys are not validated upstream, so a key that is not a valid identifier is
/// reported as a row error.
fn insert_columns(rows: &[Map<String, Value>]) -> Result<Vec<Identifier>, StoreError> {
    let mut columns: Vec<Identifier> = Vec::new();
    let mut errors = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        for key in row.keys() {
            match Identifier::parse(key.as_str(), "column") {
                Ok(ident) if !columns.contains(&ident) => columns.push(ident),
                Ok(_) => {}
                Err(e) => errors.push(format!("row {i}: {e}")),
            }
        }
    }
    if !errors.is_empty() {
        return Err(StoreError::Insert(errors));
    }
    if columns.is_empty() {
        return Err(StoreError::Insert(vec!["rows contain no columns".to_string()]));
    }
    Ok(columns)
}

/// `INSERT ... SELECT` over `jsonb_populate_recordset`, so the whole batch is
/// one statement bound to a single JSONB parameter.
pub fn insert_sql(dataset: &Identifier, table: &Identifier, columns: &[Identifier]) -> String {
    let table_ref = Dialect::Postgres.table_ref(dataset, table);
    let column_list = columns
        .iter()
        .map(|c| Dialect::Postgres.quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table_ref} ({column_list}) \
         SELECT {column_list} FROM jsonb_populate_recordset(NULL::{table_ref}, $1)"
    )
}

#[async_trait]
impl Store for PgStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, query: &BoundQuery) -> Result<QueryOutcome, StoreError> {
        let mut args = PgArguments::default();
        for param in &query.params {
            bind(&mut args, param)?;
        }
        let job_id = Uuid::new_v4().to_string();
        tracing::debug!(job_id = %job_id, sql = %query.sql, "Executing query");

        let q = sqlx::query_with(&query.sql, args);
        if query.returns_rows {
            let rows = q.fetch_all(&self.pool).await.map_err(store_error)?;
            Ok(QueryOutcome {
                job_id,
                rows: rows
                    .iter()
                    .map(decode::decode_row)
                    .collect::<Result<Vec<_>, _>>()?,
                affected_rows: None,
            })
        } else {
            let done = q.execute(&self.pool).await.map_err(store_error)?;
            Ok(QueryOutcome {
                job_id,
                rows: Vec::new(),
                affected_rows: Some(done.rows_affected()),
            })
        }
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<String, StoreError> {
        let sql = ddl::create_table_sql(request);
        tracing::debug!(sql = %sql, "Creating table");
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(format!("{}.{}", request.dataset, request.table))
    }

    async fn insert_rows(
        &self,
        dataset: &Identifier,
        table: &Identifier,
        rows: &[Map<String, Value>],
    ) -> Result<u64, StoreError> {
        let columns = insert_columns(rows)?;
        let sql = insert_sql(dataset, table, &columns);
        let payload = Value::Array(rows.iter().cloned().map(Value::Object).collect());

        let done = sqlx::query(&sql)
            .bind(sqlx::types::Json(payload))
            .execute(&self.pool)
            .await
            .map_err(|e| match store_error(e) {
                StoreError::Query(message) => StoreError::Insert(vec![message]),
                other => other,
            })?;
        Ok(done.rows_affected())
    }

    async fn probe(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1 AS ok")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }
}
