//! The execution pipeline shared by every transport.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tablegate_core::{ExecuteArgs, GuardrailsConfig, Operation};
use tablegate_policy::PolicyEngine;
use tracing::{debug, error, info, warn};

use crate::error::GatewayError;
use crate::result::ExecuteResult;
use crate::store::{Store, StoreError};
use crate::translator::{OperationTranslator, Plan};
use crate::value::normalize_row;

/// Runs operations: authorize, translate, execute, normalize.
///
/// Argument validation happens earlier, when [`ExecuteArgs`] is built. The
/// policy check always completes before the store is touched.
#[derive(Clone)]
pub struct ExecutionGateway {
    policy: Arc<PolicyEngine>,
    store: Arc<dyn Store>,
    translator: OperationTranslator,
}

impl ExecutionGateway {
    pub fn new(policy: Arc<PolicyEngine>, store: Arc<dyn Store>, guardrails: GuardrailsConfig) -> Self {
        let translator = OperationTranslator::new(store.dialect(), guardrails);
        Self {
            policy,
            store,
            translator,
        }
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// Validate a raw argument document, then execute it.
    pub async fn execute_value(
        &self,
        principal: &str,
        arguments: Value,
    ) -> Result<ExecuteResult, GatewayError> {
        let args = ExecuteArgs::from_value(arguments)?;
        self.execute(principal, args).await
    }

    /// Execute one validated operation on behalf of `principal`.
    pub async fn execute(
        &self,
        principal: &str,
        args: ExecuteArgs,
    ) -> Result<ExecuteResult, GatewayError> {
        let operation = args.operation;
        let dataset = args.dataset.to_string();
        let table = args.table.to_string();

        if let Err(err) = self.translator.check_identifiers(&args) {
            warn!(principal, operation = %operation, %dataset, %table, reason = %err, "Operation rejected");
            return Err(err.into());
        }

        if let Err(denial) =
            self.policy
                .assert_allowed(principal, operation.as_str(), &dataset, &table)
        {
            warn!(
                principal,
                operation = %operation,
                %dataset,
                %table,
                reason = %denial,
                "Policy denied operation"
            );
            return Err(denial.into());
        }

        let plan = self.translator.translate(args).inspect_err(|err| {
            warn!(principal, operation = %operation, %dataset, %table, reason = %err, "Operation rejected");
        })?;

        let result = self.run(plan).await;
        match &result {
            Ok(outcome) => info!(
                principal,
                operation = %operation,
                %dataset,
                %table,
                outcome = ?summary(outcome),
                "Operation executed"
            ),
            Err(err) => error!(
                principal,
                operation = %operation,
                %dataset,
                %table,
                error = %err,
                "Operation failed"
            ),
        }
        result
    }

    /// Connectivity probe. Shares nothing with in-flight operations.
    pub async fn ready(&self) -> Result<(), GatewayError> {
        let store = Arc::clone(&self.store);
        dispatch(async move { store.probe().await }).await
    }

    async fn run(&self, plan: Plan) -> Result<ExecuteResult, GatewayError> {
        let store = Arc::clone(&self.store);
        match plan {
            Plan::Query { operation, query } => {
                debug!(sql = %query.sql, params = ?query.param_signature(), "Dispatching query");
                let outcome = dispatch(async move { store.query(&query).await }).await?;
                let affected_rows = outcome.affected_rows.unwrap_or(0);
                Ok(match operation {
                    Operation::Update => ExecuteResult::Update {
                        affected_rows,
                        job_id: outcome.job_id,
                    },
                    Operation::Delete => ExecuteResult::Delete {
                        affected_rows,
                        job_id: outcome.job_id,
                    },
                    _ => {
                        let rows: Vec<_> = outcome.rows.iter().map(normalize_row).collect();
                        ExecuteResult::Select {
                            row_count: rows.len(),
                            rows,
                            job_id: outcome.job_id,
                        }
                    }
                })
            }
            Plan::CreateTable(request) => {
                debug!(
                    dataset = %request.dataset,
                    table = %request.table,
                    fields = request.fields.len(),
                    if_not_exists = request.if_not_exists,
                    "Dispatching table creation"
                );
                let table = dispatch(async move { store.create_table(&request).await }).await?;
                Ok(ExecuteResult::CreateTable {
                    table,
                    created: true,
                })
            }
            Plan::Insert {
                dataset,
                table,
                rows,
            } => {
                debug!(%dataset, %table, rows = rows.len(), "Dispatching insert");
                let attempted = rows.len() as u64;
                dispatch(async move { store.insert_rows(&dataset, &table, &rows).await }).await?;
                Ok(ExecuteResult::Insert {
                    inserted_rows: attempted,
                })
            }
        }
    }
}

/// Run a store call on its own task.
///
/// The caller awaits the join handle; dropping the caller does not cancel the
/// store call.
async fn dispatch<T, F>(call: F) -> Result<T, GatewayError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    tokio::spawn(call)
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
        .map_err(GatewayError::from)
}

fn summary(result: &ExecuteResult) -> String {
    match result {
        ExecuteResult::Select { row_count, job_id, .. } => format!("rows={row_count} job_id={job_id}"),
        ExecuteResult::CreateTable { table, .. } => format!("table={table}"),
        ExecuteResult::Insert { inserted_rows } => format!("inserted_rows={inserted_rows}"),
        ExecuteResult::Update { affected_rows, job_id }
        | ExecuteResult::Delete { affected_rows, job_id } => {
            format!("affected_rows={affected_rows} job_id={job_id}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoundQuery, CreateTableRequest, Dialect, QueryOutcome, StoreError};
    use crate::testing::{RecordingStore, StoreCall};
    use crate::value::StoreValue;
    use async_trait::async_trait;
    use serde_json::{Map, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tablegate_core::Identifier;

    const POLICY: &str = r#"{
        "default": {"operations": ["SELECT"], "datasets": {"public": ["*"]}},
        "principals": {
            "writer@example.com": {
                "operations": ["SELECT", "CREATE_TABLE", "INSERT", "UPDATE", "DELETE"],
                "datasets": {"sales": ["orders"]}
            }
        }
    }"#;

    fn gateway_with(store: Arc<RecordingStore>, guardrails: GuardrailsConfig) -> ExecutionGateway {
        let policy = Arc::new(PolicyEngine::load(POLICY).unwrap());
        ExecutionGateway::new(policy, store, guardrails)
    }

    fn gateway(store: Arc<RecordingStore>) -> ExecutionGateway {
        gateway_with(store, GuardrailsConfig::default())
    }

    #[tokio::test]
    async fn test_select_normalizes_rows() {
        let store = Arc::new(RecordingStore::new().with_rows(vec![vec![
            ("id".to_string(), StoreValue::Int(1)),
            (
                "total".to_string(),
                StoreValue::Numeric("12.30".parse().unwrap()),
            ),
        ]]));
        let gw = gateway(store.clone());

        let result = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "SELECT", "dataset": "sales", "table": "orders"}),
            )
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "operation": "SELECT",
                "row_count": 1,
                "rows": [{"id": 1, "total": "12.30"}],
                "job_id": "recorded-1"
            })
        );
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_policy_denial_happens_before_store() {
        let store = Arc::new(RecordingStore::new());
        let gw = gateway(store.clone());

        let err = gw
            .execute_value(
                "reader@example.com",
                json!({"operation": "SELECT", "dataset": "sales", "table": "orders"}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Forbidden(_)));
        assert_eq!(
            err.to_string(),
            "Dataset 'sales' is not allowed for principal 'reader@example.com'"
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_happens_before_store() {
        let store = Arc::new(RecordingStore::new());
        let gw = gateway(store.clone());

        let err = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "UPDATE", "dataset": "sales", "table": "orders",
                       "set_values": {"status": "done"}}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_delete_blocked_before_store() {
        let store = Arc::new(RecordingStore::new());
        let gw = gateway(store.clone());

        let err = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "DELETE", "dataset": "sales", "table": "orders"}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Forbidden(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_delete_when_allowed() {
        let store = Arc::new(RecordingStore::new().with_affected_rows(12));
        let gw = gateway_with(
            store.clone(),
            GuardrailsConfig {
                max_select_limit: 1000,
                allow_full_table_delete: true,
            },
        );

        let result = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "DELETE", "dataset": "sales", "table": "orders"}),
            )
            .await
            .unwrap();

        assert_eq!(
            result,
            ExecuteResult::Delete {
                affected_rows: 12,
                job_id: "recorded-1".into()
            }
        );
        match &store.calls()[0] {
            StoreCall::Query(q) => assert_eq!(q.sql, "DELETE FROM `sales`.`orders`"),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_reports_zero_when_store_is_silent() {
        let store = Arc::new(RecordingStore::new());
        let gw = gateway(store.clone());

        let result = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "UPDATE", "dataset": "sales", "table": "orders",
                       "set_values": {"status": "done"}, "filters": {"id": 1}}),
            )
            .await
            .unwrap();

        assert_eq!(
            result,
            ExecuteResult::Update {
                affected_rows: 0,
                job_id: "recorded-1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_create_table_and_insert() {
        let store = Arc::new(RecordingStore::new());
        let gw = gateway(store.clone());

        let created = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "CREATE_TABLE", "dataset": "sales", "table": "orders",
                       "schema": [{"name": "id", "type": "INT64"}]}),
            )
            .await
            .unwrap();
        assert_eq!(
            created,
            ExecuteResult::CreateTable {
                table: "sales.orders".into(),
                created: true
            }
        );

        let inserted = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "INSERT", "dataset": "sales", "table": "orders",
                       "rows": [{"id": 1}, {"id": 2}, {"id": 3}]}),
            )
            .await
            .unwrap();
        assert_eq!(inserted, ExecuteResult::Insert { inserted_rows: 3 });

        let calls = store.calls();
        assert!(matches!(calls[0], StoreCall::CreateTable(_)));
        assert!(matches!(calls[1], StoreCall::Insert { rows: 3, .. }));
    }

    #[tokio::test]
    async fn test_store_failure_message_passes_through() {
        let store = Arc::new(
            RecordingStore::new().failing(StoreError::Insert(vec!["row 1: no such column: nme".into()])),
        );
        let gw = gateway(store);

        let err = gw
            .execute_value(
                "writer@example.com",
                json!({"operation": "INSERT", "dataset": "sales", "table": "orders",
                       "rows": [{"id": 1}, {"nme": "x"}]}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Execution(_)));
        assert_eq!(err.to_string(), "Insert errors: row 1: no such column: nme");
    }

    #[tokio::test]
    async fn test_ready_checks_store() {
        let store = Arc::new(RecordingStore::new());
        let gw = gateway(store.clone());
        gw.ready().await.unwrap();
        assert!(matches!(store.calls().as_slice(), [StoreCall::Probe]));

        let down = Arc::new(RecordingStore::new().failing(StoreError::Connection("refused".into())));
        let err = gateway(down).ready().await.unwrap_err();
        assert_eq!(err.to_string(), "Store connection failed: refused");
    }

    #[tokio::test]
    async fn test_default_rules_apply_to_unlisted_principals() {
        let store = Arc::new(RecordingStore::new());
        let gw = gateway(store.clone());

        gw.execute_value(
            "anonymous",
            json!({"operation": "SELECT", "dataset": "public", "table": "anything"}),
        )
        .await
        .unwrap();

        let err = gw
            .execute_value(
                "anonymous",
                json!({"operation": "INSERT", "dataset": "public", "table": "anything",
                       "rows": [{"a": 1}]}),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operation 'INSERT' is not allowed for principal 'anonymous'"
        );
    }

    #[tokio::test]
    async fn test_truncation_aliases_are_rejected_before_policy() {
        let prefix = "t".repeat(63);
        let policy = format!(
            r#"{{"default": {{"operations": ["SELECT"], "datasets": {{"sales": ["{prefix}_public"]}}}}}}"#
        );
        let store = Arc::new(RecordingStore::new().with_dialect(Dialect::Postgres));
        let gw = ExecutionGateway::new(
            Arc::new(PolicyEngine::load(&policy).unwrap()),
            store.clone(),
            GuardrailsConfig::default(),
        );

        for table in [format!("{prefix}_public"), format!("{prefix}_secret")] {
            let err = gw
                .execute_value(
                    "anyone@example.com",
                    json!({"operation": "SELECT", "dataset": "sales", "table": table}),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)), "{err:?}");
        }
        assert!(store.calls().is_empty());
    }

    /// Answers queries after `delay` and counts the ones that ran to the end.
    struct SlowStore {
        delay: Duration,
        finished: AtomicUsize,
    }

    impl SlowStore {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                finished: AtomicUsize::new(0),
            }
        }

        fn finished(&self) -> usize {
            self.finished.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Store for SlowStore {
        fn dialect(&self) -> Dialect {
            Dialect::Standard
        }

        async fn query(&self, _query: &BoundQuery) -> Result<QueryOutcome, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(QueryOutcome {
                job_id: "slow-1".to_string(),
                rows: Vec::new(),
                affected_rows: Some(1),
            })
        }

        async fn create_table(&self, request: &CreateTableRequest) -> Result<String, StoreError> {
            Ok(format!("{}.{}", request.dataset, request.table))
        }

        async fn insert_rows(
            &self,
            _dataset: &Identifier,
            _table: &Identifier,
            rows: &[Map<String, Value>],
        ) -> Result<u64, StoreError> {
            Ok(rows.len() as u64)
        }

        async fn probe(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn slow_gateway(store: Arc<SlowStore>) -> ExecutionGateway {
        let policy = Arc::new(PolicyEngine::load(POLICY).unwrap());
        ExecutionGateway::new(policy, store, GuardrailsConfig::default())
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_store_call() {
        let store = Arc::new(SlowStore::new(Duration::from_millis(100)));
        let gw = slow_gateway(store.clone());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            gw.execute_value(
                "writer@example.com",
                json!({"operation": "UPDATE", "dataset": "sales", "table": "orders",
                       "set_values": {"status": "shipped"}, "filters": {"id": 7}}),
            ),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(store.finished(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.finished(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_store_call_does_not_block_other_requests() {
        let store = Arc::new(SlowStore::new(Duration::from_millis(500)));
        let gw = Arc::new(slow_gateway(store.clone()));

        let slow = tokio::spawn({
            let gw = Arc::clone(&gw);
            async move {
                gw.execute_value(
                    "writer@example.com",
                    json!({"operation": "SELECT", "dataset": "sales", "table": "orders"}),
                )
                .await
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let ready = tokio::time::timeout(Duration::from_millis(100), gw.ready()).await;
        assert!(matches!(ready, Ok(Ok(()))));
        let created = tokio::time::timeout(
            Duration::from_millis(100),
            gw.execute_value(
                "writer@example.com",
                json!({"operation": "CREATE_TABLE", "dataset": "sales", "table": "orders",
                       "schema": [{"name": "id", "type": "INT64"}]}),
            ),
        )
        .await;
        assert!(matches!(created, Ok(Ok(_))), "{created:?}");
        assert_eq!(store.finished(), 0);

        let result = slow.await.unwrap().unwrap();
        assert!(matches!(result, ExecuteResult::Select { row_count: 0, .. }));
        assert_eq!(store.finished(), 1);
    }
}
