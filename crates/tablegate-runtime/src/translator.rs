//! Operation-to-query translation.
//!
//! Turns a validated [`ExecuteArgs`] into a [`Plan`]: the exact store call to
//! make. Only quoted identifiers reach query text; every caller-supplied
//! value is bound as a typed parameter. Parameter names live in disjoint
//! per-clause namespaces so they can never collide:
//!
//! | clause               | names         |
//! |----------------------|---------------|
//! | SELECT filters       | `f0`, `f1`, … |
//! | SELECT limit         | `limit`       |
//! | UPDATE set values    | `s0`, `s1`, … |
//! | UPDATE filters       | `w0`, `w1`, … |
//! | DELETE filters       | `d0`, `d1`, … |

use serde_json::{Map, Value};
use tablegate_core::{
    ExecuteArgs, GuardrailsConfig, Identifier, Operation, ParamValue, ValidationError,
};

use crate::error::GatewayError;
use crate::store::{BoundQuery, CreateTableRequest, Dialect, QueryParameter};

/// The store call an operation translates to.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// SELECT, UPDATE or DELETE.
    Query {
        operation: Operation,
        query: BoundQuery,
    },
    CreateTable(CreateTableRequest),
    /// Rows go to the store's structured insert path; no query text.
    Insert {
        dataset: Identifier,
        table: Identifier,
        rows: Vec<Map<String, Value>>,
    },
}

/// Builds plans for one store dialect under fixed guardrails.
#[derive(Debug, Clone, Copy)]
pub struct OperationTranslator {
    dialect: Dialect,
    guardrails: GuardrailsConfig,
}

impl OperationTranslator {
    pub fn new(dialect: Dialect, guardrails: GuardrailsConfig) -> Self {
        Self {
            dialect,
            guardrails,
        }
    }

    pub fn guardrails(&self) -> &GuardrailsConfig {
        &self.guardrails
    }

    /// Reject names the dialect would truncate.
    ///
    /// Covers the dataset, the table and every column name the operation
    /// carries, including INSERT row keys.
    pub fn check_identifiers(&self, args: &ExecuteArgs) -> Result<(), ValidationError> {
        let max = self.dialect.max_identifier_len();
        let check = |label: &str, name: &str| {
            if name.len() > max {
                Err(ValidationError::IdentifierTooLong {
                    label: label.to_string(),
                    name: name.to_string(),
                    max,
                })
            } else {
                Ok(())
            }
        };

        check("dataset", args.dataset.as_str())?;
        check("table", args.table.as_str())?;
        for column in args.columns.iter().flatten() {
            check("column", column.as_str())?;
        }
        for (column, _) in args.filters.iter().chain(&args.set_values) {
            check("column", column.as_str())?;
        }
        for field in &args.schema {
            check("field", field.name.as_str())?;
        }
        for key in args.rows.iter().flat_map(|row| row.keys()) {
            check("column", key)?;
        }
        Ok(())
    }

    /// Translate `args` into a plan. Consumes the arguments.
    pub fn translate(&self, args: ExecuteArgs) -> Result<Plan, GatewayError> {
        match args.operation {
            Operation::Select => Ok(self.select(args)),
            Operation::CreateTable => Ok(Plan::CreateTable(CreateTableRequest {
                dataset: args.dataset,
                table: args.table,
                fields: args.schema,
                if_not_exists: args.if_not_exists,
            })),
            Operation::Insert => Ok(Plan::Insert {
                dataset: args.dataset,
                table: args.table,
                rows: args.rows,
            }),
            Operation::Update => Ok(self.update(args)),
            Operation::Delete => self.delete(args),
        }
    }

    fn select(&self, args: ExecuteArgs) -> Plan {
        let mut builder = QueryBuilder::new(self.dialect);
        let projection = match &args.columns {
            Some(columns) => columns
                .iter()
                .map(|c| self.dialect.quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            None => "*".to_string(),
        };

        let mut sql = format!(
            "SELECT {projection} FROM {}",
            self.dialect.table_ref(&args.dataset, &args.table)
        );
        if let Some(predicate) = builder.predicate(args.filters, "f") {
            sql.push_str(&format!(" WHERE {predicate}"));
        }
        let limit = self.guardrails.clamp_limit(args.limit);
        let placeholder = builder.bind("limit".to_string(), ParamValue::Int64(limit));
        sql.push_str(&format!(" LIMIT {placeholder}"));

        Plan::Query {
            operation: Operation::Select,
            query: builder.finish(sql, true),
        }
    }

    fn update(&self, args: ExecuteArgs) -> Plan {
        let mut builder = QueryBuilder::new(self.dialect);
        let assignments = args
            .set_values
            .into_iter()
            .enumerate()
            .map(|(i, (column, value))| {
                let placeholder = builder.bind(format!("s{i}"), value);
                format!("{} = {placeholder}", self.dialect.quote_ident(&column))
            })
            .collect::<Vec<_>>()
            .join(", ");

        // ExecuteArgs guarantees non-empty filters for UPDATE.
        let predicate = builder.predicate(args.filters, "w").unwrap_or_default();
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {predicate}",
            self.dialect.table_ref(&args.dataset, &args.table)
        );

        Plan::Query {
            operation: Operation::Update,
            query: builder.finish(sql, false),
        }
    }

    fn delete(&self, args: ExecuteArgs) -> Result<Plan, GatewayError> {
        if !args.has_filters() && !self.guardrails.allow_full_table_delete {
            return Err(GatewayError::Forbidden(
                "DELETE without filters is blocked by policy".to_string(),
            ));
        }

        let mut builder = QueryBuilder::new(self.dialect);
        let mut sql = format!(
            "DELETE FROM {}",
            self.dialect.table_ref(&args.dataset, &args.table)
        );
        if let Some(predicate) = builder.predicate(args.filters, "d") {
            sql.push_str(&format!(" WHERE {predicate}"));
        }

        Ok(Plan::Query {
            operation: Operation::Delete,
            query: builder.finish(sql, false),
        })
    }
}

/// Accumulates parameters and hands out placeholders in bind order.
struct QueryBuilder {
    dialect: Dialect,
    params: Vec<QueryParameter>,
}

impl QueryBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, name: String, value: ParamValue) -> String {
        let placeholder = self.dialect.placeholder(&name, self.params.len() + 1);
        self.params.push(QueryParameter::new(name, value));
        placeholder
    }

    /// `AND`-joined equality predicate, or `None` when there are no filters.
    fn predicate(&mut self, filters: Vec<(Identifier, ParamValue)>, prefix: &str) -> Option<String> {
        if filters.is_empty() {
            return None;
        }
        let clauses = filters
            .into_iter()
            .enumerate()
            .map(|(i, (column, value))| {
                let placeholder = self.bind(format!("{prefix}{i}"), value);
                format!("{} = {placeholder}", self.dialect.quote_ident(&column))
            })
            .collect::<Vec<_>>();
        Some(clauses.join(" AND "))
    }

    fn finish(self, sql: String, returns_rows: bool) -> BoundQuery {
        BoundQuery {
            sql,
            params: self.params,
            returns_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tablegate_core::ParamType;

    fn args(value: Value) -> ExecuteArgs {
        ExecuteArgs::from_value(value).unwrap()
    }

    fn translator() -> OperationTranslator {
        OperationTranslator::new(Dialect::Standard, GuardrailsConfig::default())
    }

    fn query(plan: Plan) -> BoundQuery {
        match plan {
            Plan::Query { query, .. } => query,
            other => panic!("expected a query plan, got {other:?}"),
        }
    }

    fn signature(q: &BoundQuery) -> Vec<(String, ParamType)> {
        q.params
            .iter()
            .map(|p| (p.name.clone(), p.param_type()))
            .collect()
    }

    #[test]
    fn test_select_all_columns_with_filters() {
        let plan = translator()
            .translate(args(json!({
                "operation": "SELECT",
                "dataset": "sales",
                "table": "orders",
                "filters": {"paid": true, "status": "open"},
                "limit": 10
            })))
            .unwrap();
        let q = query(plan);

        assert_eq!(
            q.sql,
            "SELECT * FROM `sales`.`orders` WHERE `paid` = @f0 AND `status` = @f1 LIMIT @limit"
        );
        assert_eq!(
            signature(&q),
            vec![
                ("f0".to_string(), ParamType::Bool),
                ("f1".to_string(), ParamType::String),
                ("limit".to_string(), ParamType::Int64),
            ]
        );
        assert_eq!(q.param("limit").unwrap().value, ParamValue::Int64(10));
        assert!(q.returns_rows);
    }

    #[test]
    fn test_select_explicit_columns() {
        let q = query(
            translator()
                .translate(args(json!({
                    "operation": "SELECT", "dataset": "sales", "table": "orders",
                    "columns": ["id", "total"]
                })))
                .unwrap(),
        );
        assert_eq!(q.sql, "SELECT `id`, `total` FROM `sales`.`orders` LIMIT @limit");
    }

    #[test]
    fn test_select_limit_clamping() {
        let cases = [
            (json!(5000), 1000),
            (json!(0), 1),
            (json!(-3), 1),
            (json!(250), 250),
            (json!(10.0), 10),
            (json!(u64::MAX), 1000),
            (json!(1e30), 1000),
            (json!(-1e30), 1),
        ];
        for (requested, expected) in cases {
            let q = query(
                translator()
                    .translate(args(json!({
                        "operation": "SELECT", "dataset": "sales", "table": "orders",
                        "limit": requested
                    })))
                    .unwrap(),
            );
            assert_eq!(q.param("limit").unwrap().value, ParamValue::Int64(expected));
        }

        let q = query(
            translator()
                .translate(args(json!({
                    "operation": "SELECT", "dataset": "sales", "table": "orders"
                })))
                .unwrap(),
        );
        assert_eq!(q.param("limit").unwrap().value, ParamValue::Int64(100));

        let small = OperationTranslator::new(
            Dialect::Standard,
            GuardrailsConfig {
                max_select_limit: 20,
                allow_full_table_delete: false,
            },
        );
        let q = query(
            small
                .translate(args(json!({
                    "operation": "SELECT", "dataset": "sales", "table": "orders"
                })))
                .unwrap(),
        );
        assert_eq!(q.param("limit").unwrap().value, ParamValue::Int64(20));
    }

    #[test]
    fn test_update_uses_disjoint_names() {
        let q = query(
            translator()
                .translate(args(json!({
                    "operation": "UPDATE",
                    "dataset": "sales",
                    "table": "orders",
                    "set_values": {"status": "done", "total": {"$numeric": "10.50"}},
                    "filters": {"id": 7}
                })))
                .unwrap(),
        );
        assert_eq!(
            q.sql,
            "UPDATE `sales`.`orders` SET `status` = @s0, `total` = @s1 WHERE `id` = @w0"
        );
        assert_eq!(
            signature(&q),
            vec![
                ("s0".to_string(), ParamType::String),
                ("s1".to_string(), ParamType::Numeric),
                ("w0".to_string(), ParamType::Int64),
            ]
        );
    }

    #[test]
    fn test_delete_with_filters() {
        let q = query(
            translator()
                .translate(args(json!({
                    "operation": "DELETE", "dataset": "sales", "table": "orders",
                    "filters": {"day": {"$date": "2024-01-31"}, "status": "void"}
                })))
                .unwrap(),
        );
        assert_eq!(
            q.sql,
            "DELETE FROM `sales`.`orders` WHERE `day` = @d0 AND `status` = @d1"
        );
        assert_eq!(q.params[0].param_type(), ParamType::Date);
    }

    #[test]
    fn test_unfiltered_delete_is_blocked_by_default() {
        let err = translator()
            .translate(args(json!({
                "operation": "DELETE", "dataset": "sales", "table": "orders"
            })))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
        assert_eq!(err.to_string(), "DELETE without filters is blocked by policy");
    }

    #[test]
    fn test_unfiltered_delete_when_allowed() {
        let permissive = OperationTranslator::new(
            Dialect::Standard,
            GuardrailsConfig {
                max_select_limit: 1000,
                allow_full_table_delete: true,
            },
        );
        let q = query(
            permissive
                .translate(args(json!({
                    "operation": "DELETE", "dataset": "sales", "table": "orders"
                })))
                .unwrap(),
        );
        assert_eq!(q.sql, "DELETE FROM `sales`.`orders`");
        assert!(q.params.is_empty());
        assert!(!q.returns_rows);
    }

    #[test]
    fn test_postgres_placeholders_follow_bind_order() {
        let pg = OperationTranslator::new(Dialect::Postgres, GuardrailsConfig::default());
        let q = query(
            pg.translate(args(json!({
                "operation": "UPDATE",
                "dataset": "sales",
                "table": "orders",
                "set_values": {"status": "done"},
                "filters": {"id": 7, "region": "eu"}
            })))
            .unwrap(),
        );
        assert_eq!(
            q.sql,
            r#"UPDATE "sales"."orders" SET "status" = $1 WHERE "id" = $2 AND "region" = $3"#
        );

        let q = query(
            pg.translate(args(json!({
                "operation": "SELECT", "dataset": "sales", "table": "orders",
                "filters": {"id": 7}
            })))
            .unwrap(),
        );
        assert_eq!(
            q.sql,
            r#"SELECT * FROM "sales"."orders" WHERE "id" = $1 LIMIT $2"#
        );
    }

    #[test]
    fn test_create_table_and_insert_plans() {
        let plan = translator()
            .translate(args(json!({
                "operation": "CREATE_TABLE", "dataset": "sales", "table": "orders",
                "schema": [{"name": "id", "type": "INT64", "mode": "REQUIRED"}]
            })))
            .unwrap();
        match plan {
            Plan::CreateTable(req) => {
                assert_eq!(req.table.as_str(), "orders");
                assert_eq!(req.fields.len(), 1);
                assert!(req.if_not_exists);
            }
            other => panic!("unexpected plan {other:?}"),
        }

        let plan = translator()
            .translate(args(json!({
                "operation": "INSERT", "dataset": "sales", "table": "orders",
                "rows": [{"id": 1}, {"id": 2}]
            })))
            .unwrap();
        match plan {
            Plan::Insert { rows, .. } => assert_eq!(rows.len(), 2),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_values_never_reach_query_text() {
        let hostile = "x'; DROP TABLE orders; --";
        let q = query(
            translator()
                .translate(args(json!({
                    "operation": "SELECT", "dataset": "sales", "table": "orders",
                    "filters": {"status": hostile}
                })))
                .unwrap(),
        );
        assert!(!q.sql.contains(hostile));
        assert_eq!(q.params[0].value, ParamValue::String(hostile.to_string()));
    }

    #[test]
    fn test_postgres_rejects_names_it_would_truncate() {
        let pg = OperationTranslator::new(Dialect::Postgres, GuardrailsConfig::default());
        let at_limit = "t".repeat(63);
        let over_limit = "t".repeat(64);

        let ok = args(json!({"operation": "SELECT", "dataset": "sales", "table": at_limit}));
        assert!(pg.check_identifiers(&ok).is_ok());

        let long_table = args(json!({"operation": "SELECT", "dataset": "sales", "table": over_limit}));
        assert_eq!(
            pg.check_identifiers(&long_table),
            Err(ValidationError::IdentifierTooLong {
                label: "table".to_string(),
                name: over_limit.clone(),
                max: 63,
            })
        );

        let long_filter = args(json!({"operation": "DELETE", "dataset": "sales", "table": "orders",
                                      "filters": {over_limit.clone(): 1}}));
        assert!(pg.check_identifiers(&long_filter).is_err());

        let long_row_key = args(json!({"operation": "INSERT", "dataset": "sales", "table": "orders",
                                       "rows": [{"id": 1}, {over_limit.clone(): 2}]}));
        assert!(pg.check_identifiers(&long_row_key).is_err());

        // The standard dialect keeps the full identifier range.
        assert!(translator().check_identifiers(&long_table).is_ok());
    }
}
