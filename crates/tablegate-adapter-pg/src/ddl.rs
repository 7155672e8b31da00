//! Table definitions rendered as PostgreSQL DDL.

use tablegate_core::{FieldMode, FieldType, TableField};
use tablegate_runtime::{CreateTableRequest, Dialect};

/// Column type for a declared field type.
pub fn pg_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "TEXT",
        FieldType::Bytes => "BYTEA",
        FieldType::Int64 => "BIGINT",
        FieldType::Float64 => "DOUBLE PRECISION",
        FieldType::Numeric | FieldType::Bignumeric => "NUMERIC",
        FieldType::Bool => "BOOLEAN",
        FieldType::Timestamp => "TIMESTAMPTZ",
        FieldType::Date => "DATE",
        FieldType::Time => "TIME",
        FieldType::Datetime => "TIMESTAMP",
        FieldType::Json => "JSONB",
    }
}

fn column_def(field: &TableField) -> String {
    let name = Dialect::Postgres.quote_ident(&field.name);
    let ty = pg_type(field.field_type);
    match field.mode {
        FieldMode::Nullable => format!("{name} {ty}"),
        FieldMode::Required => format!("{name} {ty} NOT NULL"),
        FieldMode::Repeated => format!("{name} {ty}[]"),
    }
}

pub fn create_table_sql(request: &CreateTableRequest) -> String {
    let columns = request
        .fields
        .iter()
        .map(column_def)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE {}{} ({columns})",
        if request.if_not_exists { "IF NOT EXISTS " } else { "" },
        Dialect::Postgres.table_ref(&request.dataset, &request.table),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegate_core::Identifier;

    fn ident(s: &str) -> Identifier {
        Identifier::parse(s, "test").unwrap()
    }

    #[test]
    fn test_create_table_sql() {
        let request = CreateTableRequest {
            dataset: ident("sales"),
            table: ident("orders"),
            fields: vec![
                TableField::new(ident("id"), FieldType::Int64, FieldMode::Required),
                TableField::new(ident("tags"), FieldType::String, FieldMode::Repeated),
                TableField::new(ident("placed_at"), FieldType::Timestamp, FieldMode::Nullable),
            ],
            if_not_exists: true,
        };
        assert_eq!(
            create_table_sql(&request),
            r#"CREATE TABLE IF NOT EXISTS "sales"."orders" ("id" BIGINT NOT NULL, "tags" TEXT[], "placed_at" TIMESTAMPTZ)"#
        );

        let strict = CreateTableRequest {
            if_not_exists: false,
            ..request
        };
        assert!(create_table_sql(&strict).starts_with(r#"CREATE TABLE "sales"."orders" ("#));
    }

    #[test]
    fn test_every_field_type_maps() {
        for ty in FieldType::ALL {
            assert!(!pg_type(ty).is_empty());
        }
        assert_eq!(pg_type(FieldType::Bignumeric), "NUMERIC");
        assert_eq!(pg_type(FieldType::Datetime), "TIMESTAMP");
        assert_eq!(pg_type(FieldType::Json), "JSONB");
    }
}
