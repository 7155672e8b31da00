//! The single tool this server exposes.

use serde_json::{Value, json};
use tablegate_core::{FieldType, Operation};

use crate::protocol::ToolDefinition;

pub const TOOL_NAME: &str = "execute-operation";
pub const TOOL_DESCRIPTION: &str = "Run a controlled table operation";

/// Descriptor for `execute-operation`. Its input schema mirrors the operation
/// document accepted by both surfaces.
pub fn execute_tool() -> ToolDefinition {
    ToolDefinition {
        name: TOOL_NAME.to_string(),
        description: TOOL_DESCRIPTION.to_string(),
        input_schema: input_schema(),
    }
}

fn input_schema() -> Value {
    let operations: Vec<&str> = Operation::ALL.iter().map(Operation::as_str).collect();
    let field_types: Vec<&str> = FieldType::ALL.iter().map(FieldType::as_str).collect();
    let identifier = json!({"type": "string", "pattern": "^[A-Za-z_][A-Za-z0-9_]{0,127}$"});

    json!({
        "type": "object",
        "properties": {
            "operation": {"type": "string", "enum": operations},
            "dataset": identifier,
            "table": identifier,
            "columns": {"type": "array", "items": identifier},
            "filters": {
                "type": "object",
                "description": "Equality filters, column -> value. Use {\"$numeric\": \"1.50\"}, {\"$date\": \"2024-01-31\"} or {\"$timestamp\": \"2024-01-31T12:00:00Z\"} for typed literals."
            },
            "limit": {"type": "integer", "default": 100},
            "schema": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": identifier,
                        "type": {"type": "string", "enum": field_types},
                        "mode": {"type": "string", "enum": ["NULLABLE", "REQUIRED", "REPEATED"]}
                    },
                    "required": ["name", "type"]
                }
            },
            "if_not_exists": {"type": "boolean", "default": true},
            "rows": {"type": "array", "items": {"type": "object"}},
            "set_values": {"type": "object"}
        },
        "required": ["operation", "dataset", "table"],
        "additionalProperties": false
    })
}
