//! Tool-call dispatcher.
//!
//! Each request is handled on its own: `tools/list` returns the static tool
//! descriptor, `tools/call` validates the arguments and runs them through the
//! [`ExecutionGateway`], and anything else is an unknown method. Every
//! response carries the request's `id` unchanged.

use serde_json::{Map, Value, json};
use tablegate_core::ExecuteArgs;
use tablegate_runtime::ExecutionGateway;
use tracing::debug;

use crate::protocol::{
    EXECUTION_ERROR, INVALID_PARAMS, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND,
};
use crate::tools::{TOOL_NAME, execute_tool};

/// Dispatches JSON-RPC requests to the gateway.
#[derive(Clone)]
pub struct McpServer {
    gateway: ExecutionGateway,
}

impl McpServer {
    pub fn new(gateway: ExecutionGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ExecutionGateway {
        &self.gateway
    }

    /// Handle one request on behalf of `principal`.
    pub async fn handle_request(&self, principal: &str, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id;
        debug!(principal, method = %request.method, "Handling JSON-RPC request");

        match request.method.as_str() {
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(principal, id, request.params).await,
            other => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {other}")),
        }
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": [execute_tool()] }))
    }

    async fn handle_call_tool(
        &self,
        principal: &str,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let mut params = match params {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        match params.get("name") {
            Some(Value::String(name)) if name == TOOL_NAME => {}
            Some(Value::String(name)) => {
                return JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown tool: {name}"));
            }
            other => {
                let name = other.map_or_else(|| "null".to_string(), Value::to_string);
                return JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown tool: {name}"));
            }
        }

        let arguments = params
            .remove("arguments")
            .unwrap_or_else(|| Value::Object(Map::new()));
        let args = match ExecuteArgs::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}")),
        };

        match self.gateway.execute(principal, args).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, EXECUTION_ERROR, e.to_string()),
            },
            Err(e) => JsonRpcResponse::error(id, EXECUTION_ERROR, e.to_string()),
        }
    }
}
