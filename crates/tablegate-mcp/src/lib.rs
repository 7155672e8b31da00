//! # tablegate-mcp
//!
//! The two surfaces callers reach Tablegate through:
//!
//! - a JSON-RPC tool-call surface exposing one tool, `execute-operation`
//!   ([`McpServer`])
//! - a plain request/response surface at `POST /v1/execute`
//!
//! Both run the same [`tablegate_runtime::ExecutionGateway`] and differ only in
//! how outcomes are rendered. [`http_transport::create_router`] mounts both,
//! plus the liveness, readiness and keepalive endpoints.

pub mod error;
pub mod http_transport;
pub mod identity;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::{ApiError, McpError};
pub use http_transport::{HttpTransportState, create_router, serve};
pub use identity::{AuthError, IdentityProvider};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolDefinition};
pub use server::McpServer;
pub use tools::{TOOL_NAME, execute_tool};
