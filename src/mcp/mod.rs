// MCP (Model Context Protocol) JSON-RPC Server
//
// Pure Rust implementation of the MCP tool-server protocol over HTTP,
// exposing the analyze/save/execute tools via JSON-RPC 2.0.

mod handlers;
mod protocol;
mod server;

pub use handlers::ToolHandler;
pub use protocol::{error_codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams};
pub use server::{McpServer, McpServerConfig, ServerState, MCP_PROTOCOL_VERSION, SERVICE_NAME};
