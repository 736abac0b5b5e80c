// MCP Server
//
// This module implements the MCP (Model Context Protocol) JSON-RPC server
// using axum for HTTP handling.

use super::handlers::ToolHandler;
use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::error::KabuError;
use crate::generator::CodeGenerator;
use crate::pipeline::PublishOrchestrator;
use crate::storage::ScriptStore;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// MCP protocol revision implemented by this server
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Service name reported by the initialize handshake and /health
pub const SERVICE_NAME: &str = "kabu-mcp-server";

/// Shared state behind the MCP routes
pub struct ServerState {
    /// Natural-language-to-script collaborator
    pub generator: Box<dyn CodeGenerator>,
    /// On-disk script slot shared by save_code and the pipeline
    pub store: ScriptStore,
    /// Run-and-publish pipeline; the mutex serializes execute_code calls
    pub orchestrator: Mutex<PublishOrchestrator>,
}

impl ServerState {
    pub fn new(
        generator: Box<dyn CodeGenerator>,
        store: ScriptStore,
        orchestrator: PublishOrchestrator,
    ) -> Self {
        Self {
            generator,
            store,
            orchestrator: Mutex::new(orchestrator),
        }
    }
}

/// MCP Server configuration
#[derive(Clone, Debug)]
pub struct McpServerConfig {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Whether to enable CORS for all origins
    pub enable_cors: bool,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            enable_cors: true,
        }
    }
}

/// MCP Server
pub struct McpServer {
    config: McpServerConfig,
    state: Arc<ServerState>,
}

impl McpServer {
    /// Create a new MCP server instance
    pub fn new(config: McpServerConfig, state: ServerState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Build the router over the shared state
    ///
    /// Public so tests can drive the endpoints without binding a socket.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/mcp", post(json_rpc_handler))
            .route("/mcp/tools/list", get(list_tools_handler))
            .route("/health", get(health_check_handler))
            .with_state(self.state.clone());

        if self.config.enable_cors {
            router.layer(tower_http::cors::CorsLayer::very_permissive())
        } else {
            router
        }
    }

    /// Run the MCP server
    ///
    /// Binds the configured address and serves until shut down.
    pub async fn serve(self) -> Result<(), KabuError> {
        let bind_address = self.config.bind_address;
        let router = self.router();

        info!("Starting MCP server on {}", bind_address);

        let listener = tokio::net::TcpListener::bind(bind_address).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

/// JSON-RPC request handler
///
/// Takes the body as a raw string so malformed JSON maps to a proper
/// JSON-RPC parse error instead of a bare HTTP 400.
async fn json_rpc_handler(
    State(state): State<Arc<ServerState>>,
    body: String,
) -> Json<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str::<Value>(&body) {
        Ok(value) => match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed JSON-RPC request: {}", e);
                return Json(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::invalid_request(format!("Invalid request object: {}", e)),
                ));
            }
        },
        Err(_) => {
            warn!("Failed to parse request body as JSON");
            return Json(JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::parse_error("Invalid JSON"),
            ));
        }
    };

    let id = request.id.clone();
    debug!("Received JSON-RPC request: method={}", request.method);

    if let Err(e) = request.validate() {
        warn!("Invalid JSON-RPC request: {}", e);
        return Json(JsonRpcResponse::error(id, e));
    }

    let result = match request.method.as_str() {
        "initialize" => Ok(initialize_result()),
        "notifications/initialized" => Ok(Value::Null),
        "tools/list" => Ok(list_tools_json(&ToolHandler::all())),
        "tools/call" => handle_tool_call(&state, request).await,
        _ => Err(JsonRpcError::method_not_found(request.method.clone())),
    };

    match &result {
        Ok(_) => debug!("Request completed successfully"),
        Err(e) => warn!("Request failed: {}", e),
    }

    Json(JsonRpcResponse::from_result(id, result))
}

/// Result payload for the MCP initialize handshake
fn initialize_result() -> Value {
    serde_json::json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Handle tool call requests
///
/// MCP expects `{ content: [{ type: "text", text }], isError }`; tool
/// failures are data inside that envelope, never JSON-RPC errors.
pub async fn handle_tool_call(
    state: &ServerState,
    request: JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let tool_call = request.extract_tool_call()?;
    debug!("Tool call: name={}", tool_call.name);

    let handlers = ToolHandler::all();
    let handler = handlers
        .iter()
        .find(|h| h.name() == tool_call.name)
        .ok_or_else(|| JsonRpcError::method_not_found(tool_call.name.clone()))?;

    match handler.execute(state, tool_call.arguments).await {
        Ok(text) => Ok(text_content(text, false)),
        Err(e) => {
            warn!("Tool {} failed: {}", tool_call.name, e);
            Ok(text_content(format!("Error: {}", e), true))
        }
    }
}

fn text_content(text: String, is_error: bool) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ],
        "isError": is_error
    })
}

/// List tools as JSON
pub fn list_tools_json(handlers: &[ToolHandler]) -> Value {
    let tools: Vec<_> = handlers
        .iter()
        .map(|handler| {
            serde_json::json!({
                "name": handler.name(),
                "description": handler.description(),
                "inputSchema": handler.argument_schema()
            })
        })
        .collect();

    serde_json::json!({ "tools": tools })
}

/// List tools handler
async fn list_tools_handler() -> Json<Value> {
    Json(list_tools_json(&ToolHandler::all()))
}

/// Health check handler
async fn health_check_handler() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
