// Drives the full HTTP surface through the router without binding a
// socket: JSON-RPC dispatch, the tool envelope, the GET endpoints, and
// CORS. Uses a canned generator and a bash interpreter so no network
// or python installation is required.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use kabu::error::KabuError;
use kabu::executor::{ExecutionConfig, SubprocessRunner};
use kabu::generator::CodeGenerator;
use kabu::mcp::{McpServer, McpServerConfig, ServerState};
use kabu::pipeline::PublishOrchestrator;
use kabu::storage::{ArtifactPublisher, ScriptStore};
use serde_json::{json, Value};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct CannedGenerator;

impl CodeGenerator for CannedGenerator {
    fn generate<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, KabuError>> + Send + 'a>> {
        Box::pin(async move { Ok(format!("# {}\nimport yfinance as yf\n", query)) })
    }

    fn get_model_name(&self) -> &str {
        "canned-test-model"
    }

    fn get_timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}

struct TestPublisher;

impl ArtifactPublisher for TestPublisher {
    fn upload<'a>(
        &'a self,
        local_path: &'a Path,
        _key: Option<String>,
        _make_public: bool,
    ) -> Pin<Box<dyn Future<Output = Result<String, KabuError>> + Send + 'a>> {
        Box::pin(async move {
            let name = local_path.file_name().unwrap().to_str().unwrap();
            Ok(format!(
                "https://mybucket.s3.us-east-1.amazonaws.com/plots/test_{}",
                name
            ))
        })
    }
}

fn build_test_app(dir: &Path) -> Router {
    let store = ScriptStore::in_dir(dir);
    let runner = SubprocessRunner::new(
        ExecutionConfig::new("bash".to_string(), vec![]).with_working_dir(dir.to_path_buf()),
    );
    let orchestrator = PublishOrchestrator::new(store.clone(), Box::new(runner), dir.to_path_buf())
        .with_publisher(Arc::new(TestPublisher));
    let state = ServerState::new(Box::new(CannedGenerator), store, orchestrator);

    McpServer::new(McpServerConfig::default(), state).router()
}

async fn get(app: Router, path: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn post_raw(app: Router, body: String) -> Value {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn post_rpc(app: Router, payload: Value) -> Value {
    post_raw(app, payload.to_string()).await
}

async fn call_tool(app: Router, name: &str, arguments: Value) -> Value {
    post_rpc(
        app,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }),
    )
    .await
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "kabu-mcp-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_initialize_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_rpc(
        app,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;

    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    assert!(body["result"]["capabilities"]["tools"].is_object());
    assert_eq!(body["result"]["serverInfo"]["name"], "kabu-mcp-server");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_initialized_notification_is_acknowledged() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_rpc(
        app,
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;

    assert!(body.get("error").is_none());
    assert!(body.as_object().unwrap().contains_key("result"));
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_tools_list_via_post() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_rpc(
        app,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;

    let tools = body["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["analyze_stock", "save_code", "execute_code"]);
}

#[tokio::test]
async fn test_tools_list_via_get() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let response = get(app, "/mcp/tools/list").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 3);
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["query"]));
    assert_eq!(tools[1]["inputSchema"]["required"], json!(["code"]));
    assert_eq!(tools[2]["inputSchema"]["required"], json!([]));
}

#[tokio::test]
async fn test_analyze_stock_returns_generated_script() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = call_tool(
        app,
        "analyze_stock",
        json!({"query": "plot TSLA closes for the last 6 months"}),
    )
    .await;

    let result = &body["result"];
    assert_eq!(result["isError"], false);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("plot TSLA closes for the last 6 months"));
    assert!(text.contains("import yfinance"));
}

#[tokio::test]
async fn test_save_code_persists_to_workdir() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = call_tool(app, "save_code", json!({"code": "echo hello"})).await;

    let result = &body["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["text"], "Code saved to stock_analysis.py");

    let saved = std::fs::read_to_string(dir.path().join("stock_analysis.py")).unwrap();
    assert_eq!(saved, "echo hello");
}

#[tokio::test]
async fn test_save_then_execute_publishes_plots() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let saved = call_tool(
        app.clone(),
        "save_code",
        json!({"code": "printf 'png' > chart1.png\n"}),
    )
    .await;
    assert_eq!(saved["result"]["isError"], false);

    let body = call_tool(app, "execute_code", json!({})).await;

    let result = &body["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(
        result["content"][0]["text"],
        "executed successfully\n- chart1.png: https://mybucket.s3.us-east-1.amazonaws.com/plots/test_chart1.png"
    );
}

#[tokio::test]
async fn test_execute_code_without_script_is_report_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = call_tool(app, "execute_code", json!({})).await;

    let result = &body["result"];
    assert_eq!(result["isError"], false);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Error: No script has been saved yet"));
}

#[tokio::test]
async fn test_blank_query_is_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = call_tool(app, "analyze_stock", json!({"query": "   "})).await;

    let result = &body["result"];
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Error: Invalid arguments"));
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_raw(app, "{not valid json".to_string()).await;

    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_non_object_request_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_rpc(app, json!([1, 2, 3])).await;

    assert_eq!(body["error"]["code"], -32600);
}

#[tokio::test]
async fn test_wrong_jsonrpc_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_rpc(
        app,
        json!({"jsonrpc": "1.0", "id": 1, "method": "tools/list"}),
    )
    .await;

    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_unknown_method() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_rpc(
        app,
        json!({"jsonrpc": "2.0", "id": 7, "method": "tools/write"}),
    )
    .await;

    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["error"]["data"]["method"], "tools/write");
}

#[tokio::test]
async fn test_tool_call_without_name_is_invalid_params() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = post_rpc(
        app,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "arguments": {} }
        }),
    )
    .await;

    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn test_unknown_tool_name() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let body = call_tool(app, "delete_everything", json!({})).await;

    assert_eq!(body["error"]["code"], -32601);
}

#[tokio::test]
async fn test_cors_preflight_allows_browser_clients() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(dir.path());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/mcp")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
}
