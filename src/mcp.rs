//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Implements the [MCP specification](https://spec.modelcontextprotocol.io/)
//! for a single [`Adapter`]. Two transports are supported:
//!
//! - **stdio** — JSON-RPC 2.0 requests from stdin (one per line), responses
//!   to stdout. The default; designed to be launched by an AI agent host.
//! - **HTTP** — `POST /mcp` carrying one JSON-RPC request per call, for MCP
//!   clients that speak the HTTP transport. `GET /health` is an
//!   unauthenticated liveness probe.
//!
//! ## Supported methods
//!
//! | Method       | Description                      |
//! |--------------|----------------------------------|
//! | `initialize` | Handshake, returns capabilities  |
//! | `tools/list` | List available tool definitions  |
//! | `tools/call` | Execute a tool and return result |
//! | `ping`       | Liveness check                   |
//!
//! Notifications (`notifications/initialized`, `notifications/cancelled`)
//! are acknowledged silently.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::tools::Adapter;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Run the MCP server on stdio, processing JSON-RPC requests until EOF.
pub async fn run_stdio(adapter: Arc<dyn Adapter>) {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    info!(adapter = adapter.name(), "serving MCP on stdio");

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(response) = handle_raw(trimmed, &adapter).await {
            write_line(&mut stdout, &response).await;
        }
    }
}

/// Serve the same JSON-RPC surface over HTTP.
pub async fn serve_http(adapter: Arc<dyn Adapter>, addr: SocketAddr) {
    let app = Router::new()
        .route("/mcp", post(http_rpc))
        .route("/health", get(http_health))
        .layer(TraceLayer::new_for_http())
        .with_state(adapter.clone());

    let listener = TcpListener::bind(addr).await.expect("Failed to bind");
    info!(adapter = adapter.name(), %addr, "serving MCP over HTTP");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("shutting down");
}

async fn http_rpc(
    State(adapter): State<Arc<dyn Adapter>>,
    Json(request): Json<Value>,
) -> Response {
    match handle_request(&request, &adapter).await {
        Some(response) => Json(response).into_response(),
        // Notifications have no response body
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn http_health(State(adapter): State<Arc<dyn Adapter>>) -> Json<Value> {
    Json(json!({ "status": "ok", "adapter": adapter.name(), "version": SERVER_VERSION }))
}

/// Parse one raw JSON-RPC message and handle it. Returns `None` when no
/// response is owed (notifications).
async fn handle_raw(raw: &str, adapter: &Arc<dyn Adapter>) -> Option<Value> {
    let request: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return Some(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": format!("Parse error: {e}") }
            }));
        }
    };
    handle_request(&request, adapter).await
}

/// Dispatch one parsed JSON-RPC request.
async fn handle_request(request: &Value, adapter: &Arc<dyn Adapter>) -> Option<Value> {
    let id = request.get("id").cloned();
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    // Notifications (no id) are acknowledged silently
    if id.is_none() {
        match method {
            "notifications/initialized" | "notifications/cancelled" => {}
            _ => warn!("unknown notification: {method}"),
        }
        return None;
    }

    let response = match method {
        "initialize" => handle_initialize(adapter),
        "tools/list" => json!({
            "jsonrpc": "2.0",
            "result": { "tools": adapter.tool_definitions() }
        }),
        "tools/call" => handle_tools_call(request, adapter).await,
        "ping" => json!({ "jsonrpc": "2.0", "result": {} }),
        _ => json!({
            "jsonrpc": "2.0",
            "error": {
                "code": -32601,
                "message": format!("Method not found: {method}")
            }
        }),
    };

    Some(inject_id(response, id))
}

/// Handle `initialize` — protocol version, capabilities, and server info.
fn handle_initialize(adapter: &Arc<dyn Adapter>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": format!("{}-mcp-server", adapter.name()),
                "version": SERVER_VERSION
            }
        }
    })
}

/// Handle `tools/call` — dispatch to the adapter's tool handler.
async fn handle_tools_call(request: &Value, adapter: &Arc<dyn Adapter>) -> Value {
    let params = request.get("params").cloned().unwrap_or(json!({}));
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    let result = adapter.call_tool(name, &args).await;

    let mut response_result = json!({ "content": result.content });
    if result.is_error {
        response_result["isError"] = json!(true);
    }

    json!({ "jsonrpc": "2.0", "result": response_result })
}

/// Inject the request `id` into a response object.
fn inject_id(mut response: Value, id: Option<Value>) -> Value {
    if let Some(id) = id {
        response["id"] = id;
    }
    response
}

/// Write a JSON-RPC response to stdout (one line, flushed immediately).
async fn write_line(stdout: &mut tokio::io::Stdout, response: &Value) {
    let mut output = serde_json::to_string(response).unwrap_or_default();
    output.push('\n');
    if let Err(e) = stdout.write_all(output.as_bytes()).await {
        error!("stdout write error: {e}");
    }
    if let Err(e) = stdout.flush().await {
        error!("stdout flush error: {e}");
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to register SIGTERM");
        tokio::select! {
            _ = ctrl_c => info!("received SIGINT"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolResult;
    use async_trait::async_trait;

    struct StubAdapter;

    #[async_trait]
    impl Adapter for StubAdapter {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn tool_definitions(&self) -> Vec<Value> {
            vec![json!({
                "name": "echo",
                "description": "Echo the payload back.",
                "inputSchema": { "type": "object", "properties": {} }
            })]
        }

        async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
            match name {
                "echo" => ToolResult::success(args.clone()),
                _ => ToolResult::unknown_tool(name),
            }
        }
    }

    fn adapter() -> Arc<dyn Adapter> {
        Arc::new(StubAdapter)
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" });
        let response = handle_request(&request, &adapter()).await.unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "stub-mcp-server");
    }

    #[tokio::test]
    async fn tools_list_returns_definitions() {
        let request = json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" });
        let response = handle_request(&request, &adapter()).await.unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
    }

    #[tokio::test]
    async fn tools_call_success_has_no_error_flag() {
        let request = json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": { "name": "echo", "arguments": { "k": "v" } }
        });
        let response = handle_request(&request, &adapter()).await.unwrap();
        assert!(response["result"]["isError"].is_null());
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"k\""));
    }

    #[tokio::test]
    async fn tools_call_unknown_tool_is_error_result() {
        let request = json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": { "name": "nope", "arguments": {} }
        });
        let response = handle_request(&request, &adapter()).await.unwrap();
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn unknown_method_is_rpc_error() {
        let request = json!({ "jsonrpc": "2.0", "id": 5, "method": "bogus" });
        let response = handle_request(&request, &adapter()).await.unwrap();
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let request = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
        assert!(handle_request(&request, &adapter()).await.is_none());
    }

    #[tokio::test]
    async fn parse_error_is_reported() {
        let response = handle_raw("{not json", &adapter()).await.unwrap();
        assert_eq!(response["error"]["code"], -32700);
    }
}
