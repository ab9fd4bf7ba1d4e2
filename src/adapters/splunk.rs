//! Splunk adapter.
//!
//! Splunk ships its own MCP backend at `/services/mcp`; this adapter
//! forwards each tool as a JSON-RPC `tools/call` envelope with bearer
//! authentication and unwraps the backend's `result`. Self-signed
//! management-port certificates are tolerated unless `SPLUNK_VERIFY_SSL`
//! says otherwise.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::client::{AuthScheme, HttpClient, HttpClientBuilder};
use crate::config::EnvSource;
use crate::error::ClientError;
use crate::redact::Redactor;
use crate::tools::{optional_str, optional_u64, required_str, Adapter, ToolResult};

const DEFAULT_PORT: &str = "8089";

pub struct SplunkAdapter {
    client: HttpClient,
}

impl SplunkAdapter {
    /// Build from `SPLUNK_HOST`, `SPLUNK_API_KEY`
    /// (+ optional `SPLUNK_PORT`, `SPLUNK_VERIFY_SSL`).
    pub fn from_env(env: &EnvSource) -> Result<Self, ClientError> {
        let host = env.required("SPLUNK_HOST")?;
        let api_key = env.required("SPLUNK_API_KEY")?;
        let port = env
            .optional("SPLUNK_PORT")
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        let verify_ssl = env.flag("SPLUNK_VERIFY_SSL", false);

        let redactor = Redactor::new([api_key.clone()]);
        let client = HttpClientBuilder::new(
            format!("https://{host}:{port}"),
            AuthScheme::Bearer { token: api_key },
        )
        .verify_ssl(verify_ssl)
        .redactor(redactor)
        .build();

        Ok(Self { client })
    }

    /// Forward one tool call to the Splunk MCP backend and unwrap `result`.
    async fn call_backend(&self, tool: &str, arguments: Value) -> Result<Value, ClientError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": tool, "arguments": arguments }
        });

        let response = self.client.post("/services/mcp", &payload).await?;
        if let Some(err) = response.get("error") {
            return Err(ClientError::Upstream {
                status: 200,
                body: format!("Splunk MCP error: {err}"),
            });
        }
        Ok(response.get("result").cloned().unwrap_or_else(|| json!({})))
    }
}

#[async_trait]
impl Adapter for SplunkAdapter {
    fn name(&self) -> &'static str {
        "splunk"
    }

    fn tool_definitions(&self) -> Vec<Value> {
        let no_args = json!({ "type": "object", "properties": {}, "additionalProperties": false });
        vec![
            json!({
                "name": "get_splunk_info",
                "description": "Get Splunk instance information: version, licensing, deployment details.",
                "inputSchema": no_args
            }),
            json!({
                "name": "get_indexes",
                "description": "List all Splunk indexes with their properties.",
                "inputSchema": no_args
            }),
            json!({
                "name": "get_index_info",
                "description": "Get detailed information about a specific index.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "index_name": { "type": "string", "description": "Name of the index to query." }
                    },
                    "required": ["index_name"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_user_list",
                "description": "Get the list of Splunk users.",
                "inputSchema": no_args
            }),
            json!({
                "name": "get_user_info",
                "description": "Get current user information.",
                "inputSchema": no_args
            }),
            json!({
                "name": "run_splunk_query",
                "description": "Execute an SPL query, e.g. 'search index=_internal | stats count by sourcetype'.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "SPL query string." },
                        "earliest_time": { "type": "string", "description": "Search start time. Default '-24h'." },
                        "latest_time": { "type": "string", "description": "Search end time. Default 'now'." },
                        "max_results": { "type": "integer", "description": "Maximum results to return. Default 100." }
                    },
                    "required": ["query"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_metadata",
                "description": "Retrieve metadata about hosts, sources, or sourcetypes.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "metadata_type": { "type": "string", "description": "One of: hosts, sources, sourcetypes." },
                        "index": { "type": "string", "description": "Index name to filter results." },
                        "earliest_time": { "type": "string", "description": "Start time. Default '-24h'." },
                        "latest_time": { "type": "string", "description": "End time. Default 'now'." }
                    },
                    "required": ["metadata_type"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_kv_store_collections",
                "description": "Get KV Store collection statistics.",
                "inputSchema": no_args
            }),
            json!({
                "name": "get_knowledge_objects",
                "description": "Retrieve knowledge objects: saved searches, alerts, dashboards, etc.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "object_type": { "type": "string", "description": "Type filter: savedsearches, alerts, dashboards, ..." }
                    },
                    "additionalProperties": false
                }
            }),
        ]
    }

    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
        let outcome = match name {
            "get_splunk_info" | "get_indexes" | "get_user_list" | "get_user_info"
            | "get_kv_store_collections" => self.call_backend(name, json!({})).await,
            "get_index_info" => match required_str(args, "index_name") {
                Ok(index) => {
                    self.call_backend(name, json!({ "index_name": index })).await
                }
                Err(e) => return ToolResult::error(e.to_string()),
            },
            "run_splunk_query" => match required_str(args, "query") {
                Ok(query) => {
                    let arguments = json!({
                        "query": query,
                        "earliest_time": optional_str(args, "earliest_time").unwrap_or("-24h"),
                        "latest_time": optional_str(args, "latest_time").unwrap_or("now"),
                        "max_results": optional_u64(args, "max_results").unwrap_or(100),
                    });
                    self.call_backend(name, arguments).await
                }
                Err(e) => return ToolResult::error(e.to_string()),
            },
            "get_metadata" => match required_str(args, "metadata_type") {
                Ok(metadata_type) => {
                    let mut arguments = json!({
                        "metadata_type": metadata_type,
                        "earliest_time": optional_str(args, "earliest_time").unwrap_or("-24h"),
                        "latest_time": optional_str(args, "latest_time").unwrap_or("now"),
                    });
                    if let Some(index) = optional_str(args, "index") {
                        arguments["index"] = json!(index);
                    }
                    self.call_backend(name, arguments).await
                }
                Err(e) => return ToolResult::error(e.to_string()),
            },
            "get_knowledge_objects" => {
                let mut arguments = Map::new();
                if let Some(object_type) = optional_str(args, "object_type") {
                    arguments.insert("object_type".to_string(), json!(object_type));
                }
                self.call_backend(name, Value::Object(arguments)).await
            }
            _ => return ToolResult::unknown_tool(name),
        };
        ToolResult::from_call(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn adapter() -> SplunkAdapter {
        let env = EnvSource::from_map(HashMap::from([
            ("SPLUNK_HOST".to_string(), "splunk.example.com".to_string()),
            ("SPLUNK_API_KEY".to_string(), "t0ken".to_string()),
        ]));
        SplunkAdapter::from_env(&env).unwrap()
    }

    #[test]
    fn port_defaults_to_management_port() {
        let adapter = adapter();
        assert_eq!(adapter.client.base_url(), "https://splunk.example.com:8089");
    }

    #[test]
    fn nine_tools_are_exposed() {
        assert_eq!(adapter().tool_definitions().len(), 9);
    }

    #[tokio::test]
    async fn query_tool_requires_spl() {
        let result = adapter().call_tool("run_splunk_query", &json!({})).await;
        assert!(result.is_error);
        assert!(result.content[0]["text"].as_str().unwrap().contains("query"));
    }
}
