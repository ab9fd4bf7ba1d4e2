//! Cisco ThousandEyes adapter.
//!
//! Read-only access to the v7 API with a static bearer token. Time-bounded
//! tools accept either a `window` shorthand or explicit `start`/`end`
//! stamps, mapped to the upstream's `window`/`from`/`to` parameters.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::{AuthScheme, HttpClient, HttpClientBuilder};
use crate::config::EnvSource;
use crate::error::ClientError;
use crate::redact::Redactor;
use crate::tools::{optional_str, optional_u64, push_opt, required_str, Adapter, ToolResult};

const DEFAULT_BASE_URL: &str = "https://api.thousandeyes.com/v7";

pub struct ThousandEyesAdapter {
    client: HttpClient,
}

impl ThousandEyesAdapter {
    /// Build from `TE_TOKEN` (+ optional `TE_BASE_URL`).
    pub fn from_env(env: &EnvSource) -> Result<Self, ClientError> {
        let token = env.required("TE_TOKEN")?;
        let base_url = env
            .optional("TE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let redactor = Redactor::new([token.clone()]);
        let client = HttpClientBuilder::new(base_url, AuthScheme::Bearer { token })
            .redactor(redactor)
            .build();

        Ok(Self { client })
    }
}

/// Append the shared time-range parameters (`window`, or `from`/`to`).
fn push_time_range(query: &mut Vec<(String, String)>, args: &Value) {
    push_opt(query, "window", optional_str(args, "window"));
    push_opt(query, "from", optional_str(args, "start"));
    push_opt(query, "to", optional_str(args, "end"));
}

#[async_trait]
impl Adapter for ThousandEyesAdapter {
    fn name(&self) -> &'static str {
        "thousandeyes"
    }

    fn tool_definitions(&self) -> Vec<Value> {
        let time_props = json!({
            "window": { "type": "string", "description": "Time window shorthand, e.g. '1h', '6h', '1d', '1w'." },
            "start": { "type": "string", "description": "Start time in ISO format (alternative to window)." },
            "end": { "type": "string", "description": "End time in ISO format (alternative to window)." },
            "aid": { "type": "integer", "description": "Account Group ID." }
        });

        vec![
            json!({
                "name": "te_list_tests",
                "description": "List tests, optionally filtered by name, type, or account group.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "aid": { "type": "integer", "description": "Account Group ID to filter by." },
                        "name_contains": { "type": "string", "description": "Filter tests whose name contains this string." },
                        "test_type": { "type": "string", "description": "Test type, e.g. 'http-server', 'page-load', 'web-transactions'." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "te_list_agents",
                "description": "List enterprise, enterprise-cluster, and cloud agents.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "agent_types": { "type": "string", "description": "Comma-separated agent types: enterprise, enterprise-cluster, cloud." },
                        "aid": { "type": "integer", "description": "Account Group ID to filter by." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "te_get_test_results",
                "description": "Get results for a test (network, page-load, web-transactions, ...).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "test_id": { "type": "integer", "description": "Test ID." },
                        "test_type": { "type": "string", "description": "Result type: 'network', 'page-load', 'web-transactions', ..." },
                        "agent_id": { "type": "integer", "description": "Restrict results to one agent." },
                        "window": time_props["window"],
                        "start": time_props["start"],
                        "end": time_props["end"],
                        "aid": time_props["aid"]
                    },
                    "required": ["test_id", "test_type"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "te_get_path_vis",
                "description": "Get path visualization (hop-by-hop) results for a test.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "test_id": { "type": "integer", "description": "Test ID." },
                        "agent_id": { "type": "integer", "description": "Restrict results to one agent." },
                        "direction": { "type": "string", "description": "Path direction filter." },
                        "window": time_props["window"],
                        "start": time_props["start"],
                        "end": time_props["end"],
                        "aid": time_props["aid"]
                    },
                    "required": ["test_id"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "te_list_dashboards",
                "description": "List dashboards, optionally filtered by title.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "aid": { "type": "integer", "description": "Account Group ID." },
                        "title_contains": { "type": "string", "description": "Filter dashboards whose title contains this string." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "te_get_dashboard",
                "description": "Get a dashboard by ID.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "dashboard_id": { "type": "string", "description": "Dashboard ID." },
                        "aid": { "type": "integer", "description": "Account Group ID." }
                    },
                    "required": ["dashboard_id"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "te_get_dashboard_widget",
                "description": "Get data for one widget of a dashboard.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "dashboard_id": { "type": "string", "description": "Dashboard ID." },
                        "widget_id": { "type": "string", "description": "Widget ID." },
                        "window": time_props["window"],
                        "start": time_props["start"],
                        "end": time_props["end"],
                        "aid": time_props["aid"]
                    },
                    "required": ["dashboard_id", "widget_id"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "te_get_users",
                "description": "List users in the account.",
                "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
            }),
            json!({
                "name": "te_get_account_groups",
                "description": "List account groups visible to the token.",
                "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
            }),
            json!({
                "name": "te_list_alerts",
                "description": "List alerts, optionally bounded by time and filtered by test or type.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "test_id": { "type": "integer", "description": "Filter alerts for a specific test." },
                        "alert_type": { "type": "string", "description": "Filter by alert type." },
                        "window": time_props["window"],
                        "start": time_props["start"],
                        "end": time_props["end"],
                        "aid": time_props["aid"]
                    },
                    "additionalProperties": false
                }
            }),
        ]
    }

    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
        match name {
            "te_list_tests" => {
                let mut query = Vec::new();
                push_opt(&mut query, "aid", optional_u64(args, "aid"));
                push_opt(&mut query, "testName", optional_str(args, "name_contains"));
                push_opt(&mut query, "type", optional_str(args, "test_type"));
                ToolResult::from_call(self.client.get("/tests", &query).await)
            }
            "te_list_agents" => {
                let mut query = Vec::new();
                push_opt(&mut query, "agentTypes", optional_str(args, "agent_types"));
                push_opt(&mut query, "aid", optional_u64(args, "aid"));
                ToolResult::from_call(self.client.get("/agents", &query).await)
            }
            "te_get_test_results" => {
                let test_id = match optional_u64(args, "test_id") {
                    Some(id) => id,
                    None => {
                        return ToolResult::error(
                            "invalid argument: missing required parameter: test_id".into(),
                        )
                    }
                };
                let test_type = match required_str(args, "test_type") {
                    Ok(t) => t,
                    Err(e) => return ToolResult::error(e.to_string()),
                };
                let mut query = Vec::new();
                push_time_range(&mut query, args);
                push_opt(&mut query, "aid", optional_u64(args, "aid"));
                push_opt(&mut query, "agentId", optional_u64(args, "agent_id"));
                ToolResult::from_call(
                    self.client
                        .get(&format!("/test-results/{test_id}/{test_type}"), &query)
                        .await,
                )
            }
            "te_get_path_vis" => {
                let test_id = match optional_u64(args, "test_id") {
                    Some(id) => id,
                    None => {
                        return ToolResult::error(
                            "invalid argument: missing required parameter: test_id".into(),
                        )
                    }
                };
                let mut query = Vec::new();
                push_time_range(&mut query, args);
                push_opt(&mut query, "aid", optional_u64(args, "aid"));
                push_opt(&mut query, "agentId", optional_u64(args, "agent_id"));
                push_opt(&mut query, "direction", optional_str(args, "direction"));
                ToolResult::from_call(
                    self.client
                        .get(&format!("/test-results/{test_id}/path-vis"), &query)
                        .await,
                )
            }
            "te_list_dashboards" => {
                let mut query = Vec::new();
                push_opt(&mut query, "aid", optional_u64(args, "aid"));
                push_opt(&mut query, "title", optional_str(args, "title_contains"));
                ToolResult::from_call(self.client.get("/dashboards", &query).await)
            }
            "te_get_dashboard" => match required_str(args, "dashboard_id") {
                Ok(id) => {
                    let mut query = Vec::new();
                    push_opt(&mut query, "aid", optional_u64(args, "aid"));
                    ToolResult::from_call(
                        self.client.get(&format!("/dashboards/{id}"), &query).await,
                    )
                }
                Err(e) => ToolResult::error(e.to_string()),
            },
            "te_get_dashboard_widget" => {
                let (dashboard, widget) = match (
                    required_str(args, "dashboard_id"),
                    required_str(args, "widget_id"),
                ) {
                    (Ok(d), Ok(w)) => (d, w),
                    (Err(e), _) | (_, Err(e)) => return ToolResult::error(e.to_string()),
                };
                let mut query = Vec::new();
                push_time_range(&mut query, args);
                push_opt(&mut query, "aid", optional_u64(args, "aid"));
                ToolResult::from_call(
                    self.client
                        .get(&format!("/dashboards/{dashboard}/widgets/{widget}"), &query)
                        .await,
                )
            }
            "te_get_users" => ToolResult::from_call(self.client.get("/users", &[]).await),
            "te_get_account_groups" => {
                ToolResult::from_call(self.client.get("/account-groups", &[]).await)
            }
            "te_list_alerts" => {
                let mut query = Vec::new();
                push_time_range(&mut query, args);
                push_opt(&mut query, "aid", optional_u64(args, "aid"));
                push_opt(&mut query, "testId", optional_u64(args, "test_id"));
                push_opt(&mut query, "type", optional_str(args, "alert_type"));
                ToolResult::from_call(self.client.get("/alerts", &query).await)
            }
            _ => ToolResult::unknown_tool(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn adapter() -> ThousandEyesAdapter {
        let env = EnvSource::from_map(HashMap::from([(
            "TE_TOKEN".to_string(),
            "te-token".to_string(),
        )]));
        ThousandEyesAdapter::from_env(&env).unwrap()
    }

    #[test]
    fn base_url_defaults_to_v7() {
        assert_eq!(adapter().client.base_url(), "https://api.thousandeyes.com/v7");
    }

    #[test]
    fn base_url_override_is_honored() {
        let env = EnvSource::from_map(HashMap::from([
            ("TE_TOKEN".to_string(), "te-token".to_string()),
            ("TE_BASE_URL".to_string(), "https://te.lab.example/v7/".to_string()),
        ]));
        let adapter = ThousandEyesAdapter::from_env(&env).unwrap();
        assert_eq!(adapter.client.base_url(), "https://te.lab.example/v7");
    }

    #[test]
    fn ten_tools_are_exposed() {
        assert_eq!(adapter().tool_definitions().len(), 10);
    }

    #[tokio::test]
    async fn test_results_require_both_id_and_type() {
        let result = adapter()
            .call_tool("te_get_test_results", &json!({ "test_id": 42 }))
            .await;
        assert!(result.is_error);
        assert!(result.content[0]["text"]
            .as_str()
            .unwrap()
            .contains("test_type"));
    }
}
