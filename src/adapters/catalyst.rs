//! Cisco Catalyst Center adapter.
//!
//! Authenticates against `/dna/system/api/v1/auth/token` with basic auth;
//! the returned token is replayed in `X-Auth-Token` and refreshed
//! transparently on 401. All tools are GETs under `/dna/intent/api/v1`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::{AuthScheme, HttpClient, HttpClientBuilder};
use crate::config::EnvSource;
use crate::error::ClientError;
use crate::redact::Redactor;
use crate::tools::{optional_str, optional_u64, push_opt, required_str, Adapter, ToolResult};

#[derive(Debug)]
pub struct CatalystAdapter {
    client: HttpClient,
}

impl CatalystAdapter {
    /// Build from `CATC_URL`, `CATC_USERNAME`, `CATC_PASSWORD`
    /// (+ optional `CATC_VERIFY_SSL`, default off for lab deployments).
    pub fn from_env(env: &EnvSource) -> Result<Self, ClientError> {
        let url = env.required("CATC_URL")?;
        let username = env.required("CATC_USERNAME")?;
        let password = env.required("CATC_PASSWORD")?;
        let verify_ssl = env.flag("CATC_VERIFY_SSL", false);

        let redactor = Redactor::new([password.clone()]);
        let client = HttpClientBuilder::new(
            url,
            AuthScheme::TokenLogin {
                login_path: "/dna/system/api/v1/auth/token".into(),
                username,
                password,
                token_field: "Token".into(),
                token_header: "X-Auth-Token".into(),
            },
        )
        .verify_ssl(verify_ssl)
        .redactor(redactor)
        .build();

        Ok(Self { client })
    }

    async fn intent_get(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<Value, ClientError> {
        self.client
            .get(&format!("/dna/intent/api/v1{endpoint}"), &query)
            .await
    }
}

#[async_trait]
impl Adapter for CatalystAdapter {
    fn name(&self) -> &'static str {
        "catalyst-center"
    }

    fn tool_definitions(&self) -> Vec<Value> {
        tool_definitions()
    }

    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
        match name {
            "get_network_devices" => {
                let mut query = Vec::new();
                push_opt(&mut query, "hostname", optional_str(args, "hostname"));
                push_opt(&mut query, "type", optional_str(args, "device_type"));
                ToolResult::from_call(self.intent_get("/network-device", query).await)
            }
            "get_device_detail" => match required_str(args, "device_id") {
                Ok(id) => ToolResult::from_call(
                    self.intent_get(&format!("/network-device/{id}"), Vec::new())
                        .await,
                ),
                Err(e) => ToolResult::error(e.to_string()),
            },
            "get_sites" => ToolResult::from_call(self.intent_get("/site", Vec::new()).await),
            "get_site_topology" => match required_str(args, "site_id") {
                Ok(id) => {
                    let query = vec![("siteId".to_string(), id.to_string())];
                    ToolResult::from_call(self.intent_get("/topology/site-topology", query).await)
                }
                Err(e) => ToolResult::error(e.to_string()),
            },
            "get_clients" => {
                let limit = optional_u64(args, "limit").unwrap_or(100);
                let query = vec![("limit".to_string(), limit.to_string())];
                ToolResult::from_call(self.intent_get("/client-health", query).await)
            }
            "get_network_health" => {
                ToolResult::from_call(self.intent_get("/network-health", Vec::new()).await)
            }
            "get_device_health" => match required_str(args, "device_id") {
                Ok(id) => ToolResult::from_call(
                    self.intent_get(&format!("/device-health/{id}"), Vec::new())
                        .await,
                ),
                Err(e) => ToolResult::error(e.to_string()),
            },
            "get_issues" => {
                let mut query = Vec::new();
                push_opt(&mut query, "priority", optional_str(args, "priority"));
                push_opt(&mut query, "status", optional_str(args, "status"));
                ToolResult::from_call(self.intent_get("/issues", query).await)
            }
            "get_templates" => ToolResult::from_call(
                self.intent_get("/template-programmer/template", Vec::new())
                    .await,
            ),
            "get_compliance_detail" => match required_str(args, "device_id") {
                Ok(id) => ToolResult::from_call(
                    self.intent_get(&format!("/compliance/{id}/detail"), Vec::new())
                        .await,
                ),
                Err(e) => ToolResult::error(e.to_string()),
            },
            "get_events" => {
                let mut query = vec![(
                    "limit".to_string(),
                    optional_u64(args, "limit").unwrap_or(100).to_string(),
                )];
                push_opt(&mut query, "category", optional_str(args, "category"));
                push_opt(&mut query, "severity", optional_str(args, "severity"));
                ToolResult::from_call(self.intent_get("/events", query).await)
            }
            _ => ToolResult::unknown_tool(name),
        }
    }
}

fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "get_network_devices",
            "description": "Get network devices from Catalyst Center, optionally filtered by hostname or device type.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "hostname": { "type": "string", "description": "Device hostname to filter by." },
                    "device_type": { "type": "string", "description": "Device type to filter by (e.g. 'Switches and Hubs', 'Routers')." }
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_device_detail",
            "description": "Get detailed information about a specific device.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "device_id": { "type": "string", "description": "The device ID/UUID." }
                },
                "required": ["device_id"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_sites",
            "description": "Get all sites from Catalyst Center.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        }),
        json!({
            "name": "get_site_topology",
            "description": "Get topology for a specific site.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "site_id": { "type": "string", "description": "The site ID/UUID." }
                },
                "required": ["site_id"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_clients",
            "description": "Get client health information from Catalyst Center.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "description": "Maximum number of clients to return. Default 100." }
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_network_health",
            "description": "Get overall network health metrics.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        }),
        json!({
            "name": "get_device_health",
            "description": "Get health information for a specific device.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "device_id": { "type": "string", "description": "The device ID/UUID." }
                },
                "required": ["device_id"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_issues",
            "description": "Get network issues, optionally filtered by priority (P1-P4) or status (ACTIVE, RESOLVED).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "priority": { "type": "string", "description": "Priority filter: P1, P2, P3 or P4." },
                    "status": { "type": "string", "description": "Status filter: ACTIVE or RESOLVED." }
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_templates",
            "description": "Get configuration templates from the template programmer.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        }),
        json!({
            "name": "get_compliance_detail",
            "description": "Get compliance details for a specific device.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "device_id": { "type": "string", "description": "The device ID/UUID." }
                },
                "required": ["device_id"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": "get_events",
            "description": "Get events, optionally filtered by category or severity (INFO, WARN, ERROR, ALERT, CRITICAL).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "category": { "type": "string", "description": "Event category filter." },
                    "severity": { "type": "string", "description": "Severity filter." },
                    "limit": { "type": "integer", "description": "Maximum number of events to return. Default 100." }
                },
                "additionalProperties": false
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn tool_names_are_unique() {
        let defs = tool_definitions();
        let mut names: Vec<&str> = defs
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
        assert_eq!(before, 11);
    }

    #[test]
    fn from_env_requires_credentials() {
        let env = EnvSource::from_map(HashMap::from([(
            "CATC_URL".to_string(),
            "https://catalyst.example.com".to_string(),
        )]));
        let err = CatalystAdapter::from_env(&env).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("CATC_USERNAME"));
    }

    #[tokio::test]
    async fn missing_device_id_is_rejected_before_network() {
        let env = EnvSource::from_map(HashMap::from([
            ("CATC_URL".to_string(), "https://catalyst.example.com".to_string()),
            ("CATC_USERNAME".to_string(), "admin".to_string()),
            ("CATC_PASSWORD".to_string(), "pw".to_string()),
        ]));
        let adapter = CatalystAdapter::from_env(&env).unwrap();
        let result = adapter.call_tool("get_device_detail", &json!({})).await;
        assert!(result.is_error);
        let text = result.content[0]["text"].as_str().unwrap();
        assert!(text.contains("device_id"));
    }
}
