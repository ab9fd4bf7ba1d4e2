//! Cisco Meraki Dashboard adapter.
//!
//! Bearer-key access to the Dashboard API with role-based tool exposure:
//! `MCP_ROLE` selects which subset of the catalog an agent may see. All
//! responses pass through the [`normalize`](crate::normalize) coercion step
//! because the upstream nulls out fields its schema declares as strings.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use crate::client::{AuthScheme, HttpClient, HttpClientBuilder};
use crate::config::EnvSource;
use crate::error::ClientError;
use crate::normalize;
use crate::redact::Redactor;
use crate::tools::{required_str, Adapter, ToolResult};

const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Access role controlling which tools are exposed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    /// Network operations: read tools plus firmware upgrade scheduling.
    Noc,
    /// System administration: read tools only.
    Sysadmin,
    /// Unrestricted: the full catalog.
    All,
}

impl Role {
    /// Parse `MCP_ROLE`, defaulting to the most restricted read+upgrade
    /// role when unset or unrecognized.
    fn from_env(env: &EnvSource) -> Self {
        match env.optional("MCP_ROLE").as_deref() {
            Some("sysadmin") => Role::Sysadmin,
            Some("all") => Role::All,
            Some("noc") | None => Role::Noc,
            Some(other) => {
                warn!("unknown MCP_ROLE '{other}', defaulting to noc");
                Role::Noc
            }
        }
    }

    fn allows_firmware_update(self) -> bool {
        matches!(self, Role::Noc | Role::All)
    }
}

#[derive(Debug)]
pub struct MerakiAdapter {
    client: HttpClient,
    role: Role,
}

impl MerakiAdapter {
    /// Build from `MERAKI_KEY` (+ optional `MERAKI_BASE_URL`, `MCP_ROLE`).
    pub fn from_env(env: &EnvSource) -> Result<Self, ClientError> {
        let api_key = env.required("MERAKI_KEY")?;
        let base_url = env
            .optional("MERAKI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let role = Role::from_env(env);

        let redactor = Redactor::new([api_key.clone()]);
        let client = HttpClientBuilder::new(base_url, AuthScheme::Bearer { token: api_key })
            .redactor(redactor)
            .normalizer(normalize::meraki_nulls)
            .build();

        Ok(Self { client, role })
    }

    async fn org_get(&self, args: &Value, suffix: &str) -> ToolResult {
        match required_str(args, "organization_id") {
            Ok(id) => ToolResult::from_call(
                self.client
                    .get(&format!("/organizations/{id}{suffix}"), &[])
                    .await,
            ),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

#[async_trait]
impl Adapter for MerakiAdapter {
    fn name(&self) -> &'static str {
        "meraki"
    }

    fn tool_definitions(&self) -> Vec<Value> {
        let org_schema = json!({
            "type": "object",
            "properties": {
                "organization_id": { "type": "string", "description": "Meraki organization ID." }
            },
            "required": ["organization_id"],
            "additionalProperties": false
        });

        let mut tools = vec![
            json!({
                "name": "get_organizations",
                "description": "List organizations the API key can access.",
                "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
            }),
            json!({
                "name": "get_organization_networks",
                "description": "List the networks in an organization.",
                "inputSchema": org_schema
            }),
            json!({
                "name": "get_organization_devices",
                "description": "List the devices in an organization.",
                "inputSchema": org_schema
            }),
            json!({
                "name": "get_organization_firmware_upgrades",
                "description": "Get firmware upgrade status for an organization.",
                "inputSchema": org_schema
            }),
            json!({
                "name": "get_organization_licenses_overview",
                "description": "Get the licenses overview for an organization.",
                "inputSchema": org_schema
            }),
        ];

        if self.role.allows_firmware_update() {
            tools.push(json!({
                "name": "update_network_firmware_upgrades",
                "description": "Update firmware upgrade settings for a network (schedule, products, timezone).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "network_id": { "type": "string", "description": "Meraki network ID." },
                        "upgrade": {
                            "type": "object",
                            "description": "Firmware upgrade settings, passed through to the Dashboard API unchanged."
                        }
                    },
                    "required": ["network_id", "upgrade"],
                    "additionalProperties": false
                }
            }));
        }

        tools
    }

    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
        match name {
            "get_organizations" => {
                ToolResult::from_call(self.client.get("/organizations", &[]).await)
            }
            "get_organization_networks" => self.org_get(args, "/networks").await,
            "get_organization_devices" => self.org_get(args, "/devices").await,
            "get_organization_firmware_upgrades" => self.org_get(args, "/firmware/upgrades").await,
            "get_organization_licenses_overview" => self.org_get(args, "/licenses/overview").await,
            "update_network_firmware_upgrades" if self.role.allows_firmware_update() => {
                let network_id = match required_str(args, "network_id") {
                    Ok(id) => id,
                    Err(e) => return ToolResult::error(e.to_string()),
                };
                let Some(upgrade) = args.get("upgrade").filter(|v| v.is_object()) else {
                    return ToolResult::error(
                        "invalid argument: upgrade must be an object".into(),
                    );
                };
                ToolResult::from_call(
                    self.client
                        .put(&format!("/networks/{network_id}/firmwareUpgrades"), upgrade)
                        .await,
                )
            }
            _ => ToolResult::unknown_tool(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn adapter_with_role(role: &str) -> MerakiAdapter {
        let env = EnvSource::from_map(HashMap::from([
            ("MERAKI_KEY".to_string(), "k3y".to_string()),
            ("MCP_ROLE".to_string(), role.to_string()),
        ]));
        MerakiAdapter::from_env(&env).unwrap()
    }

    #[test]
    fn missing_key_fails_startup() {
        let env = EnvSource::from_map(HashMap::new());
        assert!(matches!(
            MerakiAdapter::from_env(&env).unwrap_err(),
            ClientError::Config(_)
        ));
    }

    #[test]
    fn noc_role_includes_firmware_update() {
        let defs = adapter_with_role("noc").tool_definitions();
        assert!(defs
            .iter()
            .any(|d| d["name"] == "update_network_firmware_upgrades"));
    }

    #[test]
    fn sysadmin_role_is_read_only() {
        let defs = adapter_with_role("sysadmin").tool_definitions();
        assert_eq!(defs.len(), 5);
        assert!(!defs
            .iter()
            .any(|d| d["name"] == "update_network_firmware_upgrades"));
    }

    #[tokio::test]
    async fn sysadmin_cannot_call_firmware_update() {
        let adapter = adapter_with_role("sysadmin");
        let result = adapter
            .call_tool(
                "update_network_firmware_upgrades",
                &json!({ "network_id": "N_1", "upgrade": {} }),
            )
            .await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn firmware_update_requires_object_payload() {
        let adapter = adapter_with_role("noc");
        let result = adapter
            .call_tool(
                "update_network_firmware_upgrades",
                &json!({ "network_id": "N_1", "upgrade": "latest" }),
            )
            .await;
        assert!(result.is_error);
        assert!(result.content[0]["text"]
            .as_str()
            .unwrap()
            .contains("object"));
    }
}
