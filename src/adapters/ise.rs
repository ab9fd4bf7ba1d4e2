//! Cisco ISE adapter.
//!
//! The ERS API is a family of uniformly-shaped resource collections, so the
//! catalog is a typed registry: one entry per resource with its path and the
//! fields the upstream accepts in filter expressions. The registry is
//! validated at startup; filter expressions are validated against it before
//! any network call. Credentials are presented as basic auth on every
//! request — ISE issues no session token.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::client::{AuthScheme, HttpClient, HttpClientBuilder};
use crate::config::EnvSource;
use crate::error::ClientError;
use crate::redact::Redactor;
use crate::tools::{optional_str, optional_u64, required_str, Adapter, ToolResult};

/// Upstream cap on ERS page size.
const MAX_PAGE_SIZE: u64 = 100;

/// Filter operations the ERS API understands.
const FILTER_OPERATIONS: &[&str] = &[
    "EQ", "NEQ", "GT", "LT", "EQUALS", "CONTAINS", "STARTSW", "NSTARTSW", "ENDSW", "NENDSW",
];

/// One ERS resource collection exposed as a paginated query tool.
struct Resource {
    tool: &'static str,
    path: &'static str,
    description: &'static str,
    filterable: &'static [&'static str],
}

const RESOURCES: &[Resource] = &[
    Resource {
        tool: "ise_get_network_devices",
        path: "networkdevice",
        description: "Network devices registered in ISE",
        filterable: &["name", "ipAddress", "description"],
    },
    Resource {
        tool: "ise_get_identity_groups",
        path: "identitygroup",
        description: "Identity groups for user categorization",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_endpoint_groups",
        path: "endpointgroup",
        description: "Endpoint identity groups for device categorization",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_authorization_profiles",
        path: "authorizationprofile",
        description: "Authorization profiles for policy enforcement",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_network_access_policies",
        path: "networkaccess/policyset",
        description: "Network access policy sets",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_endpoints",
        path: "endpoint",
        description: "Endpoints (devices) known to ISE",
        filterable: &["name", "mac", "description"],
    },
    Resource {
        tool: "ise_get_internal_users",
        path: "internaluser",
        description: "Internal users configured in ISE",
        filterable: &["name", "email", "description"],
    },
    Resource {
        tool: "ise_get_guest_users",
        path: "guestuser",
        description: "Guest users in ISE",
        filterable: &["name", "guestType", "sponsorUserName"],
    },
    Resource {
        tool: "ise_get_active_sessions",
        path: "session",
        description: "Active network access sessions",
        filterable: &["userName", "endPointMACAddress", "nasIPAddress"],
    },
    Resource {
        tool: "ise_get_profiler_profiles",
        path: "profilerprofile",
        description: "Profiler profiles for device classification",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_security_groups",
        path: "sgt",
        description: "Security Group Tags (SGTs) for TrustSec",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_sxp_connections",
        path: "sxpconnections",
        description: "SXP connections for IP-SGT mapping distribution",
        filterable: &["ipAddress", "sxpPeer"],
    },
    Resource {
        tool: "ise_get_tacacs_command_sets",
        path: "tacacscommandsets",
        description: "TACACS+ command sets for device administration",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_tacacs_profiles",
        path: "tacacsprofile",
        description: "TACACS+ profiles for device administration",
        filterable: &["name", "description"],
    },
    Resource {
        tool: "ise_get_admin_users",
        path: "adminuser",
        description: "Administrative users in ISE",
        filterable: &["name", "email", "firstName", "lastName"],
    },
];

pub struct IseAdapter {
    client: HttpClient,
    registry: IndexMap<&'static str, &'static Resource>,
}

impl IseAdapter {
    /// Build from `ISE_HOST`, `ISE_USERNAME`, `ISE_PASSWORD`
    /// (+ optional `ISE_VERIFY_SSL`, default off).
    pub fn from_env(env: &EnvSource) -> Result<Self, ClientError> {
        let host = env.required("ISE_HOST")?;
        let username = env.required("ISE_USERNAME")?;
        let password = env.required("ISE_PASSWORD")?;
        let verify_ssl = env.flag("ISE_VERIFY_SSL", false);

        let registry = build_registry()?;

        let redactor = Redactor::new([password.clone()]);
        let client = HttpClientBuilder::new(
            format!("https://{}/ers/config", host.trim_end_matches('/')),
            AuthScheme::Basic { username, password },
        )
        .verify_ssl(verify_ssl)
        .redactor(redactor)
        .build();

        Ok(Self { client, registry })
    }

    /// Paginated collection query with optional validated filter.
    async fn query(&self, resource: &Resource, args: &Value) -> Result<Value, ClientError> {
        let page = optional_u64(args, "page").unwrap_or(1);
        let size = optional_u64(args, "size").unwrap_or(20).min(MAX_PAGE_SIZE);

        let mut query = vec![
            ("page".to_string(), page.to_string()),
            ("size".to_string(), size.to_string()),
        ];
        if let Some(filter) = optional_str(args, "filter_expression") {
            validate_filter(filter, resource.filterable)?;
            query.push(("filter".to_string(), filter.to_string()));
        }

        self.client
            .get(&format!("/{}", resource.path), &query)
            .await
    }

    async fn filtered_get(&self, path: &str, filter: String) -> Result<Value, ClientError> {
        let query = vec![("filter".to_string(), filter)];
        self.client.get(&format!("/{path}"), &query).await
    }
}

/// Build the tool-name -> resource map, rejecting malformed entries.
fn build_registry() -> Result<IndexMap<&'static str, &'static Resource>, ClientError> {
    let mut registry = IndexMap::new();
    for resource in RESOURCES {
        if resource.path.is_empty() || resource.filterable.is_empty() {
            return Err(ClientError::Config(format!(
                "resource '{}' has an incomplete registry entry",
                resource.tool
            )));
        }
        if registry.insert(resource.tool, resource).is_some() {
            return Err(ClientError::Config(format!(
                "duplicate resource tool '{}'",
                resource.tool
            )));
        }
    }
    Ok(registry)
}

/// Validate a `field.OPERATION.value` filter expression against the fields
/// the resource accepts. Rejected expressions never reach the network.
fn validate_filter(expression: &str, allowed: &[&str]) -> Result<(), ClientError> {
    let mut parts = expression.splitn(3, '.');
    let (field, operation) = match (parts.next(), parts.next(), parts.next()) {
        (Some(f), Some(o), Some(v)) if !f.is_empty() && !o.is_empty() && !v.is_empty() => (f, o),
        _ => {
            return Err(ClientError::InvalidArgument(format!(
                "filter must have the form field.OPERATION.value, got '{expression}'"
            )));
        }
    };

    if !allowed.contains(&field) {
        return Err(ClientError::InvalidArgument(format!(
            "field '{}' is not filterable here; allowed fields: {}",
            field,
            allowed.join(", ")
        )));
    }
    if !FILTER_OPERATIONS.contains(&operation) {
        return Err(ClientError::InvalidArgument(format!(
            "unknown filter operation '{}'; expected one of: {}",
            operation,
            FILTER_OPERATIONS.join(", ")
        )));
    }
    Ok(())
}

/// Input schema shared by every registry-backed query tool.
fn collection_schema(resource: &Resource) -> Value {
    let filter_hint = format!(
        "Filter in the form 'field.OPERATION.value' (e.g. '{}.CONTAINS.lab'). Filterable fields: {}.",
        resource.filterable[0],
        resource.filterable.join(", ")
    );
    json!({
        "type": "object",
        "properties": {
            "filter_expression": { "type": "string", "description": filter_hint },
            "page": { "type": "integer", "description": "Page number for pagination. Default 1." },
            "size": { "type": "integer", "description": "Results per page. Default 20, max 100." }
        },
        "additionalProperties": false
    })
}

#[async_trait]
impl Adapter for IseAdapter {
    fn name(&self) -> &'static str {
        "ise"
    }

    fn tool_definitions(&self) -> Vec<Value> {
        let mut tools: Vec<Value> = self
            .registry
            .values()
            .map(|resource| {
                json!({
                    "name": resource.tool,
                    "description": resource.description,
                    "inputSchema": collection_schema(resource)
                })
            })
            .collect();

        tools.push(json!({
            "name": "ise_search_endpoint_by_mac",
            "description": "Search for a specific endpoint by MAC address.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "mac_address": { "type": "string", "description": "MAC address, e.g. '00:50:56:C0:00:01'." }
                },
                "required": ["mac_address"],
                "additionalProperties": false
            }
        }));
        tools.push(json!({
            "name": "ise_search_user_sessions",
            "description": "Search for active sessions by username.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "username": { "type": "string", "description": "Username to search for." }
                },
                "required": ["username"],
                "additionalProperties": false
            }
        }));
        tools.push(json!({
            "name": "ise_get_device_compliance_status",
            "description": "Get compliance and profiling information for a device by MAC address.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "mac_address": { "type": "string", "description": "MAC address of the device to check." }
                },
                "required": ["mac_address"],
                "additionalProperties": false
            }
        }));
        tools
    }

    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
        if let Some(resource) = self.registry.get(name) {
            return ToolResult::from_call(self.query(resource, args).await);
        }

        match name {
            "ise_search_endpoint_by_mac" => match required_str(args, "mac_address") {
                Ok(mac) => ToolResult::from_call(
                    self.filtered_get("endpoint", format!("mac.EQUALS.{mac}")).await,
                ),
                Err(e) => ToolResult::error(e.to_string()),
            },
            "ise_search_user_sessions" => match required_str(args, "username") {
                Ok(user) => ToolResult::from_call(
                    self.filtered_get("session", format!("userName.EQUALS.{user}"))
                        .await,
                ),
                Err(e) => ToolResult::error(e.to_string()),
            },
            "ise_get_device_compliance_status" => match required_str(args, "mac_address") {
                Ok(mac) => {
                    let outcome = self
                        .filtered_get("endpoint", format!("mac.EQUALS.{mac}"))
                        .await;
                    match outcome {
                        Ok(endpoint_data) => ToolResult::success(json!({
                            "mac_address": mac,
                            "endpoint_data": endpoint_data,
                            "compliance_status":
                                "Retrieved endpoint data - check profiledBy and groupId fields for compliance"
                        })),
                        Err(e) => ToolResult::error(e.to_string()),
                    }
                }
                Err(e) => ToolResult::error(e.to_string()),
            },
            _ => ToolResult::unknown_tool(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn adapter() -> IseAdapter {
        let env = EnvSource::from_map(HashMap::from([
            ("ISE_HOST".to_string(), "ise.example.com".to_string()),
            ("ISE_USERNAME".to_string(), "ersadmin".to_string()),
            ("ISE_PASSWORD".to_string(), "pw".to_string()),
        ]));
        IseAdapter::from_env(&env).unwrap()
    }

    #[test]
    fn registry_builds_with_unique_tools() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.len(), RESOURCES.len());
        assert!(registry.contains_key("ise_get_network_devices"));
    }

    #[test]
    fn filter_accepts_allowed_field() {
        assert!(validate_filter("name.CONTAINS.switch", &["name", "description"]).is_ok());
    }

    #[test]
    fn filter_rejects_unknown_field() {
        let err = validate_filter("password.EQUALS.x", &["name"]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn filter_rejects_unknown_operation() {
        let err = validate_filter("name.LIKE.switch", &["name"]).unwrap_err();
        assert!(err.to_string().contains("LIKE"));
    }

    #[test]
    fn filter_rejects_malformed_expression() {
        assert!(validate_filter("nameonly", &["name"]).is_err());
        assert!(validate_filter("name.", &["name"]).is_err());
    }

    #[test]
    fn filter_value_may_contain_dots() {
        // MAC and IP values embed separators; only the first two parts split
        assert!(validate_filter("ipAddress.CONTAINS.192.168", &["ipAddress"]).is_ok());
    }

    #[tokio::test]
    async fn bad_filter_is_rejected_before_network() {
        let adapter = adapter();
        let result = adapter
            .call_tool(
                "ise_get_network_devices",
                &json!({ "filter_expression": "secret.EQUALS.x" }),
            )
            .await;
        assert!(result.is_error);
        let text = result.content[0]["text"].as_str().unwrap();
        assert!(text.contains("not filterable"));
    }

    #[test]
    fn definitions_cover_registry_and_searches() {
        let adapter = adapter();
        let defs = adapter.tool_definitions();
        assert_eq!(defs.len(), RESOURCES.len() + 3);
    }
}
