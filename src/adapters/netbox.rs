//! NetBox adapter.
//!
//! DCIM/IPAM source-of-truth access with `Authorization: Token` auth.
//! NetBox's REST API addresses collections as `/api/{app}/{resource}/` with
//! a trailing slash, and individual objects as `/api/{app}/{resource}/{id}/`.
//! Unlike the Cisco adapters this one exposes write tools too — the upstream
//! is an inventory database, not production gear.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::{AuthScheme, HttpClient, HttpClientBuilder};
use crate::config::EnvSource;
use crate::error::ClientError;
use crate::redact::Redactor;
use crate::tools::{optional_str, optional_u64, push_opt, required_str, Adapter, ToolResult};

pub struct NetBoxAdapter {
    client: HttpClient,
}

impl NetBoxAdapter {
    /// Build from `NETBOX_URL`, `NETBOX_TOKEN` (+ optional `NETBOX_VERIFY_SSL`).
    pub fn from_env(env: &EnvSource) -> Result<Self, ClientError> {
        let url = env.required("NETBOX_URL")?;
        let token = env.required("NETBOX_TOKEN")?;
        let verify_ssl = env.flag("NETBOX_VERIFY_SSL", true);

        let redactor = Redactor::new([token.clone()]);
        let client = HttpClientBuilder::new(
            format!("{}/api", url.trim_end_matches('/')),
            AuthScheme::Token { token },
        )
        .verify_ssl(verify_ssl)
        .redactor(redactor)
        .build();

        Ok(Self { client })
    }

    async fn list(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<Value, ClientError> {
        self.client.get(&format!("/{endpoint}/"), &query).await
    }

    async fn detail(&self, endpoint: &str, id: u64) -> Result<Value, ClientError> {
        self.client.get(&format!("/{endpoint}/{id}/"), &[]).await
    }
}

/// Collection endpoints the generic `search_objects`/`update_object`/
/// `delete_object` tools may address.
const ENDPOINTS: &[&str] = &[
    "dcim/sites",
    "dcim/devices",
    "dcim/device-types",
    "dcim/interfaces",
    "ipam/ip-addresses",
    "ipam/prefixes",
    "ipam/vlans",
];

fn validate_endpoint(endpoint: &str) -> Result<(), ClientError> {
    if ENDPOINTS.contains(&endpoint) {
        Ok(())
    } else {
        Err(ClientError::InvalidArgument(format!(
            "unknown endpoint '{}'; expected one of: {}",
            endpoint,
            ENDPOINTS.join(", ")
        )))
    }
}

#[async_trait]
impl Adapter for NetBoxAdapter {
    fn name(&self) -> &'static str {
        "netbox"
    }

    fn tool_definitions(&self) -> Vec<Value> {
        let id_schema = |desc: &str| {
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": desc }
                },
                "required": ["id"],
                "additionalProperties": false
            })
        };

        vec![
            json!({
                "name": "get_sites",
                "description": "List sites from NetBox.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum results. Default 50." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_site_by_id",
                "description": "Get a specific site.",
                "inputSchema": id_schema("Site ID.")
            }),
            json!({
                "name": "create_site",
                "description": "Create a site.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Site name." },
                        "slug": { "type": "string", "description": "URL-safe site slug." },
                        "status": { "type": "string", "description": "Site status. Default 'active'." },
                        "description": { "type": "string", "description": "Free-form description." }
                    },
                    "required": ["name", "slug"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_devices",
                "description": "List devices, optionally restricted to a site.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum results. Default 50." },
                        "site_id": { "type": "integer", "description": "Restrict to a site." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_device_by_id",
                "description": "Get a specific device.",
                "inputSchema": id_schema("Device ID.")
            }),
            json!({
                "name": "create_device",
                "description": "Create a device.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Device name." },
                        "device_type_id": { "type": "integer", "description": "Device type ID." },
                        "site_id": { "type": "integer", "description": "Site ID." },
                        "status": { "type": "string", "description": "Device status. Default 'active'." }
                    },
                    "required": ["name", "device_type_id", "site_id"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_device_types",
                "description": "List device types, optionally restricted to a manufacturer.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum results. Default 50." },
                        "manufacturer_id": { "type": "integer", "description": "Restrict to a manufacturer." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_ip_addresses",
                "description": "List IP addresses, optionally restricted to a VRF.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum results. Default 50." },
                        "vrf_id": { "type": "integer", "description": "Restrict to a VRF." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "create_ip_address",
                "description": "Create an IP address.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "address": { "type": "string", "description": "Address with prefix length, e.g. '10.0.0.1/24'." },
                        "status": { "type": "string", "description": "Status. Default 'active'." },
                        "description": { "type": "string", "description": "Free-form description." }
                    },
                    "required": ["address"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_prefixes",
                "description": "List prefixes, optionally restricted to a VRF.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum results. Default 50." },
                        "vrf_id": { "type": "integer", "description": "Restrict to a VRF." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "get_vlans",
                "description": "List VLANs, optionally restricted to a site.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum results. Default 50." },
                        "site_id": { "type": "integer", "description": "Restrict to a site." }
                    },
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "search_objects",
                "description": "Full-text search within one collection endpoint.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "endpoint": { "type": "string", "description": "Collection endpoint, e.g. 'dcim/devices'." },
                        "query": { "type": "string", "description": "Search string." },
                        "limit": { "type": "integer", "description": "Maximum results. Default 25." }
                    },
                    "required": ["endpoint", "query"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "update_object",
                "description": "Partially update an object in a collection endpoint.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "endpoint": { "type": "string", "description": "Collection endpoint, e.g. 'dcim/devices'." },
                        "object_id": { "type": "integer", "description": "Object ID." },
                        "data": { "type": "object", "description": "Fields to change, passed through to NetBox unchanged." }
                    },
                    "required": ["endpoint", "object_id", "data"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "delete_object",
                "description": "Delete an object from a collection endpoint.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "endpoint": { "type": "string", "description": "Collection endpoint, e.g. 'dcim/devices'." },
                        "object_id": { "type": "integer", "description": "Object ID." }
                    },
                    "required": ["endpoint", "object_id"],
                    "additionalProperties": false
                }
            }),
        ]
    }

    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
        match name {
            "get_sites" => {
                let limit = optional_u64(args, "limit").unwrap_or(50);
                let query = vec![("limit".to_string(), limit.to_string())];
                ToolResult::from_call(self.list("dcim/sites", query).await)
            }
            "get_site_by_id" => match optional_u64(args, "id") {
                Some(id) => ToolResult::from_call(self.detail("dcim/sites", id).await),
                None => ToolResult::error("invalid argument: missing required parameter: id".into()),
            },
            "create_site" => {
                let (name_arg, slug) = match (required_str(args, "name"), required_str(args, "slug"))
                {
                    (Ok(n), Ok(s)) => (n, s),
                    (Err(e), _) | (_, Err(e)) => return ToolResult::error(e.to_string()),
                };
                let body = json!({
                    "name": name_arg,
                    "slug": slug,
                    "status": optional_str(args, "status").unwrap_or("active"),
                    "description": optional_str(args, "description").unwrap_or(""),
                });
                ToolResult::from_call(self.client.post("/dcim/sites/", &body).await)
            }
            "get_devices" => {
                let mut query = vec![(
                    "limit".to_string(),
                    optional_u64(args, "limit").unwrap_or(50).to_string(),
                )];
                push_opt(&mut query, "site_id", optional_u64(args, "site_id"));
                ToolResult::from_call(self.list("dcim/devices", query).await)
            }
            "get_device_by_id" => match optional_u64(args, "id") {
                Some(id) => ToolResult::from_call(self.detail("dcim/devices", id).await),
                None => ToolResult::error("invalid argument: missing required parameter: id".into()),
            },
            "create_device" => {
                let name_arg = match required_str(args, "name") {
                    Ok(n) => n,
                    Err(e) => return ToolResult::error(e.to_string()),
                };
                let (device_type, site) = match (
                    optional_u64(args, "device_type_id"),
                    optional_u64(args, "site_id"),
                ) {
                    (Some(d), Some(s)) => (d, s),
                    _ => {
                        return ToolResult::error(
                            "invalid argument: device_type_id and site_id are required".into(),
                        )
                    }
                };
                let body = json!({
                    "name": name_arg,
                    "device_type": device_type,
                    "site": site,
                    "status": optional_str(args, "status").unwrap_or("active"),
                });
                ToolResult::from_call(self.client.post("/dcim/devices/", &body).await)
            }
            "get_device_types" => {
                let mut query = vec![(
                    "limit".to_string(),
                    optional_u64(args, "limit").unwrap_or(50).to_string(),
                )];
                push_opt(
                    &mut query,
                    "manufacturer_id",
                    optional_u64(args, "manufacturer_id"),
                );
                ToolResult::from_call(self.list("dcim/device-types", query).await)
            }
            "get_ip_addresses" => {
                let mut query = vec![(
                    "limit".to_string(),
                    optional_u64(args, "limit").unwrap_or(50).to_string(),
                )];
                push_opt(&mut query, "vrf_id", optional_u64(args, "vrf_id"));
                ToolResult::from_call(self.list("ipam/ip-addresses", query).await)
            }
            "create_ip_address" => match required_str(args, "address") {
                Ok(address) => {
                    let body = json!({
                        "address": address,
                        "status": optional_str(args, "status").unwrap_or("active"),
                        "description": optional_str(args, "description").unwrap_or(""),
                    });
                    ToolResult::from_call(self.client.post("/ipam/ip-addresses/", &body).await)
                }
                Err(e) => ToolResult::error(e.to_string()),
            },
            "get_prefixes" => {
                let mut query = vec![(
                    "limit".to_string(),
                    optional_u64(args, "limit").unwrap_or(50).to_string(),
                )];
                push_opt(&mut query, "vrf_id", optional_u64(args, "vrf_id"));
                ToolResult::from_call(self.list("ipam/prefixes", query).await)
            }
            "get_vlans" => {
                let mut query = vec![(
                    "limit".to_string(),
                    optional_u64(args, "limit").unwrap_or(50).to_string(),
                )];
                push_opt(&mut query, "site_id", optional_u64(args, "site_id"));
                ToolResult::from_call(self.list("ipam/vlans", query).await)
            }
            "search_objects" => {
                let (endpoint, search) =
                    match (required_str(args, "endpoint"), required_str(args, "query")) {
                        (Ok(e), Ok(q)) => (e, q),
                        (Err(e), _) | (_, Err(e)) => return ToolResult::error(e.to_string()),
                    };
                if let Err(e) = validate_endpoint(endpoint) {
                    return ToolResult::error(e.to_string());
                }
                let query = vec![
                    ("q".to_string(), search.to_string()),
                    (
                        "limit".to_string(),
                        optional_u64(args, "limit").unwrap_or(25).to_string(),
                    ),
                ];
                ToolResult::from_call(self.list(endpoint, query).await)
            }
            "update_object" => {
                let endpoint = match required_str(args, "endpoint") {
                    Ok(e) => e,
                    Err(e) => return ToolResult::error(e.to_string()),
                };
                if let Err(e) = validate_endpoint(endpoint) {
                    return ToolResult::error(e.to_string());
                }
                let Some(id) = optional_u64(args, "object_id") else {
                    return ToolResult::error(
                        "invalid argument: missing required parameter: object_id".into(),
                    );
                };
                let Some(data) = args.get("data").filter(|v| v.is_object()) else {
                    return ToolResult::error("invalid argument: data must be an object".into());
                };
                ToolResult::from_call(
                    self.client
                        .patch(&format!("/{endpoint}/{id}/"), data)
                        .await,
                )
            }
            "delete_object" => {
                let endpoint = match required_str(args, "endpoint") {
                    Ok(e) => e,
                    Err(e) => return ToolResult::error(e.to_string()),
                };
                if let Err(e) = validate_endpoint(endpoint) {
                    return ToolResult::error(e.to_string());
                }
                let Some(id) = optional_u64(args, "object_id") else {
                    return ToolResult::error(
                        "invalid argument: missing required parameter: object_id".into(),
                    );
                };
                match self.client.delete(&format!("/{endpoint}/{id}/")).await {
                    Ok(_) => ToolResult::success(json!({ "deleted": true, "id": id })),
                    Err(e) => ToolResult::error(e.to_string()),
                }
            }
            _ => ToolResult::unknown_tool(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn adapter() -> NetBoxAdapter {
        let env = EnvSource::from_map(HashMap::from([
            ("NETBOX_URL".to_string(), "https://netbox.example.com/".to_string()),
            ("NETBOX_TOKEN".to_string(), "nbtoken".to_string()),
        ]));
        NetBoxAdapter::from_env(&env).unwrap()
    }

    #[test]
    fn base_url_gains_api_suffix() {
        assert_eq!(adapter().client.base_url(), "https://netbox.example.com/api");
    }

    #[test]
    fn endpoint_validation_rejects_arbitrary_paths() {
        assert!(validate_endpoint("dcim/devices").is_ok());
        assert!(validate_endpoint("extras/scripts").is_err());
        assert!(validate_endpoint("../admin").is_err());
    }

    #[tokio::test]
    async fn delete_requires_known_endpoint() {
        let result = adapter()
            .call_tool(
                "delete_object",
                &json!({ "endpoint": "virtualization/clusters", "object_id": 3 }),
            )
            .await;
        assert!(result.is_error);
        assert!(result.content[0]["text"]
            .as_str()
            .unwrap()
            .contains("unknown endpoint"));
    }

    #[test]
    fn fourteen_tools_are_exposed() {
        assert_eq!(adapter().tool_definitions().len(), 14);
    }
}
