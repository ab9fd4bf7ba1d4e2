//! Cisco IOS XE adapter.
//!
//! Direct SSH management of IOS XE devices: one tool for show commands, one
//! for configuration sequences (applied and then persisted with
//! `write memory`). Credentials are loaded from the environment only — tool
//! parameters never carry passwords, so they cannot leak into transcripts.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::EnvSource;
use crate::error::ClientError;
use crate::redact::Redactor;
use crate::ssh::{self, SshConfig};
use crate::tools::{required_str, Adapter, ToolResult};

/// Guidance appended to authentication failures so the agent can react
/// without re-trying the same credentials.
const AUTH_GUIDANCE: &str = "Authentication to device failed.\n\n\
    Common causes:\n\
    1. Invalid credentials in environment\n\
    2. Device SSH configuration\n\
    3. Network connectivity\n";

#[derive(Debug)]
pub struct IosXeAdapter {
    config: SshConfig,
    redactor: Redactor,
}

impl IosXeAdapter {
    /// Build from `IOS_XE_USERNAME` and `IOS_XE_PASSWORD`.
    pub fn from_env(env: &EnvSource) -> Result<Self, ClientError> {
        let username = env.required("IOS_XE_USERNAME")?;
        let password = env.required("IOS_XE_PASSWORD")?;

        let redactor = Redactor::new([password.clone()]);
        Ok(Self {
            config: SshConfig::new(username, password),
            redactor,
        })
    }

    fn render_error(&self, host: &str, err: &ClientError) -> String {
        let message = self.redactor.scrub(&err.to_string());
        if err.is_auth() {
            format!("{AUTH_GUIDANCE}\nDevice: {host}:22\n\n{message}")
        } else {
            message
        }
    }
}

#[async_trait]
impl Adapter for IosXeAdapter {
    fn name(&self) -> &'static str {
        "ios-xe"
    }

    fn tool_definitions(&self) -> Vec<Value> {
        vec![
            json!({
                "name": "show_command",
                "description": "Execute a 'show' command via SSH on an IOS XE device and return the output. Credentials come from the server environment; no password parameters are accepted.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "command": { "type": "string", "description": "Show command to execute, e.g. 'show ip interface brief'." },
                        "host": { "type": "string", "description": "IP address or hostname of the IOS XE device." }
                    },
                    "required": ["command", "host"],
                    "additionalProperties": false
                }
            }),
            json!({
                "name": "config_command",
                "description": "Send configuration commands via SSH to an IOS XE device and save the running config with 'write memory'. Credentials come from the server environment; no password parameters are accepted.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "commands": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Ordered configuration commands, e.g. ['interface gi0/1', 'no shutdown']."
                        },
                        "host": { "type": "string", "description": "IP address or hostname of the IOS XE device." }
                    },
                    "required": ["commands", "host"],
                    "additionalProperties": false
                }
            }),
        ]
    }

    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult {
        match name {
            "show_command" => {
                let (command, host) = match (required_str(args, "command"), required_str(args, "host")) {
                    (Ok(c), Ok(h)) => (c.to_string(), h.to_string()),
                    (Err(e), _) | (_, Err(e)) => return ToolResult::error(e.to_string()),
                };

                match ssh::run_command(
                    host.clone(),
                    command,
                    self.config.clone(),
                    self.redactor.clone(),
                )
                .await
                {
                    Ok(output) => ToolResult::text(output),
                    Err(e) => ToolResult::error(self.render_error(&host, &e)),
                }
            }
            "config_command" => {
                let host = match required_str(args, "host") {
                    Ok(h) => h.to_string(),
                    Err(e) => return ToolResult::error(e.to_string()),
                };
                let commands: Vec<String> = match args.get("commands").and_then(Value::as_array) {
                    Some(list) if !list.is_empty() => {
                        match list
                            .iter()
                            .map(|v| v.as_str().map(String::from))
                            .collect::<Option<Vec<_>>>()
                        {
                            Some(commands) => commands,
                            None => {
                                return ToolResult::error(
                                    "invalid argument: commands must be a list of strings".into(),
                                )
                            }
                        }
                    }
                    _ => {
                        return ToolResult::error(
                            "invalid argument: commands must be a non-empty list".into(),
                        )
                    }
                };

                match ssh::run_config(
                    host.clone(),
                    commands,
                    self.config.clone(),
                    self.redactor.clone(),
                )
                .await
                {
                    Ok(transcript) => ToolResult::text(format!(
                        "Configuration applied to {host}:\n{transcript}"
                    )),
                    Err(e) => ToolResult::error(self.render_error(&host, &e)),
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

    fn adapter() -> IosXeAdapter {
        let env = EnvSource::from_map(HashMap::from([
            ("IOS_XE_USERNAME".to_string(), "netadmin".to_string()),
            ("IOS_XE_PASSWORD".to_string(), "hunter2secret".to_string()),
        ]));
        IosXeAdapter::from_env(&env).unwrap()
    }

    #[test]
    fn from_env_requires_both_credentials() {
        let env = EnvSource::from_map(HashMap::from([(
            "IOS_XE_USERNAME".to_string(),
            "netadmin".to_string(),
        )]));
        assert!(matches!(
            IosXeAdapter::from_env(&env).unwrap_err(),
            ClientError::Config(_)
        ));
    }

    #[tokio::test]
    async fn show_command_requires_host() {
        let result = adapter()
            .call_tool("show_command", &json!({ "command": "show version" }))
            .await;
        assert!(result.is_error);
        assert!(result.content[0]["text"].as_str().unwrap().contains("host"));
    }

    #[tokio::test]
    async fn config_command_rejects_empty_list() {
        let result = adapter()
            .call_tool(
                "config_command",
                &json!({ "host": "10.0.0.1", "commands": [] }),
            )
            .await;
        assert!(result.is_error);
        assert!(result.content[0]["text"]
            .as_str()
            .unwrap()
            .contains("non-empty"));
    }

    #[tokio::test]
    async fn config_command_rejects_non_string_entries() {
        let result = adapter()
            .call_tool(
                "config_command",
                &json!({ "host": "10.0.0.1", "commands": [42] }),
            )
            .await;
        assert!(result.is_error);
    }

    #[test]
    fn auth_errors_never_leak_the_password() {
        let adapter = adapter();
        let err = ClientError::Auth(
            "SSH authentication failed: server said 'hunter2secret rejected'".into(),
        );
        let rendered = adapter.render_error("10.0.0.1", &err);
        assert!(!rendered.contains("hunter2secret"));
        assert!(rendered.contains("Authentication to device failed"));
    }
}
