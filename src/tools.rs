//! Tool plumbing shared by every adapter.
//!
//! An [`Adapter`] exposes one upstream product as a set of named MCP tools.
//! Each tool is defined as a JSON schema and handled by an async dispatch
//! that maps it to exactly one client call. Tool outcomes are folded into
//! [`ToolResult`] so the protocol layer always receives a well-formed
//! result, error or not.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ClientError;

/// One upstream product exposed as a set of named MCP tools.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short adapter name used in server info and log lines.
    fn name(&self) -> &'static str;

    /// All tool definitions (name, description, inputSchema).
    fn tool_definitions(&self) -> Vec<Value>;

    /// Execute a tool and return MCP content.
    async fn call_tool(&self, name: &str, args: &Value) -> ToolResult;
}

/// Result of an MCP tool call, ready to be serialized into a JSON-RPC
/// response.
pub struct ToolResult {
    /// MCP content blocks (typically a single `{"type":"text","text":"..."}`).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError`).
    pub is_error: bool,
}

impl ToolResult {
    /// Successful structured payload, pretty-printed for the agent.
    pub fn success(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_default();
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    /// Successful raw-text payload (SSH command output).
    pub fn text(text: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }

    /// Fold a client outcome into a tool result.
    pub fn from_call(outcome: Result<Value, ClientError>) -> Self {
        match outcome {
            Ok(value) => Self::success(value),
            Err(e) => Self::error(e.to_string()),
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::error(format!("Unknown tool: {name}"))
    }
}

/// A required string argument. Missing or non-string values are rejected
/// before any network call.
pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ClientError> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ClientError::InvalidArgument(format!("missing required parameter: {key}")))
}

pub fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub fn optional_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

/// Append `key=value` to a query list when the argument is present.
pub fn push_opt(query: &mut Vec<(String, String)>, key: &str, value: Option<impl ToString>) {
    if let Some(v) = value {
        query.push((key.to_string(), v.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_str_rejects_missing() {
        let args = json!({});
        let err = required_str(&args, "command").unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(err.to_string().contains("command"));
    }

    #[test]
    fn required_str_rejects_empty() {
        let args = json!({ "host": "" });
        assert!(required_str(&args, "host").is_err());
    }

    #[test]
    fn success_pretty_prints_payload() {
        let result = ToolResult::success(json!({ "response": [] }));
        assert!(!result.is_error);
        let text = result.content[0]["text"].as_str().unwrap();
        assert!(text.contains("\"response\""));
    }

    #[test]
    fn from_call_maps_errors() {
        let result = ToolResult::from_call(Err(ClientError::Upstream {
            status: 404,
            body: "not found".into(),
        }));
        assert!(result.is_error);
        let text = result.content[0]["text"].as_str().unwrap();
        assert!(text.contains("404"));
    }

    #[test]
    fn push_opt_skips_absent_values() {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", Some(100u64));
        push_opt(&mut query, "hostname", None::<String>);
        assert_eq!(query, vec![("limit".to_string(), "100".to_string())]);
    }
}
