//! Environment-based configuration.
//!
//! Every adapter reads its credentials and upstream location from the
//! environment, optionally seeded from a `.env` file in the working
//! directory. Missing required values fail startup immediately with a
//! message naming the variable — never a silent default.

use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

use crate::error::ClientError;

/// Snapshot of the process environment (or a test-supplied map).
///
/// Adapters read from a snapshot instead of `std::env` directly so
/// configuration parsing is testable without mutating process state.
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Capture the current process environment.
    pub fn process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from an explicit map. Used by tests.
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// A required variable. Missing or empty values are configuration errors.
    pub fn required(&self, key: &str) -> Result<String, ClientError> {
        match self.vars.get(key) {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            Some(_) => Err(ClientError::Config(format!("{key} is set but empty"))),
            None => Err(ClientError::Config(format!(
                "{key} environment variable is required"
            ))),
        }
    }

    /// An optional variable. Empty values count as absent.
    pub fn optional(&self, key: &str) -> Option<String> {
        self.vars.get(key).filter(|v| !v.is_empty()).cloned()
    }

    /// A boolean flag: `true`/`false` (case-insensitive), defaulting when unset.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.optional(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }
}

/// Load `KEY=VALUE` lines from a dotenv file into the process environment.
///
/// Lines starting with `#` and blank lines are skipped; surrounding single or
/// double quotes on values are stripped. Returns `false` (without error) when
/// the file does not exist — the environment alone may be sufficient.
pub fn load_dotenv(path: &Path) -> std::io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let contents = std::fs::read_to_string(path)?;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            // Real environment wins over .env file contents
            if std::env::var_os(key).is_none() {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(true)
}

/// Resolve the HTTP bind address from `--http`, or `MCP_HOST`/`MCP_PORT`.
///
/// Returns `None` when neither is configured — the adapter then serves MCP
/// over stdio.
pub fn resolve_http_bind(
    flag: Option<&str>,
    env: &EnvSource,
) -> Result<Option<SocketAddr>, ClientError> {
    let spec = match flag {
        Some(s) => Some(s.to_string()),
        None => env.optional("MCP_PORT").map(|port| {
            let host = env.optional("MCP_HOST").unwrap_or_else(|| "127.0.0.1".into());
            format!("{host}:{port}")
        }),
    };

    match spec {
        None => Ok(None),
        // to_socket_addrs so hostnames like "localhost:8002" resolve too
        Some(s) => s
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .map(Some)
            .ok_or_else(|| ClientError::Config(format!("invalid listen address: {s}"))),
    }
}
