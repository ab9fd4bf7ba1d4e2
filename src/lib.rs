//! MCP adapter servers for network management and observability platforms.
//!
//! Each adapter exposes one upstream product (Cisco Catalyst Center, Cisco
//! ISE, IOS XE devices over SSH, Cisco Meraki Dashboard, Splunk, Cisco
//! ThousandEyes, NetBox) as a set of MCP tools, served over stdio or HTTP.
//!
//! ## Architecture
//!
//! ```text
//! main.rs       — entry point, subcommand per adapter, transport selection
//! config.rs     — .env loading, environment snapshot, fail-fast validation
//! client.rs     — authenticated HTTP client with 401 reauth + single replay
//! ssh.rs        — SSH command execution with scoped connection cleanup
//! error.rs      — ClientError taxonomy
//! redact.rs     — secret redaction for errors and logs
//! normalize.rs  — Meraki null-coercion rules
//! mcp.rs        — MCP JSON-RPC handler (stdio + axum HTTP)
//! tools.rs      — Adapter trait, ToolResult, argument helpers
//! adapters/     — one module per upstream product
//! ```

pub mod adapters;
pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod normalize;
pub mod redact;
pub mod ssh;
pub mod tools;

pub use client::{AuthScheme, HttpClient, HttpClientBuilder};
pub use error::ClientError;
pub use tools::{Adapter, ToolResult};
