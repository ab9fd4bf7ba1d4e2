//! netmcp entry point: one subcommand per adapter, MCP over stdio or HTTP.
//!
//! Credentials come from the environment (a `./.env` file is loaded first
//! when present). Each adapter documents its variables; missing required
//! values abort startup with a message naming the variable. `MCP_HOST` /
//! `MCP_PORT` or `--http HOST:PORT` switch from stdio to the HTTP transport.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use netmcp::adapters::catalyst::CatalystAdapter;
use netmcp::adapters::ios_xe::IosXeAdapter;
use netmcp::adapters::ise::IseAdapter;
use netmcp::adapters::meraki::MerakiAdapter;
use netmcp::adapters::netbox::NetBoxAdapter;
use netmcp::adapters::splunk::SplunkAdapter;
use netmcp::adapters::thousandeyes::ThousandEyesAdapter;
use netmcp::config::{self, EnvSource};
use netmcp::error::ClientError;
use netmcp::mcp;
use netmcp::tools::Adapter;

/// MCP adapter servers for network management and observability platforms.
#[derive(Parser)]
#[command(name = "netmcp", version)]
struct Cli {
    #[command(subcommand)]
    adapter: AdapterCommand,

    /// Serve MCP over HTTP on HOST:PORT instead of stdio.
    /// MCP_HOST/MCP_PORT environment variables work too.
    #[arg(long, value_name = "HOST:PORT", global = true)]
    http: Option<String>,

    /// Path to a dotenv file (defaults to ./.env when present).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum AdapterCommand {
    /// Cisco Catalyst Center (CATC_URL, CATC_USERNAME, CATC_PASSWORD)
    Catalyst,
    /// Cisco ISE ERS API (ISE_HOST, ISE_USERNAME, ISE_PASSWORD)
    Ise,
    /// Cisco IOS XE devices over SSH (IOS_XE_USERNAME, IOS_XE_PASSWORD)
    IosXe,
    /// Cisco Meraki Dashboard (MERAKI_KEY, MCP_ROLE)
    Meraki,
    /// Splunk MCP backend (SPLUNK_HOST, SPLUNK_API_KEY)
    Splunk,
    /// Cisco ThousandEyes v7 API (TE_TOKEN)
    Thousandeyes,
    /// NetBox DCIM/IPAM (NETBOX_URL, NETBOX_TOKEN)
    Netbox,
}

fn build_adapter(
    command: &AdapterCommand,
    env: &EnvSource,
) -> Result<Arc<dyn Adapter>, ClientError> {
    Ok(match command {
        AdapterCommand::Catalyst => Arc::new(CatalystAdapter::from_env(env)?),
        AdapterCommand::Ise => Arc::new(IseAdapter::from_env(env)?),
        AdapterCommand::IosXe => Arc::new(IosXeAdapter::from_env(env)?),
        AdapterCommand::Meraki => Arc::new(MerakiAdapter::from_env(env)?),
        AdapterCommand::Splunk => Arc::new(SplunkAdapter::from_env(env)?),
        AdapterCommand::Thousandeyes => Arc::new(ThousandEyesAdapter::from_env(env)?),
        AdapterCommand::Netbox => Arc::new(NetBoxAdapter::from_env(env)?),
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env_file = cli
        .env_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(".env"));
    if let Err(e) = config::load_dotenv(Path::new(&env_file)) {
        eprintln!("netmcp: failed to read {}: {e}", env_file.display());
        std::process::exit(1);
    }

    // Logs go to stderr — stdout is the stdio MCP channel.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let env = EnvSource::process();

    let adapter = match build_adapter(&cli.adapter, &env) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("netmcp: {e}");
            std::process::exit(1);
        }
    };

    let bind = match config::resolve_http_bind(cli.http.as_deref(), &env) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("netmcp: {e}");
            std::process::exit(1);
        }
    };

    info!(
        adapter = adapter.name(),
        version = env!("CARGO_PKG_VERSION"),
        "starting"
    );

    match bind {
        Some(addr) => mcp::serve_http(adapter, addr).await,
        None => mcp::run_stdio(adapter).await,
    }
}
