use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use sandbox_config::{ChainConfig, ServerConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod logs;
mod server;

use logs::LogCache;
use server::AppState;

#[derive(Parser, Debug)]
#[command(name = "sandbox-node", about = "Local contract sandbox server")]
struct NodeArgs {
    /// Address to bind the HTTP endpoint to
    #[arg(long, default_value_t = ServerConfig::default().bind_address)]
    bind: SocketAddr,

    /// Disable CORS headers on responses
    #[arg(long)]
    no_cors: bool,

    /// Chain identifier reported by chains this server creates
    #[arg(long, default_value_t = ChainConfig::default().chain_id)]
    chain_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = NodeArgs::parse();

    let logs = LogCache::new();
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("sandbox=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(logs.clone()),
        )
        .init();

    let server_config = ServerConfig {
        bind_address: args.bind,
        cors_enabled: !args.no_cors,
    };
    let chain_config = ChainConfig {
        chain_id: args.chain_id,
        ..ChainConfig::default()
    };

    let state = Arc::new(AppState::new(server_config, chain_config, logs));
    server::run(state).await
}
