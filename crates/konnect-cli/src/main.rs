//! Konnect terminal client binary.
//!
//! # Usage
//!
//! ```bash
//! # Local development services
//! konnect
//!
//! # Remote services
//! konnect --api-url https://chat.example.com/api --ws-url wss://chat.example.com
//! ```

use std::path::PathBuf;

use clap::Parser;
use konnect_client::{
    ClientConfig,
    config::{DEFAULT_API_URL, DEFAULT_WS_URL, default_state_path},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Konnect group chat client
#[derive(Parser, Debug)]
#[command(name = "konnect")]
#[command(about = "Terminal client for Konnect group chat")]
#[command(version)]
struct Args {
    /// Directory service base URL
    #[arg(long, env = "KONNECT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Chat server base URL
    #[arg(long, env = "KONNECT_WS_URL", default_value = DEFAULT_WS_URL)]
    ws_url: String,

    /// File the display name is stored in
    #[arg(long, env = "KONNECT_STATE")]
    state: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = ClientConfig {
        api_url: args.api_url,
        ws_url: args.ws_url,
        state_path: args.state.unwrap_or_else(default_state_path),
    };

    konnect_cli::run(config).await?;
    Ok(())
}
