//! Transaction console main entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use txconsole_api::start_server;
use txconsole_config::{Config, API_ENDPOINT_ENV};
use txconsole_core::{GatewayRef, HttpGateway, MemoryGateway};

#[derive(Parser, Debug)]
#[command(name = "txconsole")]
#[command(version = "0.1.0")]
#[command(about = "Admin console for reviewing and editing bank transactions", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    /// Base URL of the transaction API
    #[arg(long, env = API_ENDPOINT_ENV)]
    api_endpoint: Option<String>,

    /// Serve bundled demo data instead of calling the transaction API
    #[arg(long)]
    demo: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = Config::load_or_default(&args.config)
        .map_err(|e| anyhow::anyhow!("{}", e.to_details()))?
        .with_api_endpoint(args.api_endpoint.clone());
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("{}", e.to_details()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();
    log::info!("Config loaded from {}", args.config.display());

    let gateway: GatewayRef = if args.demo {
        log::warn!("Demo mode: serving bundled transactions, nothing is sent to a transaction API");
        Arc::new(MemoryGateway::with_demo_data().context("Failed to load demo data")?)
    } else {
        let endpoint = config
            .require_endpoint()
            .map_err(|e| anyhow::anyhow!("{}", e.to_details()))?;
        log::info!("Using transaction API at {}", endpoint);
        Arc::new(HttpGateway::new(endpoint, Duration::from_secs(config.api.timeout_secs))?)
    };

    let rt = Runtime::new()?;
    rt.block_on(start_server(config, gateway))
        .context("Server error")?;
    Ok(())
}
