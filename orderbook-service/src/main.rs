pub mod commands;
pub mod helpers;
pub mod interfaces;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use commands::context::AppContext;
use commands::{buy, query, sync, Cli, Command};
use interfaces::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    init_logging();

    let cli = Cli::parse();
    let settings = match Config::from_env().and_then(Config::validate) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "Order book {} on chain {} with {} RPC endpoint(s)",
        settings.orderbook,
        settings.chain_id,
        settings.rpc_urls.len()
    );

    let ctx = AppContext::new(settings);
    match cli.command {
        Command::Sync => sync::run_once(&ctx).await,
        Command::Watch => sync::watch(&ctx).await,
        Command::Status => query::status(&ctx).await,
        Command::Floor => query::floor(&ctx).await,
        Command::Cheapest { count } => query::cheapest(&ctx, count).await,
        Command::Order { keys } => query::orders(&ctx, &keys).await,
        Command::TokenUri {
            collection,
            token_id,
        } => query::token_uri(&ctx, collection, token_id).await,
        Command::Buy(args) => buy::run(&ctx, &args).await,
    }
}

fn init_logging() {
    const DEFAULT_LOG_FILTER: &str = "info,orderbook_core=debug";

    tracing::subscriber::set_global_default(
        fmt::Subscriber::builder()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .or(EnvFilter::try_new(DEFAULT_LOG_FILTER))
                    .expect("Invalid RUST_LOG filters"),
            )
            .finish(),
    )
    .expect("Failed to set the global tracing subscriber");
}
