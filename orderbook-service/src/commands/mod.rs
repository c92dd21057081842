//! Command line surface of the service.
//!
pub mod buy;
pub mod context;
pub mod query;
pub mod sync;

use alloy::primitives::{Address, B256, U256};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "orderbook", version, about = "NFT order-book indexer and matcher")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one sync pass up to the chain head.
    Sync,
    /// Sync on a fixed interval until interrupted.
    Watch,
    /// Print index statistics.
    Status,
    /// Print the floor price of active listings.
    Floor,
    /// Print the cheapest active listings.
    Cheapest {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Print indexed orders by key, whatever their status.
    Order {
        #[arg(required = true)]
        keys: Vec<B256>,
    },
    /// Print the metadata URI of a token.
    TokenUri {
        #[arg(long)]
        collection: Address,
        #[arg(long)]
        token_id: U256,
    },
    /// Risk check and buy the cheapest matching listings.
    Buy(BuyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuyArgs {
    #[arg(long, default_value_t = 1)]
    pub quantity: u32,
    /// Buy this token only.
    #[arg(long)]
    pub token_id: Option<U256>,
    /// Per-unit ceiling in raw quote token units.
    #[arg(long)]
    pub max_unit_price: Option<U256>,
    /// Total ceiling in raw quote token units.
    #[arg(long)]
    pub max_total_price: Option<U256>,
    /// Per-unit ceiling as a decimal amount of the quote token.
    #[arg(long)]
    pub max_unit_usdol: Option<String>,
    /// Total ceiling as a decimal amount of the quote token.
    #[arg(long)]
    pub max_total_usdol: Option<String>,
    /// Build the orders without sending any transaction.
    #[arg(long)]
    pub dry_run: bool,
}
