use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use orderbook_core::IndexedOrder;

use super::context::AppContext;

/// A listing as printed by the query commands.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Listing<'a> {
    #[serde(flatten)]
    order: &'a IndexedOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_price: Option<String>,
}

async fn display_price(ctx: &AppContext, raw: u128) -> Option<String> {
    match ctx
        .resolver
        .to_human(ctx.settings.quote_token, U256::from(raw))
        .await
    {
        Ok(human) => Some(human),
        Err(e) => {
            warn!("Can't format price {}: {}", raw, e);
            None
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn status(ctx: &AppContext) -> Result<()> {
    let snapshot = ctx.indexer.snapshot().await?;
    print_json(&snapshot.stats())
}

pub async fn floor(ctx: &AppContext) -> Result<()> {
    let snapshot = ctx.indexer.snapshot().await?;
    match snapshot.floor_price() {
        Some(price) => match display_price(ctx, price).await {
            Some(human) => println!("{price} ({human})"),
            None => println!("{price}"),
        },
        None => println!("No active listing"),
    }
    Ok(())
}

pub async fn cheapest(ctx: &AppContext, count: usize) -> Result<()> {
    let snapshot = ctx.indexer.snapshot().await?;
    let mut listings = Vec::new();
    for order in snapshot.cheapest_n(count) {
        listings.push(Listing {
            order,
            display_price: display_price(ctx, order.order.price).await,
        });
    }
    print_json(&listings)
}

pub async fn orders(ctx: &AppContext, keys: &[B256]) -> Result<()> {
    let snapshot = ctx.indexer.snapshot().await?;
    let found = snapshot.orders_by_keys(keys);
    if found.len() < keys.len() {
        warn!("{} of {} keys are not indexed", keys.len() - found.len(), keys.len());
    }
    print_json(&found)
}

pub async fn token_uri(ctx: &AppContext, collection: Address, token_id: U256) -> Result<()> {
    match ctx.indexer.token_uri(collection, token_id).await {
        Some(uri) => println!("{uri}"),
        None => println!("No token URI available"),
    }
    Ok(())
}
