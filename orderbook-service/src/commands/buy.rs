use anyhow::{bail, Result};
use tracing::{info, warn};

use orderbook_core::{IndexedOrder, OrderbookSnapshot, PurchaseIntent};

use super::context::AppContext;
use super::BuyArgs;

impl From<&BuyArgs> for PurchaseIntent {
    fn from(args: &BuyArgs) -> Self {
        PurchaseIntent {
            quantity: args.quantity,
            token_id: args.token_id,
            max_unit_price: args.max_unit_price,
            max_total_price: args.max_total_price,
            max_unit_price_usdol: args.max_unit_usdol.clone(),
            max_total_usdol: args.max_total_usdol.clone(),
        }
    }
}

/// The listing for the requested token, or the `quantity` cheapest ones.
pub fn select_orders(snapshot: &OrderbookSnapshot, intent: &PurchaseIntent) -> Vec<IndexedOrder> {
    match intent.token_id {
        Some(token_id) => snapshot
            .cheapest_for_token_id(token_id)
            .into_iter()
            .cloned()
            .collect(),
        None => snapshot
            .cheapest_n(intent.quantity as usize)
            .into_iter()
            .cloned()
            .collect(),
    }
}

/// Select, risk check, then match each order in turn. Stops at the first
/// failure; orders already matched stay matched.
pub async fn run(ctx: &AppContext, args: &BuyArgs) -> Result<()> {
    let intent = PurchaseIntent::from(args);
    let snapshot = ctx.indexer.snapshot().await?;

    let selected = select_orders(&snapshot, &intent);
    if selected.is_empty() {
        bail!("No active listing matches the request");
    }
    if intent.token_id.is_none() && selected.len() < intent.quantity as usize {
        warn!(
            "Only {} of {} requested listings are available",
            selected.len(),
            intent.quantity
        );
    }

    ctx.risk.check_risk(&intent, &selected).await?;

    let matcher = ctx.matcher(args.dry_run);
    for order in &selected {
        match matcher.match_order(&order.order).await? {
            Some(tx_hash) => {
                info!("Bought order {} in {}", order.order_key, tx_hash);
                println!("{} {}", order.order_key, tx_hash);
            }
            None => println!("{} dry-run", order.order_key),
        }
    }
    Ok(())
}
