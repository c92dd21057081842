//! Pre-flight checks on a purchase intent.
//!
use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::debug;

use crate::interfaces::error::RiskError;
use crate::interfaces::order::IndexedOrder;
use crate::services::price::{DecimalsResolver, DecimalsSource};

pub const DEFAULT_MAX_QUANTITY: u32 = 5;

/// What the buyer asked for. Raw ceilings are in quote token units, the
/// `*_usdol` ceilings are human decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseIntent {
    pub quantity: u32,
    pub token_id: Option<U256>,
    pub max_unit_price: Option<U256>,
    pub max_total_price: Option<U256>,
    pub max_unit_price_usdol: Option<String>,
    pub max_total_usdol: Option<String>,
}

impl PurchaseIntent {
    fn uses_human_ceiling(&self) -> bool {
        (self.max_unit_price.is_none() && self.max_unit_price_usdol.is_some())
            || (self.max_total_price.is_none() && self.max_total_usdol.is_some())
    }
}

pub struct RiskChecker<S: DecimalsSource> {
    max_quantity: u32,
    allowlist: HashSet<Address>,
    quote_token: Address,
    resolver: Arc<DecimalsResolver<S>>,
}

impl<S: DecimalsSource> RiskChecker<S> {
    pub fn new(
        max_quantity: u32,
        allowlist: HashSet<Address>,
        quote_token: Address,
        resolver: Arc<DecimalsResolver<S>>,
    ) -> Self {
        Self {
            max_quantity,
            allowlist,
            quote_token,
            resolver,
        }
    }

    /// Rejects the intent with the first violated rule. Nothing is written;
    /// the decimals cache is only touched when a human ceiling applies.
    pub async fn check_risk(
        &self,
        intent: &PurchaseIntent,
        selected: &[IndexedOrder],
    ) -> Result<(), RiskError> {
        if intent.quantity > self.max_quantity {
            return Err(RiskError::QuantityExceeded {
                requested: intent.quantity,
                max: self.max_quantity,
            });
        }

        if !self.allowlist.is_empty() {
            if let Some(o) = selected
                .iter()
                .find(|o| !self.allowlist.contains(&o.order.nft.collection_address))
            {
                return Err(RiskError::CollectionNotAllowed {
                    collection: o.order.nft.collection_address,
                });
            }
        }

        let total = selected
            .iter()
            .fold(U256::ZERO, |acc, o| acc.saturating_add(U256::from(o.order.price)));

        if let Some(ceiling) = intent.max_unit_price {
            check_unit_ceiling(selected, ceiling)?;
        }
        if let Some(ceiling) = intent.max_total_price {
            check_total_ceiling(total, ceiling)?;
        }

        if intent.uses_human_ceiling() {
            if let (None, Some(human)) = (intent.max_unit_price, &intent.max_unit_price_usdol) {
                let ceiling = self.resolver.to_raw(self.quote_token, human).await?;
                check_unit_ceiling(selected, ceiling)?;
            }
            if let (None, Some(human)) = (intent.max_total_price, &intent.max_total_usdol) {
                let ceiling = self.resolver.to_raw(self.quote_token, human).await?;
                check_total_ceiling(total, ceiling)?;
            }
        }

        debug!(
            "Intent for {} order(s) totalling {} passed risk checks",
            selected.len(),
            total
        );
        Ok(())
    }
}

fn check_unit_ceiling(selected: &[IndexedOrder], ceiling: U256) -> Result<(), RiskError> {
    match selected.iter().find(|o| U256::from(o.order.price) > ceiling) {
        Some(o) => Err(RiskError::UnitPriceExceeded {
            order_key: o.order_key,
            price: U256::from(o.order.price),
            ceiling,
        }),
        None => Ok(()),
    }
}

fn check_total_ceiling(total: U256, ceiling: U256) -> Result<(), RiskError> {
    if total > ceiling {
        return Err(RiskError::TotalPriceExceeded { total, ceiling });
    }
    Ok(())
}
