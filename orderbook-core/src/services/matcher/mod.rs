//! Takes a listed sell order by submitting the complementary buy order.
//!
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::helpers::time::unix_now;
use crate::interfaces::error::MatchError;
use crate::interfaces::order::{Order, Side};
use crate::services::rpc::{Connect, OrderExecutor, RpcPool};

pub const DEFAULT_BUY_ORDER_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct MatcherSettings {
    pub quote_token: Address,
    pub orderbook: Address,
    /// Approve `U256::MAX` instead of the exact price.
    pub unlimited_approval: bool,
    pub buy_order_ttl: Duration,
    /// Build everything, send nothing.
    pub dry_run: bool,
}

pub struct OrderMatcher<K: Connect> {
    pool: Arc<RpcPool<K>>,
    settings: MatcherSettings,
}

impl<K> OrderMatcher<K>
where
    K: Connect,
    K::Client: OrderExecutor,
{
    pub fn new(pool: Arc<RpcPool<K>>, settings: MatcherSettings) -> Self {
        Self { pool, settings }
    }

    /// Buys `sell`. Returns the match transaction hash, or `None` in dry run.
    pub async fn match_order(&self, sell: &Order) -> Result<Option<TxHash>, MatchError> {
        if sell.currency != self.settings.quote_token {
            return Err(MatchError::CurrencyMismatch {
                expected: self.settings.quote_token,
                actual: sell.currency,
            });
        }

        let client = self.pool.healthy().await?.client;
        let wallet = client.wallet_address()?;

        if self.settings.dry_run {
            let buy = self.build_buy_order(sell, wallet);
            info!(
                "Dry run: would match token {} of {} at {} with salt {}",
                buy.nft.token_id, buy.nft.collection_address, buy.price, buy.salt
            );
            return Ok(None);
        }

        self.ensure_allowance(&client, wallet, U256::from(sell.price))
            .await?;

        let buy = self.build_buy_order(sell, wallet);
        info!(
            "Matching token {} of {} at {}",
            sell.nft.token_id, sell.nft.collection_address, sell.price
        );
        let outcome = client.match_orders(sell, &buy).await?;
        if !outcome.success {
            warn!("Match transaction {} reverted", outcome.tx_hash);
            return Err(MatchError::Execution {
                tx_hash: outcome.tx_hash,
            });
        }

        info!("Match transaction {} mined", outcome.tx_hash);
        Ok(Some(outcome.tx_hash))
    }

    async fn ensure_allowance(
        &self,
        client: &K::Client,
        wallet: Address,
        price: U256,
    ) -> Result<(), MatchError> {
        let MatcherSettings {
            quote_token,
            orderbook,
            ..
        } = self.settings;

        let allowance = client.allowance(quote_token, wallet, orderbook).await?;
        if allowance >= price {
            debug!("Allowance {} covers price {}", allowance, price);
            return Ok(());
        }

        let amount = if self.settings.unlimited_approval {
            U256::MAX
        } else {
            price
        };
        info!("Approving {} of {} for the order book", amount, quote_token);
        let outcome = client.approve(quote_token, orderbook, amount).await?;
        if !outcome.success {
            warn!("Approval transaction {} reverted", outcome.tx_hash);
            return Err(MatchError::Execution {
                tx_hash: outcome.tx_hash,
            });
        }
        Ok(())
    }

    /// Mirror of `sell` on the buy side, made by `wallet`.
    pub fn build_buy_order(&self, sell: &Order, wallet: Address) -> Order {
        let salt = rand::thread_rng().gen_range(1..=u64::MAX);
        Order {
            side: Side::Buy,
            sale_kind: sell.sale_kind,
            maker: wallet,
            nft: sell.nft.clone(),
            price: sell.price,
            currency: sell.currency,
            expiry: unix_now().saturating_add(self.settings.buy_order_ttl.as_secs()),
            salt,
        }
    }
}
