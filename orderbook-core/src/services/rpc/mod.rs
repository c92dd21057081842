//! RPC access to the chain.
//!
//! The indexer, the decimals resolver and the matcher never talk to a
//! provider directly: they go through [`ChainClient`] / [`OrderExecutor`],
//! obtained from an [`RpcPool`] that handles endpoint failover.
pub mod alloy_client;
pub mod pool;

#[cfg(test)]
pub mod fake;

pub use alloy_client::{AlloyClient, AlloyConnector};
pub use pool::RpcPool;

use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use url::Url;

use crate::interfaces::error::ClientError;
use crate::interfaces::event::EventKind;
use crate::interfaces::order::Order;

/// Read access to the order-book deployment and the tokens it trades.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self) -> Result<u64, ClientError>;

    /// Raw order-book logs of one kind in `[from, to]`, unfiltered and unsorted.
    async fn logs(&self, kind: EventKind, from: u64, to: u64) -> Result<Vec<Log>, ClientError>;

    /// Full order tuple stored by the contract, `None` if the key is unknown.
    async fn order(&self, order_key: B256) -> Result<Option<Order>, ClientError>;

    async fn decimals(&self, token: Address) -> Result<u8, ClientError>;

    async fn token_uri(&self, collection: Address, token_id: U256) -> Result<String, ClientError>;
}

/// Mined transaction summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
    pub success: bool,
}

/// Write access, bound to the configured signing wallet.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    fn wallet_address(&self) -> Result<Address, ClientError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError>;

    /// Sends an approval and waits for its receipt.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ClientError>;

    /// Sends `matchOrder(sell, buy)` and waits for its receipt.
    async fn match_orders(&self, sell: &Order, buy: &Order) -> Result<TxOutcome, ClientError>;
}

/// Builds a client for one endpoint of the pool.
pub trait Connect: Send + Sync {
    type Client: ChainClient;

    fn connect(&self, url: &Url) -> Result<Self::Client, ClientError>;
}
