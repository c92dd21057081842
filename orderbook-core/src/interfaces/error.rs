use alloy::primitives::{Address, TxHash, B256, U256};

/// Errors raised by a single RPC client, before any failover.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid RPC url: {0}")]
    InvalidUrl(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Contract call error: {0}")]
    Contract(String),
    #[error("No signing key configured")]
    MissingSigner,
    #[error("Invalid value conversion: {0}")]
    Conversion(String),
}

/// Errors of the RPC endpoint pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("No healthy RPC endpoint among {tried} configured")]
    NoHealthyEndpoint { tried: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Index file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Index file serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A log the indexer could not turn into an [`crate::interfaces::event::OrderbookEvent`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Log has no topic0")]
    MissingTopic,
    #[error("Unknown event signature {0}")]
    UnknownSignature(B256),
    #[error("Log is not mined yet (no block number)")]
    MissingBlockNumber,
    #[error("ABI decoding failed: {0}")]
    Abi(String),
    #[error("Invalid {field} value {value}")]
    InvalidField { field: &'static str, value: u8 },
}

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("Malformed amount: {0:?}")]
    MalformedAmount(String),
    #[error("Unsupported decimals: {0}")]
    UnsupportedDecimals(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Reasons a purchase intent is rejected before anything is sent on-chain.
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("Requested quantity {requested} exceeds the maximum of {max}")]
    QuantityExceeded { requested: u32, max: u32 },
    #[error("Collection {collection} is not in the allow-list")]
    CollectionNotAllowed { collection: Address },
    #[error("Order {order_key} price {price} exceeds the unit ceiling {ceiling}")]
    UnitPriceExceeded {
        order_key: B256,
        price: U256,
        ceiling: U256,
    },
    #[error("Total price {total} exceeds the ceiling {ceiling}")]
    TotalPriceExceeded { total: U256, ceiling: U256 },
    #[error(transparent)]
    Units(#[from] UnitsError),
    #[error("Could not resolve quote token decimals: {0}")]
    Price(#[from] PriceError),
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("Order currency {actual} does not match the quote token {expected}")]
    CurrencyMismatch { expected: Address, actual: Address },
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Transaction {tx_hash} reverted on-chain")]
    Execution { tx_hash: TxHash },
}
