//! Order-book indexing, risk gating and order matching for an on-chain NFT
//! marketplace.
//!
//! The [`OrderbookIndexer`] is the only writer of the persisted index. The
//! [`RiskChecker`] and the [`OrderMatcher`] read from it and share the same
//! [`RpcPool`] of endpoints.
pub mod helpers;
pub mod interfaces;
pub mod services;

pub use interfaces::error::{
    ClientError, DecodeError, IndexerError, MatchError, PoolError, PriceError, RiskError,
    StorageError, UnitsError,
};
pub use interfaces::order::{
    IndexState, IndexedOrder, NftInfo, Order, OrderStatus, SaleKind, Side,
};
pub use services::indexer::{
    IndexStats, IndexerSettings, OrderbookIndexer, OrderbookSnapshot, SyncReport,
};
pub use services::matcher::{MatcherSettings, OrderMatcher};
pub use services::price::{DecimalsResolver, DecimalsSource};
pub use services::risk::{PurchaseIntent, RiskChecker};
pub use services::rpc::{AlloyClient, AlloyConnector, RpcPool};
pub use services::storage::{IndexStore, JsonFileStore, MemoryStore};
