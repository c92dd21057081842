use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::error::DecodeError;

/// Maker side of an order. Only sell orders are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Sell,
    Buy,
}

impl Side {
    pub fn as_u8(self) -> u8 {
        match self {
            Side::Sell => 0,
            Side::Buy => 1,
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::Sell),
            1 => Ok(Side::Buy),
            value => Err(DecodeError::InvalidField {
                field: "side",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaleKind {
    FixedPriceForCollection,
    FixedPriceForItem,
}

impl SaleKind {
    pub fn as_u8(self) -> u8 {
        match self {
            SaleKind::FixedPriceForCollection => 0,
            SaleKind::FixedPriceForItem => 1,
        }
    }
}

impl TryFrom<u8> for SaleKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SaleKind::FixedPriceForCollection),
            1 => Ok(SaleKind::FixedPriceForItem),
            value => Err(DecodeError::InvalidField {
                field: "saleKind",
                value,
            }),
        }
    }
}

macro_rules! impl_decimal_repr {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_u8())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: u8 = s.parse().map_err(|e| format!("{s:?}: {e}"))?;
                <$ty>::try_from(value).map_err(|e| e.to_string())
            }
        }
    };
}

impl_decimal_repr!(Side);
impl_decimal_repr!(SaleKind);

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftInfo {
    #[serde_as(as = "DisplayFromStr")]
    pub token_id: U256,
    pub collection_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
}

/// An order as stored by the order-book contract. Numeric fields are
/// persisted as decimal strings.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde_as(as = "DisplayFromStr")]
    pub side: Side,
    #[serde_as(as = "DisplayFromStr")]
    pub sale_kind: SaleKind,
    pub maker: Address,
    pub nft: NftInfo,
    #[serde_as(as = "DisplayFromStr")]
    pub price: u128,
    pub currency: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub expiry: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub salt: u64,
}

impl Order {
    /// Sell orders priced per item are the only ones this marketplace lists.
    pub fn is_listed_item(&self) -> bool {
        self.side == Side::Sell && self.sale_kind == SaleKind::FixedPriceForItem
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiry != 0 && self.expiry <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Cancelled,
    Filled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "open"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Filled => write!(f, "filled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedOrder {
    pub order_key: B256,
    pub order: Order,
    pub status: OrderStatus,
    pub first_seen_block: u64,
    pub last_update_block: u64,
}

/// Outcome of applying one lifecycle event to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    AlreadyTerminal(OrderStatus),
    UnknownOrder,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexState {
    pub chain_id: u64,
    #[serde(rename = "orderbook")]
    pub orderbook_address: Address,
    pub last_scanned_block: u64,
    #[serde_as(as = "BTreeMap<DisplayFromStr, _>")]
    pub orders_by_key: BTreeMap<B256, IndexedOrder>,
}

impl IndexState {
    pub fn new(chain_id: u64, orderbook_address: Address, last_scanned_block: u64) -> Self {
        Self {
            chain_id,
            orderbook_address,
            last_scanned_block,
            orders_by_key: BTreeMap::new(),
        }
    }

    /// Order keys are only meaningful for the deployment that assigned them.
    pub fn belongs_to(&self, chain_id: u64, orderbook_address: Address) -> bool {
        self.chain_id == chain_id && self.orderbook_address == orderbook_address
    }

    /// Inserts a freshly made order, or refreshes an open one on re-scan.
    /// `first_seen_block` and terminal statuses are never overwritten.
    pub fn upsert_made(&mut self, order_key: B256, order: Order, block: u64) -> Transition {
        match self.orders_by_key.get_mut(&order_key) {
            Some(existing) if existing.status.is_terminal() => {
                Transition::AlreadyTerminal(existing.status)
            }
            Some(existing) => {
                existing.order = order;
                existing.last_update_block = existing.last_update_block.max(block);
                Transition::Applied
            }
            None => {
                self.orders_by_key.insert(
                    order_key,
                    IndexedOrder {
                        order_key,
                        order,
                        status: OrderStatus::Open,
                        first_seen_block: block,
                        last_update_block: block,
                    },
                );
                Transition::Applied
            }
        }
    }

    pub fn mark_cancelled(&mut self, order_key: &B256, block: u64) -> Transition {
        self.close(order_key, OrderStatus::Cancelled, block)
    }

    pub fn mark_filled(&mut self, order_key: &B256, block: u64) -> Transition {
        self.close(order_key, OrderStatus::Filled, block)
    }

    fn close(&mut self, order_key: &B256, status: OrderStatus, block: u64) -> Transition {
        match self.orders_by_key.get_mut(order_key) {
            None => Transition::UnknownOrder,
            Some(existing) if existing.status.is_terminal() => {
                Transition::AlreadyTerminal(existing.status)
            }
            Some(existing) => {
                existing.status = status;
                existing.last_update_block = block;
                Transition::Applied
            }
        }
    }

    pub fn count_by_status(&self, status: OrderStatus) -> usize {
        self.orders_by_key
            .values()
            .filter(|o| o.status == status)
            .count()
    }
}
