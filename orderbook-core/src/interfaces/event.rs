use std::fmt;

use alloy::primitives::{Address, Uint, B256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::error::{ClientError, DecodeError};
use super::order::{NftInfo, Order, SaleKind, Side};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Asset {
        uint256 tokenId;
        address collection;
        uint96 amount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct RawOrder {
        uint8 side;
        uint8 saleKind;
        address maker;
        Asset nft;
        uint128 price;
        address currency;
        uint64 expiry;
        uint64 salt;
    }

    #[sol(rpc)]
    interface IOrderBook {
        #[derive(Debug)]
        event LogMake(
            bytes32 orderKey,
            uint8 indexed side,
            uint8 indexed saleKind,
            address indexed maker,
            Asset nft,
            uint128 price,
            address currency,
            uint64 expiry,
            uint64 salt
        );

        #[derive(Debug)]
        event LogCancel(bytes32 indexed orderKey, address indexed maker);

        #[derive(Debug)]
        event LogMatch(
            bytes32 indexed makeOrderKey,
            bytes32 indexed takeOrderKey,
            RawOrder makeOrder,
            RawOrder takeOrder,
            uint128 fillPrice
        );

        function orders(bytes32 orderKey) external view returns (RawOrder order, bytes32 next);

        function matchOrder(RawOrder sellOrder, RawOrder buyOrder) external payable;
    }

    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface IERC721Metadata {
        function tokenURI(uint256 tokenId) external view returns (string);
    }
}

/// The three order lifecycle logs the indexer subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Make,
    Cancel,
    Match,
}

impl EventKind {
    pub fn signature(self) -> B256 {
        match self {
            EventKind::Make => IOrderBook::LogMake::SIGNATURE_HASH,
            EventKind::Cancel => IOrderBook::LogCancel::SIGNATURE_HASH,
            EventKind::Match => IOrderBook::LogMatch::SIGNATURE_HASH,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Make => write!(f, "LogMake"),
            EventKind::Cancel => write!(f, "LogCancel"),
            EventKind::Match => write!(f, "LogMatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeEvent {
    pub order_key: B256,
    pub maker: Address,
    pub side: Side,
    pub sale_kind: SaleKind,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelEvent {
    pub order_key: B256,
    pub maker: Address,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEvent {
    pub make_order_key: B256,
    pub take_order_key: B256,
    pub make_order: Order,
    pub take_order: Order,
    pub fill_price: u128,
    pub block_number: u64,
}

impl MatchEvent {
    /// Key of whichever leg was the sell order, if any.
    pub fn sell_order_key(&self) -> Option<B256> {
        if self.make_order.side == Side::Sell {
            Some(self.make_order_key)
        } else if self.take_order.side == Side::Sell {
            Some(self.take_order_key)
        } else {
            None
        }
    }
}

/// A decoded order-book log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderbookEvent {
    Make(MakeEvent),
    Cancel(CancelEvent),
    Match(MatchEvent),
}

impl TryFrom<&RawOrder> for Order {
    type Error = DecodeError;

    fn try_from(raw: &RawOrder) -> Result<Self, Self::Error> {
        Ok(Order {
            side: Side::try_from(raw.side)?,
            sale_kind: SaleKind::try_from(raw.saleKind)?,
            maker: raw.maker,
            nft: NftInfo {
                token_id: raw.nft.tokenId,
                collection_address: raw.nft.collection,
                amount: raw.nft.amount.to::<u128>(),
            },
            price: raw.price,
            currency: raw.currency,
            expiry: raw.expiry,
            salt: raw.salt,
        })
    }
}

impl TryFrom<&Order> for RawOrder {
    type Error = ClientError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        let amount = Uint::<96, 2>::try_from(order.nft.amount)
            .map_err(|_| ClientError::Conversion(format!("nft amount {}", order.nft.amount)))?;

        Ok(RawOrder {
            side: order.side.as_u8(),
            saleKind: order.sale_kind.as_u8(),
            maker: order.maker,
            nft: Asset {
                tokenId: order.nft.token_id,
                collection: order.nft.collection_address,
                amount,
            },
            price: order.price,
            currency: order.currency,
            expiry: order.expiry,
            salt: order.salt,
        })
    }
}
