//! In-memory chain used by the unit tests.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, LogData, TxHash, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use url::Url;

use super::{ChainClient, Connect, OrderExecutor, TxOutcome};
use crate::interfaces::error::ClientError;
use crate::interfaces::event::{EventKind, IOrderBook, RawOrder};
use crate::interfaces::order::{NftInfo, Order, SaleKind, Side};

pub const ORDERBOOK: Address = address!("00000000000000000000000000000000000000b0");
pub const QUOTE_TOKEN: Address = address!("cccccccccccccccccccccccccccccccccccccccc");
pub const COLLECTION: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const WALLET: Address = address!("dddddddddddddddddddddddddddddddddddddddd");

pub fn sell_order(token_id: u64, price: u128) -> Order {
    Order {
        side: Side::Sell,
        sale_kind: SaleKind::FixedPriceForItem,
        maker: address!("1111111111111111111111111111111111111111"),
        nft: NftInfo {
            token_id: U256::from(token_id),
            collection_address: COLLECTION,
            amount: 1,
        },
        price,
        currency: QUOTE_TOKEN,
        expiry: 0,
        salt: token_id + 1,
    }
}

pub fn buy_order(token_id: u64, price: u128) -> Order {
    Order {
        side: Side::Buy,
        maker: WALLET,
        ..sell_order(token_id, price)
    }
}

#[derive(Default)]
struct Inner {
    head: u64,
    down: bool,
    probes: usize,
    logs: Vec<Log>,
    orders: HashMap<B256, Order>,
    max_range: Option<u64>,
    failing_blocks: HashMap<u64, usize>,
    log_requests: Vec<(EventKind, u64, u64)>,
    decimals: HashMap<Address, u8>,
    decimals_calls: usize,
    token_uris: HashMap<(Address, U256), String>,
    allowance: U256,
    approvals: Vec<U256>,
    matches: Vec<(Order, Order)>,
    revert_matches: bool,
    signer: bool,
}

/// Shared handle: clones observe and mutate the same chain.
#[derive(Clone, Default)]
pub struct FakeChain {
    inner: Arc<Mutex<Inner>>,
}

impl FakeChain {
    pub fn new(head: u64) -> Self {
        let chain = Self::default();
        chain.inner.lock().unwrap().head = head;
        chain
    }

    fn down() -> Self {
        let chain = Self::default();
        chain.inner.lock().unwrap().down = true;
        chain
    }

    pub fn set_head(&self, head: u64) {
        self.inner.lock().unwrap().head = head;
    }

    pub fn set_max_range(&self, blocks: u64) {
        self.inner.lock().unwrap().max_range = Some(blocks);
    }

    /// Every log request covering `block` fails `times` more times.
    pub fn fail_block(&self, block: u64, times: usize) {
        self.inner.lock().unwrap().failing_blocks.insert(block, times);
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.inner.lock().unwrap().decimals.insert(token, decimals);
    }

    pub fn decimals_calls(&self) -> usize {
        self.inner.lock().unwrap().decimals_calls
    }

    pub fn set_token_uri(&self, collection: Address, token_id: U256, uri: &str) {
        self.inner
            .lock()
            .unwrap()
            .token_uris
            .insert((collection, token_id), uri.to_string());
    }

    pub fn with_signer(self, allowance: U256) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.signer = true;
            inner.allowance = allowance;
        }
        self
    }

    pub fn revert_matches(&self) {
        self.inner.lock().unwrap().revert_matches = true;
    }

    pub fn approvals(&self) -> Vec<U256> {
        self.inner.lock().unwrap().approvals.clone()
    }

    pub fn matches(&self) -> Vec<(Order, Order)> {
        self.inner.lock().unwrap().matches.clone()
    }

    pub fn log_requests(&self) -> Vec<(EventKind, u64, u64)> {
        self.inner.lock().unwrap().log_requests.clone()
    }

    fn push_log(&self, data: LogData, block: u64) {
        let mut inner = self.inner.lock().unwrap();
        let log_index = inner.logs.len() as u64;
        inner.logs.push(Log {
            inner: alloy::primitives::Log {
                address: ORDERBOOK,
                data,
            },
            block_number: Some(block),
            log_index: Some(log_index),
            ..Default::default()
        });
    }

    /// Emits `LogMake` and stores the order behind `orders(key)`.
    pub fn make(&self, key: B256, order: &Order, block: u64) {
        let raw = RawOrder::try_from(order).unwrap();
        let event = IOrderBook::LogMake {
            orderKey: key,
            side: raw.side,
            saleKind: raw.saleKind,
            maker: raw.maker,
            nft: raw.nft,
            price: raw.price,
            currency: raw.currency,
            expiry: raw.expiry,
            salt: raw.salt,
        };
        self.inner.lock().unwrap().orders.insert(key, order.clone());
        self.push_log(event.encode_log_data(), block);
    }

    pub fn cancel(&self, key: B256, block: u64) {
        let event = IOrderBook::LogCancel {
            orderKey: key,
            maker: address!("1111111111111111111111111111111111111111"),
        };
        self.push_log(event.encode_log_data(), block);
    }

    pub fn match_orders_at(
        &self,
        make_key: B256,
        make_order: &Order,
        take_key: B256,
        take_order: &Order,
        block: u64,
    ) {
        let event = IOrderBook::LogMatch {
            makeOrderKey: make_key,
            takeOrderKey: take_key,
            makeOrder: RawOrder::try_from(make_order).unwrap(),
            takeOrder: RawOrder::try_from(take_order).unwrap(),
            fillPrice: make_order.price,
        };
        self.push_log(event.encode_log_data(), block);
    }

    pub fn push_raw(&self, data: LogData, block: u64) {
        self.push_log(data, block);
    }

    fn check_up(&self) -> Result<(), ClientError> {
        if self.inner.lock().unwrap().down {
            return Err(ClientError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn block_number(&self) -> Result<u64, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.probes += 1;
        if inner.down {
            return Err(ClientError::Transport("connection refused".to_string()));
        }
        Ok(inner.head)
    }

    async fn logs(&self, kind: EventKind, from: u64, to: u64) -> Result<Vec<Log>, ClientError> {
        self.check_up()?;
        let mut inner = self.inner.lock().unwrap();
        inner.log_requests.push((kind, from, to));

        if let Some(max) = inner.max_range {
            if to - from + 1 > max {
                return Err(ClientError::Transport(
                    "query exceeds max block range".to_string(),
                ));
            }
        }
        for (block, remaining) in inner.failing_blocks.iter_mut() {
            if (from..=to).contains(block) && *remaining > 0 {
                *remaining -= 1;
                return Err(ClientError::Transport(format!("block {block} pruned")));
            }
        }

        let signature = kind.signature();
        Ok(inner
            .logs
            .iter()
            .filter(|log| log.inner.data.topics().first() == Some(&signature))
            .filter(|log| log.block_number.is_some_and(|b| (from..=to).contains(&b)))
            .cloned()
            .collect())
    }

    async fn order(&self, order_key: B256) -> Result<Option<Order>, ClientError> {
        self.check_up()?;
        Ok(self.inner.lock().unwrap().orders.get(&order_key).cloned())
    }

    async fn decimals(&self, token: Address) -> Result<u8, ClientError> {
        self.check_up()?;
        let mut inner = self.inner.lock().unwrap();
        inner.decimals_calls += 1;
        inner
            .decimals
            .get(&token)
            .copied()
            .ok_or_else(|| ClientError::Contract("execution reverted".to_string()))
    }

    async fn token_uri(&self, collection: Address, token_id: U256) -> Result<String, ClientError> {
        self.check_up()?;
        self.inner
            .lock()
            .unwrap()
            .token_uris
            .get(&(collection, token_id))
            .cloned()
            .ok_or_else(|| ClientError::Contract("execution reverted".to_string()))
    }
}

#[async_trait]
impl OrderExecutor for FakeChain {
    fn wallet_address(&self) -> Result<Address, ClientError> {
        if self.inner.lock().unwrap().signer {
            Ok(WALLET)
        } else {
            Err(ClientError::MissingSigner)
        }
    }

    async fn allowance(&self, _: Address, _: Address, _: Address) -> Result<U256, ClientError> {
        Ok(self.inner.lock().unwrap().allowance)
    }

    async fn approve(
        &self,
        _: Address,
        _: Address,
        amount: U256,
    ) -> Result<TxOutcome, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.approvals.push(amount);
        inner.allowance = amount;
        Ok(TxOutcome {
            tx_hash: TxHash::repeat_byte(0xa1),
            success: true,
        })
    }

    async fn match_orders(&self, sell: &Order, buy: &Order) -> Result<TxOutcome, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.matches.push((sell.clone(), buy.clone()));
        Ok(TxOutcome {
            tx_hash: TxHash::repeat_byte(0xb2),
            success: !inner.revert_matches,
        })
    }
}

/// Maps endpoint urls to fake chains; unknown urls fail to connect.
#[derive(Clone, Default)]
pub struct FakeConnector {
    chains: HashMap<String, FakeChain>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, url: &str, chain: FakeChain) -> Self {
        self.chains.insert(url.to_string(), chain);
        self
    }

    pub fn with_down(mut self, url: &str) -> Self {
        self.chains.insert(url.to_string(), FakeChain::down());
        self
    }

    pub fn probes(&self, url: &str) -> usize {
        self.chains
            .get(url)
            .map_or(0, |chain| chain.inner.lock().unwrap().probes)
    }
}

impl Connect for FakeConnector {
    type Client = FakeChain;

    fn connect(&self, url: &Url) -> Result<FakeChain, ClientError> {
        self.chains
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ClientError::InvalidUrl(url.to_string()))
    }
}
