//! Incremental order-book indexer.
//!
//! A sync pass resumes after the last persisted block, scans the chain up to
//! the current head in fixed-size chunks and saves the state after every
//! chunk. Only fixed-price single item listings are kept; their status is
//! then driven by cancel and match logs.
mod decode;
mod logs;
mod query;

pub use decode::decode_log;
pub use logs::get_logs_safe;
pub use query::{IndexStats, OrderbookSnapshot};

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::interfaces::error::{ClientError, IndexerError};
use crate::interfaces::event::{CancelEvent, EventKind, MakeEvent, MatchEvent, OrderbookEvent};
use crate::interfaces::order::{IndexState, SaleKind, Side, Transition};
use crate::services::rpc::{ChainClient, Connect, RpcPool};
use crate::services::storage::IndexStore;

pub const DEFAULT_CHUNK_SIZE: u64 = 2000;

#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub chain_id: u64,
    pub orderbook: Address,
    pub quote_token: Address,
    /// First block worth scanning, usually the deployment block.
    pub from_block: u64,
    pub chunk_size: u64,
    pub collection_allowlist: HashSet<Address>,
}

/// Summary of one sync pass. `chunks == 0` means the index was up to date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub from_block: u64,
    pub to_block: u64,
    pub head: u64,
    pub chunks: u64,
    pub made: usize,
    pub cancelled: usize,
    pub filled: usize,
}

#[derive(Debug, Default)]
struct ScanCounts {
    made: usize,
    cancelled: usize,
    filled: usize,
}

pub struct OrderbookIndexer<K: Connect, S: IndexStore> {
    pool: Arc<RpcPool<K>>,
    store: S,
    settings: IndexerSettings,
}

impl<K: Connect, S: IndexStore> OrderbookIndexer<K, S> {
    pub fn new(pool: Arc<RpcPool<K>>, store: S, settings: IndexerSettings) -> Self {
        Self {
            pool,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &IndexerSettings {
        &self.settings
    }

    /// Brings the persisted index up to the current chain head.
    pub async fn sync(&self) -> Result<SyncReport, IndexerError> {
        let healthy = self.pool.healthy().await?;
        let head = healthy.head;
        let mut client = healthy.client;
        let mut state = self.load_state().await?;

        let start = self
            .settings
            .from_block
            .max(state.last_scanned_block.saturating_add(1));
        let mut report = SyncReport {
            from_block: start,
            to_block: state.last_scanned_block,
            head,
            ..Default::default()
        };
        if start > head {
            debug!("Index up to date at block {} (head {})", state.last_scanned_block, head);
            return Ok(report);
        }

        info!("Syncing order book blocks {}-{} from {}", start, head, healthy.url);
        let chunk_size = self.settings.chunk_size.max(1);
        let mut head = head;
        let mut chunk_from = start;
        while chunk_from <= head {
            let chunk_to = chunk_from.saturating_add(chunk_size - 1).min(head);

            let Some((mut next, counts, scanned_to)) = self
                .scan_chunk(&mut client, &mut head, &state, chunk_from, chunk_to)
                .await?
            else {
                warn!(
                    "Endpoint head {} is behind block {}, ending the pass at block {}",
                    head, chunk_from, state.last_scanned_block
                );
                break;
            };
            next.last_scanned_block = scanned_to;
            self.store.save(&next).await?;
            state = next;

            report.chunks += 1;
            report.to_block = scanned_to;
            report.made += counts.made;
            report.cancelled += counts.cancelled;
            report.filled += counts.filled;
            debug!(
                "Chunk {}-{} done: {} made, {} cancelled, {} filled",
                chunk_from, scanned_to, counts.made, counts.cancelled, counts.filled
            );

            chunk_from = scanned_to + 1;
        }
        report.head = head;

        info!(
            "Synced to block {}: {} made, {} cancelled, {} filled over {} chunks",
            report.to_block, report.made, report.cancelled, report.filled, report.chunks
        );
        Ok(report)
    }

    /// Scans one chunk on a copy of `state`, moving to another endpoint when
    /// the current one fails. Each configured endpoint gets one attempt.
    ///
    /// `head` follows the endpoint in use, and the chunk is cut at it so no
    /// block beyond what the endpoint has seen is marked scanned. Returns the
    /// new state, its counts and the last block it covers, or `None` when the
    /// replacement endpoint has not reached `from` yet.
    async fn scan_chunk(
        &self,
        client: &mut K::Client,
        head: &mut u64,
        state: &IndexState,
        from: u64,
        to: u64,
    ) -> Result<Option<(IndexState, ScanCounts, u64)>, IndexerError> {
        let mut attempts = 0;
        loop {
            let to = to.min(*head);
            if to < from {
                return Ok(None);
            }

            let mut scratch = state.clone();
            match self.scan_range(&*client, &mut scratch, from, to).await {
                Ok(counts) => return Ok(Some((scratch, counts, to))),
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.pool.len() {
                        return Err(e.into());
                    }
                    warn!("Scanning blocks {}-{} failed: {}. Switching endpoint", from, to, e);
                    let healthy = self.pool.fail_over().await?;
                    if healthy.head < *head {
                        debug!("{} is at block {}, behind {}", healthy.url, healthy.head, *head);
                    }
                    *client = healthy.client;
                    *head = healthy.head;
                }
            }
        }
    }

    /// Applies every lifecycle log of `[from, to]` to `state`: makes first,
    /// then cancels, then matches.
    async fn scan_range(
        &self,
        client: &K::Client,
        state: &mut IndexState,
        from: u64,
        to: u64,
    ) -> Result<ScanCounts, ClientError> {
        let makes = get_logs_safe(client, EventKind::Make, from, to).await?;
        let cancels = get_logs_safe(client, EventKind::Cancel, from, to).await?;
        let matches = get_logs_safe(client, EventKind::Match, from, to).await?;

        let mut counts = ScanCounts::default();
        for log in makes.iter().chain(&cancels).chain(&matches) {
            let event = match decode_log(log) {
                Ok(event) => event,
                Err(e) => {
                    warn!(
                        "Skipping malformed log at block {:?} (tx {:?}): {}",
                        log.block_number, log.transaction_hash, e
                    );
                    continue;
                }
            };

            match event {
                OrderbookEvent::Make(ev) => {
                    if self.apply_make(client, state, &ev).await? {
                        counts.made += 1;
                    }
                }
                OrderbookEvent::Cancel(ev) => {
                    if apply_cancel(state, &ev) {
                        counts.cancelled += 1;
                    }
                }
                OrderbookEvent::Match(ev) => {
                    if apply_match(state, &ev) {
                        counts.filled += 1;
                    }
                }
            }
        }
        Ok(counts)
    }

    async fn apply_make(
        &self,
        client: &K::Client,
        state: &mut IndexState,
        ev: &MakeEvent,
    ) -> Result<bool, ClientError> {
        if ev.side != Side::Sell || ev.sale_kind != SaleKind::FixedPriceForItem {
            debug!("Ignoring {:?} {:?} order {}", ev.side, ev.sale_kind, ev.order_key);
            return Ok(false);
        }

        let order = match client.order(ev.order_key).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!("Order {} not found on-chain, skipping", ev.order_key);
                return Ok(false);
            }
            Err(ClientError::Conversion(e)) => {
                warn!("Order {} is malformed ({}), skipping", ev.order_key, e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        if !order.is_listed_item() {
            debug!("Order {} is not an item listing, skipping", ev.order_key);
            return Ok(false);
        }

        match state.upsert_made(ev.order_key, order, ev.block_number) {
            Transition::Applied => {
                debug!("Indexed order {} at block {}", ev.order_key, ev.block_number);
                Ok(true)
            }
            Transition::AlreadyTerminal(status) => {
                debug!("Order {} already {}, keeping it", ev.order_key, status);
                Ok(false)
            }
            Transition::UnknownOrder => Ok(false),
        }
    }

    /// Loads the persisted state, or a fresh one when nothing was saved yet
    /// or the saved state belongs to another deployment.
    pub async fn load_state(&self) -> Result<IndexState, IndexerError> {
        let IndexerSettings {
            chain_id,
            orderbook,
            from_block,
            ..
        } = self.settings;
        let fresh = || IndexState::new(chain_id, orderbook, from_block.saturating_sub(1));

        match self.store.load().await? {
            Some(state) if state.belongs_to(chain_id, orderbook) => Ok(state),
            Some(state) => {
                warn!(
                    "Persisted index is for chain {} / {}, resetting for chain {} / {}",
                    state.chain_id, state.orderbook_address, chain_id, orderbook
                );
                Ok(fresh())
            }
            None => Ok(fresh()),
        }
    }

    /// Query view over the last persisted state.
    pub async fn snapshot(&self) -> Result<OrderbookSnapshot, IndexerError> {
        let state = self.load_state().await?;
        Ok(OrderbookSnapshot::new(
            state,
            self.settings.quote_token,
            self.settings.collection_allowlist.clone(),
        ))
    }

    /// Metadata URI of a token. Any failure yields `None`.
    pub async fn token_uri(&self, collection: Address, token_id: U256) -> Option<String> {
        let healthy = match self.pool.healthy().await {
            Ok(healthy) => healthy,
            Err(e) => {
                debug!("No endpoint for tokenURI: {}", e);
                return None;
            }
        };
        match healthy.client.token_uri(collection, token_id).await {
            Ok(uri) => Some(uri),
            Err(e) => {
                debug!("tokenURI({}) on {} failed: {}", token_id, collection, e);
                None
            }
        }
    }
}

fn apply_cancel(state: &mut IndexState, ev: &CancelEvent) -> bool {
    match state.mark_cancelled(&ev.order_key, ev.block_number) {
        Transition::Applied => {
            debug!("Order {} cancelled at block {}", ev.order_key, ev.block_number);
            true
        }
        Transition::AlreadyTerminal(status) => {
            debug!("Ignoring cancel of {} order {}", status, ev.order_key);
            false
        }
        Transition::UnknownOrder => {
            debug!("Ignoring cancel of untracked order {}", ev.order_key);
            false
        }
    }
}

fn apply_match(state: &mut IndexState, ev: &MatchEvent) -> bool {
    let Some(sell_key) = ev.sell_order_key() else {
        warn!(
            "Match {} / {} at block {} has no sell leg",
            ev.make_order_key, ev.take_order_key, ev.block_number
        );
        return false;
    };

    match state.mark_filled(&sell_key, ev.block_number) {
        Transition::Applied => {
            debug!(
                "Order {} filled at {} in block {}",
                sell_key, ev.fill_price, ev.block_number
            );
            true
        }
        Transition::AlreadyTerminal(status) => {
            debug!("Ignoring match of {} order {}", status, sell_key);
            false
        }
        Transition::UnknownOrder => {
            warn!("Match for unknown sell order {} at block {}", sell_key, ev.block_number);
            false
        }
    }
}
