use std::collections::HashSet;

use alloy::primitives::{Address, B256, U256};
use serde::Serialize;

use crate::helpers::time::unix_now;
use crate::interfaces::order::{IndexState, IndexedOrder, OrderStatus};

/// Order counts reported by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub open: usize,
    pub cancelled: usize,
    pub filled: usize,
    pub last_scanned_block: u64,
}

/// Read-only view over a persisted [`IndexState`].
///
/// "Active" orders are open single-unit listings priced in the quote token,
/// not expired at `now`, and, when an allow-list is configured, from an
/// allowed collection.
#[derive(Debug, Clone)]
pub struct OrderbookSnapshot {
    state: IndexState,
    quote_token: Address,
    allowlist: HashSet<Address>,
    now: u64,
}

impl OrderbookSnapshot {
    pub fn new(state: IndexState, quote_token: Address, allowlist: HashSet<Address>) -> Self {
        Self {
            state,
            quote_token,
            allowlist,
            now: unix_now(),
        }
    }

    /// Evaluates expiries against `now` instead of the wall clock.
    pub fn at(mut self, now: u64) -> Self {
        self.now = now;
        self
    }

    pub fn state(&self) -> &IndexState {
        &self.state
    }

    fn is_active(&self, indexed: &IndexedOrder) -> bool {
        let order = &indexed.order;
        indexed.status == OrderStatus::Open
            && order.currency == self.quote_token
            && order.nft.amount == 1
            && !order.is_expired_at(self.now)
            && (self.allowlist.is_empty() || self.allowlist.contains(&order.nft.collection_address))
    }

    /// Active orders, in order key order.
    pub fn active_sell_orders(&self) -> Vec<&IndexedOrder> {
        self.state
            .orders_by_key
            .values()
            .filter(|o| self.is_active(o))
            .collect()
    }

    pub fn floor_price(&self) -> Option<u128> {
        self.active_sell_orders()
            .iter()
            .map(|o| o.order.price)
            .min()
    }

    /// The `n` cheapest active orders, ties broken by order key.
    pub fn cheapest_n(&self, n: usize) -> Vec<&IndexedOrder> {
        let mut active = self.active_sell_orders();
        active.sort_by_key(|o| (o.order.price, o.order_key));
        active.truncate(n);
        active
    }

    pub fn cheapest_for_token_id(&self, token_id: U256) -> Option<&IndexedOrder> {
        self.active_sell_orders()
            .into_iter()
            .filter(|o| o.order.nft.token_id == token_id)
            .min_by_key(|o| (o.order.price, o.order_key))
    }

    /// Lookup regardless of status.
    pub fn order_by_key(&self, order_key: &B256) -> Option<&IndexedOrder> {
        self.state.orders_by_key.get(order_key)
    }

    /// Lookups regardless of status; unknown keys are skipped.
    pub fn orders_by_keys(&self, order_keys: &[B256]) -> Vec<&IndexedOrder> {
        order_keys
            .iter()
            .filter_map(|key| self.order_by_key(key))
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            open: self.state.count_by_status(OrderStatus::Open),
            cancelled: self.state.count_by_status(OrderStatus::Cancelled),
            filled: self.state.count_by_status(OrderStatus::Filled),
            last_scanned_block: self.state.last_scanned_block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rpc::fake::{sell_order, COLLECTION, ORDERBOOK, QUOTE_TOKEN};
    use alloy::primitives::address;

    const NOW: u64 = 1_700_000_000;

    fn key(n: u8) -> B256 {
        B256::with_last_byte(n)
    }

    fn snapshot_with(prices: &[u128]) -> OrderbookSnapshot {
        let mut state = IndexState::new(1, ORDERBOOK, 100);
        for (i, price) in prices.iter().enumerate() {
            state.upsert_made(key(i as u8 + 1), sell_order(i as u64, *price), 10);
        }
        OrderbookSnapshot::new(state, QUOTE_TOKEN, HashSet::new()).at(NOW)
    }

    fn prices(orders: &[&IndexedOrder]) -> Vec<u128> {
        orders.iter().map(|o| o.order.price).collect()
    }

    #[test]
    fn floor_and_cheapest() {
        let snapshot = snapshot_with(&[300, 150, 450]);
        assert_eq!(snapshot.floor_price(), Some(150));
        assert_eq!(prices(&snapshot.cheapest_n(2)), vec![150, 300]);
        assert_eq!(prices(&snapshot.cheapest_n(10)), vec![150, 300, 450]);
    }

    #[test]
    fn empty_book_has_no_floor() {
        let snapshot = snapshot_with(&[]);
        assert_eq!(snapshot.floor_price(), None);
        assert!(snapshot.cheapest_n(3).is_empty());
    }

    #[test]
    fn price_ties_are_broken_by_order_key() {
        let snapshot = snapshot_with(&[200, 100, 100]);
        let cheapest = snapshot.cheapest_n(2);
        assert_eq!(cheapest[0].order_key, key(2));
        assert_eq!(cheapest[1].order_key, key(3));
    }

    #[test]
    fn inactive_orders_are_excluded() {
        let mut state = IndexState::new(1, ORDERBOOK, 100);

        let mut expired = sell_order(1, 10);
        expired.expiry = NOW;
        state.upsert_made(key(1), expired, 1);

        let mut future = sell_order(2, 20);
        future.expiry = NOW + 1;
        state.upsert_made(key(2), future, 1);

        let mut other_currency = sell_order(3, 30);
        other_currency.currency = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");
        state.upsert_made(key(3), other_currency, 1);

        let mut bundle = sell_order(4, 40);
        bundle.nft.amount = 2;
        state.upsert_made(key(4), bundle, 1);

        state.upsert_made(key(5), sell_order(5, 50), 1);
        state.mark_cancelled(&key(5), 2);

        let snapshot = OrderbookSnapshot::new(state, QUOTE_TOKEN, HashSet::new()).at(NOW);
        assert_eq!(prices(&snapshot.active_sell_orders()), vec![20]);
        assert_eq!(snapshot.floor_price(), Some(20));

        // Status-agnostic lookups still see everything.
        assert_eq!(snapshot.orders_by_keys(&[key(1), key(5), key(9)]).len(), 2);
        assert_eq!(
            snapshot.order_by_key(&key(5)).map(|o| o.status),
            Some(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn allowlist_filters_collections() {
        let mut state = IndexState::new(1, ORDERBOOK, 100);
        state.upsert_made(key(1), sell_order(1, 10), 1);
        let mut foreign = sell_order(2, 5);
        foreign.nft.collection_address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        state.upsert_made(key(2), foreign, 1);

        let snapshot =
            OrderbookSnapshot::new(state, QUOTE_TOKEN, HashSet::from([COLLECTION])).at(NOW);
        assert_eq!(snapshot.floor_price(), Some(10));
    }

    #[test]
    fn cheapest_for_a_token_id() {
        let mut state = IndexState::new(1, ORDERBOOK, 100);
        state.upsert_made(key(1), sell_order(7, 90), 1);
        state.upsert_made(key(2), sell_order(7, 60), 1);
        state.upsert_made(key(3), sell_order(8, 10), 1);
        let snapshot = OrderbookSnapshot::new(state, QUOTE_TOKEN, HashSet::new()).at(NOW);

        let best = snapshot.cheapest_for_token_id(U256::from(7)).unwrap();
        assert_eq!(best.order_key, key(2));
        assert!(snapshot.cheapest_for_token_id(U256::from(9)).is_none());
    }

    #[test]
    fn stats_count_each_status() {
        let mut snapshot = snapshot_with(&[1, 2, 3]);
        snapshot.state.mark_cancelled(&key(1), 20);
        snapshot.state.mark_filled(&key(2), 21);

        assert_eq!(
            snapshot.stats(),
            IndexStats {
                open: 1,
                cancelled: 1,
                filled: 1,
                last_scanned_block: 100,
            }
        );
    }
}
