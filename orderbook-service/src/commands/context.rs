use std::sync::Arc;

use orderbook_core::{
    AlloyConnector, DecimalsResolver, IndexerSettings, JsonFileStore, MatcherSettings,
    OrderMatcher, OrderbookIndexer, RiskChecker, RpcPool,
};

use crate::interfaces::config::Settings;

pub type Pool = Arc<RpcPool<AlloyConnector>>;

/// Services wired from the validated settings, sharing one endpoint pool.
pub struct AppContext {
    pub settings: Settings,
    pub pool: Pool,
    pub indexer: OrderbookIndexer<AlloyConnector, JsonFileStore>,
    pub resolver: Arc<DecimalsResolver<Pool>>,
    pub risk: RiskChecker<Pool>,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        let mut connector = AlloyConnector::new(settings.orderbook);
        if let Some(signer) = settings.signer.clone() {
            connector = connector.with_signer(signer);
        }
        let pool = Arc::new(RpcPool::new(settings.rpc_urls.clone(), connector));

        let indexer = OrderbookIndexer::new(
            Arc::clone(&pool),
            JsonFileStore::new(settings.index_file_path.clone()),
            IndexerSettings {
                chain_id: settings.chain_id,
                orderbook: settings.orderbook,
                quote_token: settings.quote_token,
                from_block: settings.from_block,
                chunk_size: settings.chunk_size,
                collection_allowlist: settings.collection_allowlist.clone(),
            },
        );
        let resolver = Arc::new(DecimalsResolver::new(Arc::clone(&pool)));
        let risk = RiskChecker::new(
            settings.max_quantity,
            settings.collection_allowlist.clone(),
            settings.quote_token,
            Arc::clone(&resolver),
        );

        Self {
            settings,
            pool,
            indexer,
            resolver,
            risk,
        }
    }

    /// Matcher for one purchase. `dry_run` adds to the configured flag.
    pub fn matcher(&self, dry_run: bool) -> OrderMatcher<AlloyConnector> {
        OrderMatcher::new(
            Arc::clone(&self.pool),
            MatcherSettings {
                quote_token: self.settings.quote_token,
                orderbook: self.settings.orderbook,
                unlimited_approval: self.settings.unlimited_approval,
                buy_order_ttl: self.settings.buy_order_ttl,
                dry_run: self.settings.dry_run || dry_run,
            },
        )
    }
}
