use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};
use url::Url;

use super::{ChainClient, Connect};
use crate::interfaces::error::PoolError;

const NO_ENDPOINT: usize = usize::MAX;

/// A client bound to an endpoint that just answered `eth_blockNumber`.
pub struct Healthy<C> {
    pub client: C,
    pub head: u64,
    pub url: Url,
}

/// Ordered list of RPC endpoints with a cached last-known-good pointer.
///
/// Endpoints are probed lazily: the cached one first, then the rest in
/// configured order. There is no background health polling.
pub struct RpcPool<K: Connect> {
    urls: Vec<Url>,
    connector: K,
    last_good: AtomicUsize,
}

impl<K: Connect> RpcPool<K> {
    pub fn new(urls: Vec<Url>, connector: K) -> Self {
        Self {
            urls,
            connector,
            last_good: AtomicUsize::new(NO_ENDPOINT),
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Url of the cached endpoint, if one answered recently.
    pub fn current(&self) -> Option<&Url> {
        self.urls.get(self.last_good.load(Ordering::Relaxed))
    }

    /// Returns a client for the first endpoint that answers, starting with the
    /// cached one.
    pub async fn healthy(&self) -> Result<Healthy<K::Client>, PoolError> {
        let start = match self.last_good.load(Ordering::Relaxed) {
            NO_ENDPOINT => 0,
            idx => idx,
        };
        self.probe_from(start).await
    }

    /// Drops the cached endpoint after a failed call and probes the others,
    /// starting with the one after it.
    pub async fn fail_over(&self) -> Result<Healthy<K::Client>, PoolError> {
        let failed = self.last_good.swap(NO_ENDPOINT, Ordering::Relaxed);
        if let Some(url) = self.urls.get(failed) {
            warn!("Dropping RPC endpoint {} after a failed call", url);
        }
        let start = match failed {
            NO_ENDPOINT => 0,
            idx => idx + 1,
        };
        self.probe_from(start).await
    }

    async fn probe_from(&self, start: usize) -> Result<Healthy<K::Client>, PoolError> {
        let len = self.urls.len();
        for offset in 0..len {
            let idx = (start + offset) % len;
            let url = &self.urls[idx];

            let client = match self.connector.connect(url) {
                Ok(client) => client,
                Err(e) => {
                    warn!("Can't build RPC client for {}: {}", url, e);
                    continue;
                }
            };

            match client.block_number().await {
                Ok(head) => {
                    debug!("RPC endpoint {} healthy at block {}", url, head);
                    self.last_good.store(idx, Ordering::Relaxed);
                    return Ok(Healthy {
                        client,
                        head,
                        url: url.clone(),
                    });
                }
                Err(e) => warn!("RPC endpoint {} unreachable: {}", url, e),
            }
        }

        Err(PoolError::NoHealthyEndpoint { tried: len })
    }
}
