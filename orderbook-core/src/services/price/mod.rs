//! Quote token precision.
//!
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use tracing::{debug, warn};

use crate::helpers::units::{to_human_units, to_raw_units};
use crate::interfaces::error::{PriceError, RiskError};
use crate::services::rpc::{ChainClient, Connect, RpcPool};

/// Remote lookup of an ERC20 `decimals()`.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait DecimalsSource: Send + Sync {
    async fn fetch_decimals(&self, token: Address) -> Result<u8, PriceError>;
}

#[async_trait]
impl<K: Connect> DecimalsSource for RpcPool<K> {
    async fn fetch_decimals(&self, token: Address) -> Result<u8, PriceError> {
        let healthy = self.healthy().await?;
        match healthy.client.decimals(token).await {
            Ok(decimals) => Ok(decimals),
            Err(e) => {
                warn!("decimals() of {} failed on {}: {}", token, healthy.url, e);
                let retry = self.fail_over().await?;
                Ok(retry.client.decimals(token).await?)
            }
        }
    }
}

#[async_trait]
impl<T: DecimalsSource + ?Sized> DecimalsSource for Arc<T> {
    async fn fetch_decimals(&self, token: Address) -> Result<u8, PriceError> {
        (**self).fetch_decimals(token).await
    }
}

/// Resolves token decimals once per token and converts amounts with them.
pub struct DecimalsResolver<S: DecimalsSource> {
    source: S,
    cache: Mutex<HashMap<Address, u8>>,
}

impl<S: DecimalsSource> DecimalsResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, token: &Address) -> Option<u8> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .copied()
    }

    pub async fn resolve_decimals(&self, token: Address) -> Result<u8, PriceError> {
        if let Some(decimals) = self.cached(&token) {
            return Ok(decimals);
        }

        let decimals = self.source.fetch_decimals(token).await?;
        debug!("Token {} has {} decimals", token, decimals);
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token, decimals);
        Ok(decimals)
    }

    /// Human decimal string to raw units of `token`.
    pub async fn to_raw(&self, token: Address, amount: &str) -> Result<U256, RiskError> {
        let decimals = self.resolve_decimals(token).await?;
        Ok(to_raw_units(amount, decimals)?)
    }

    /// Raw units of `token` to a display string.
    pub async fn to_human(&self, token: Address, raw: U256) -> Result<String, RiskError> {
        let decimals = self.resolve_decimals(token).await?;
        Ok(to_human_units(raw, decimals)?)
    }
}
