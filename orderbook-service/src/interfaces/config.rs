use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::Deserialize;
use url::Url;

use super::error::ConfigError;
use crate::helpers::config::{
    default_buy_order_ttl_secs, default_chunk_size, default_from_block, default_index_file_path,
    default_max_quantity, default_sync_interval_secs,
};

pub const ENV_PREFIX: &str = "ORDERBOOK_";

/// Raw configuration, read from `ORDERBOOK_*` variables. List values are
/// comma separated.
#[derive(Deserialize, Debug)]
pub struct Config {
    pub rpc_urls: Vec<String>,
    pub chain_id: u64,
    pub orderbook_address: String,
    pub quote_token_address: String,
    #[serde(default = "default_index_file_path")]
    pub index_file_path: String,
    #[serde(default = "default_from_block")]
    pub from_block: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    #[serde(default)]
    pub collection_allowlist: Vec<String>,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
    pub private_key: Option<String>,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default)]
    pub unlimited_approval: bool,
    #[serde(default = "default_buy_order_ttl_secs")]
    pub buy_order_ttl_secs: u64,
    #[serde(default)]
    pub dry_run: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_urls: Vec<Url>,
    pub chain_id: u64,
    pub orderbook: Address,
    pub quote_token: Address,
    pub index_file_path: PathBuf,
    pub from_block: u64,
    pub chunk_size: u64,
    pub collection_allowlist: HashSet<Address>,
    pub max_quantity: u32,
    pub signer: Option<PrivateKeySigner>,
    pub sync_interval: Duration,
    pub unlimited_approval: bool,
    pub buy_order_ttl: Duration,
    pub dry_run: bool,
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
        })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env::<Config>()?)
    }

    pub fn validate(self) -> Result<Settings, ConfigError> {
        let rpc_urls = self
            .rpc_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(|u| {
                Url::parse(u).map_err(|e| ConfigError::InvalidUrl {
                    url: u.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if rpc_urls.is_empty() {
            return Err(ConfigError::NoRpcUrl);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }

        let collection_allowlist = self
            .collection_allowlist
            .iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| parse_address("ORDERBOOK_COLLECTION_ALLOWLIST", a))
            .collect::<Result<HashSet<_>, _>>()?;

        let signer = match self.private_key.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(key) => Some(
                key.parse::<PrivateKeySigner>()
                    .map_err(|_| ConfigError::InvalidPrivateKey)?,
            ),
        };

        Ok(Settings {
            rpc_urls,
            chain_id: self.chain_id,
            orderbook: parse_address("ORDERBOOK_ORDERBOOK_ADDRESS", &self.orderbook_address)?,
            quote_token: parse_address(
                "ORDERBOOK_QUOTE_TOKEN_ADDRESS",
                &self.quote_token_address,
            )?,
            index_file_path: PathBuf::from(self.index_file_path),
            from_block: self.from_block,
            chunk_size: self.chunk_size,
            collection_allowlist,
            max_quantity: self.max_quantity,
            signer,
            sync_interval: Duration::from_secs(self.sync_interval_secs),
            unlimited_approval: self.unlimited_approval,
            buy_order_ttl: Duration::from_secs(self.buy_order_ttl_secs),
            dry_run: self.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    // Anvil's first dev account.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), v.to_string()));
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Config>(vars)?)
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("RPC_URLS", "http://localhost:8545,https://rpc.example.org"),
            ("CHAIN_ID", "31337"),
            ("ORDERBOOK_ADDRESS", "0x00000000000000000000000000000000000000b0"),
            ("QUOTE_TOKEN_ADDRESS", "0xcccccccccccccccccccccccccccccccccccccccc"),
        ]
    }

    #[test]
    fn defaults_apply() {
        let settings = config_from(&minimal()).unwrap().validate().unwrap();

        assert_eq!(settings.rpc_urls.len(), 2);
        assert_eq!(settings.chain_id, 31337);
        assert_eq!(
            settings.orderbook,
            address!("00000000000000000000000000000000000000b0")
        );
        assert_eq!(
            settings.index_file_path,
            PathBuf::from("./data/orderbook-index.json")
        );
        assert_eq!(settings.from_block, 0);
        assert_eq!(settings.chunk_size, 2000);
        assert!(settings.collection_allowlist.is_empty());
        assert_eq!(settings.max_quantity, 5);
        assert!(settings.signer.is_none());
        assert_eq!(settings.sync_interval, Duration::from_secs(60));
        assert!(!settings.unlimited_approval);
        assert_eq!(settings.buy_order_ttl, Duration::from_secs(300));
        assert!(!settings.dry_run);
    }

    #[test]
    fn overrides_and_lists() {
        let mut vars = minimal();
        vars.extend([
            (
                "COLLECTION_ALLOWLIST",
                concat!(
                    "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa,",
                    "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                ),
            ),
            ("PRIVATE_KEY", DEV_KEY),
            ("CHUNK_SIZE", "500"),
            ("DRY_RUN", "true"),
        ]);
        let settings = config_from(&vars).unwrap().validate().unwrap();

        // Addresses compare case-insensitively.
        assert_eq!(settings.collection_allowlist.len(), 1);
        assert_eq!(
            settings.signer.map(|s| s.address()),
            Some(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"))
        );
        assert_eq!(settings.chunk_size, 500);
        assert!(settings.dry_run);
    }

    #[test]
    fn rejects_invalid_values() {
        let with = |key: &'static str, value: &'static str| {
            let mut vars = minimal();
            vars.retain(|(k, _)| *k != key);
            vars.push((key, value));
            config_from(&vars).unwrap().validate()
        };

        assert!(matches!(with("CHUNK_SIZE", "0"), Err(ConfigError::ZeroChunkSize)));
        assert!(matches!(
            with("RPC_URLS", "not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            with("QUOTE_TOKEN_ADDRESS", "0x1234"),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            with("PRIVATE_KEY", "0xdeadbeef"),
            Err(ConfigError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn missing_required_variable() {
        let mut vars = minimal();
        vars.retain(|(k, _)| *k != "CHAIN_ID");
        assert!(matches!(config_from(&vars), Err(ConfigError::Env(_))));
    }
}
