#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),
    #[error("ORDERBOOK_RPC_URLS must list at least one endpoint")]
    NoRpcUrl,
    #[error("Invalid RPC url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid address in {field}: {value:?}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("ORDERBOOK_CHUNK_SIZE must be greater than zero")]
    ZeroChunkSize,
    // The key itself is never echoed back.
    #[error("ORDERBOOK_PRIVATE_KEY is not a valid secp256k1 private key")]
    InvalidPrivateKey,
}
