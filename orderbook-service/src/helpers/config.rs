// Defaults applied when a variable is absent from the environment.
const INDEX_FILE_PATH: &str = "./data/orderbook-index.json";
const FROM_BLOCK: u64 = 0;
const CHUNK_SIZE: u64 = 2000;
const MAX_QUANTITY: u32 = 5;
const SYNC_INTERVAL_SECS: u64 = 60;
const BUY_ORDER_TTL_SECS: u64 = 300;

pub fn default_index_file_path() -> String {
    INDEX_FILE_PATH.to_owned()
}

pub fn default_from_block() -> u64 {
    FROM_BLOCK
}

pub fn default_chunk_size() -> u64 {
    CHUNK_SIZE
}

pub fn default_max_quantity() -> u32 {
    MAX_QUANTITY
}

pub fn default_sync_interval_secs() -> u64 {
    SYNC_INTERVAL_SECS
}

pub fn default_buy_order_ttl_secs() -> u64 {
    BUY_ORDER_TTL_SECS
}
