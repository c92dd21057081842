pub mod indexer;
pub mod matcher;
pub mod price;
pub mod risk;
pub mod rpc;
pub mod storage;
