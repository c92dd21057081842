use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionReceipt};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use url::Url;

use super::{ChainClient, Connect, OrderExecutor, TxOutcome};
use crate::interfaces::error::ClientError;
use crate::interfaces::event::{EventKind, IERC721Metadata, IOrderBook, RawOrder, IERC20};
use crate::interfaces::order::Order;

/// Connects to JSON-RPC endpoints over HTTP, optionally with a signing wallet.
#[derive(Clone)]
pub struct AlloyConnector {
    orderbook: Address,
    signer: Option<PrivateKeySigner>,
}

impl AlloyConnector {
    pub fn new(orderbook: Address) -> Self {
        Self {
            orderbook,
            signer: None,
        }
    }

    pub fn with_signer(mut self, signer: PrivateKeySigner) -> Self {
        self.signer = Some(signer);
        self
    }
}

impl Connect for AlloyConnector {
    type Client = AlloyClient;

    fn connect(&self, url: &Url) -> Result<AlloyClient, ClientError> {
        let provider = match &self.signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer.clone()))
                .connect_http(url.clone())
                .erased(),
            None => ProviderBuilder::new().connect_http(url.clone()).erased(),
        };

        Ok(AlloyClient {
            provider,
            orderbook: self.orderbook,
            wallet: self.signer.as_ref().map(|s| s.address()),
        })
    }
}

#[derive(Clone)]
pub struct AlloyClient {
    provider: DynProvider,
    orderbook: Address,
    wallet: Option<Address>,
}

fn transport<E: std::fmt::Display>(e: E) -> ClientError {
    ClientError::Transport(e.to_string())
}

fn contract<E: std::fmt::Display>(e: E) -> ClientError {
    ClientError::Contract(e.to_string())
}

fn outcome(receipt: &TransactionReceipt) -> TxOutcome {
    TxOutcome {
        tx_hash: receipt.transaction_hash,
        success: receipt.status(),
    }
}

#[async_trait]
impl ChainClient for AlloyClient {
    async fn block_number(&self) -> Result<u64, ClientError> {
        self.provider.get_block_number().await.map_err(transport)
    }

    async fn logs(&self, kind: EventKind, from: u64, to: u64) -> Result<Vec<Log>, ClientError> {
        let filter = Filter::new()
            .address(self.orderbook)
            .event_signature(kind.signature())
            .from_block(from)
            .to_block(to);
        self.provider.get_logs(&filter).await.map_err(transport)
    }

    async fn order(&self, order_key: B256) -> Result<Option<Order>, ClientError> {
        let book = IOrderBook::new(self.orderbook, self.provider.clone());
        let stored = book.orders(order_key).call().await.map_err(contract)?;

        // Unset storage slots decode as an all-zero order.
        if stored.order.maker == Address::ZERO {
            return Ok(None);
        }
        Order::try_from(&stored.order)
            .map(Some)
            .map_err(|e| ClientError::Conversion(e.to_string()))
    }

    async fn decimals(&self, token: Address) -> Result<u8, ClientError> {
        IERC20::new(token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(contract)
    }

    async fn token_uri(&self, collection: Address, token_id: U256) -> Result<String, ClientError> {
        IERC721Metadata::new(collection, self.provider.clone())
            .tokenURI(token_id)
            .call()
            .await
            .map_err(contract)
    }
}

#[async_trait]
impl OrderExecutor for AlloyClient {
    fn wallet_address(&self) -> Result<Address, ClientError> {
        self.wallet.ok_or(ClientError::MissingSigner)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError> {
        IERC20::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(contract)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ClientError> {
        self.wallet_address()?;
        let receipt = IERC20::new(token, self.provider.clone())
            .approve(spender, amount)
            .send()
            .await
            .map_err(contract)?
            .get_receipt()
            .await
            .map_err(transport)?;
        Ok(outcome(&receipt))
    }

    async fn match_orders(&self, sell: &Order, buy: &Order) -> Result<TxOutcome, ClientError> {
        self.wallet_address()?;
        let sell = RawOrder::try_from(sell)?;
        let buy = RawOrder::try_from(buy)?;
        let receipt = IOrderBook::new(self.orderbook, self.provider.clone())
            .matchOrder(sell, buy)
            .send()
            .await
            .map_err(contract)?
            .get_receipt()
            .await
            .map_err(transport)?;
        Ok(outcome(&receipt))
    }
}
