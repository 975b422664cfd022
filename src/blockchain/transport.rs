//! JSON-RPC transport to a single endpoint.
//!
//! # Responsibilities
//! - Speak JSON-RPC to one endpoint (chain id, pending nonce, gas price)
//! - Sign and broadcast prepared calls, returning on pending-pool acceptance
//! - Execute read-only `eth_call`s
//! - Translate provider errors into classified `LedgerError`s
//!
//! Retries and rotation live above this layer; a transport makes exactly one
//! request per method call.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::types::{LedgerError, LedgerResult, PreparedCall, TxOptions};
use crate::blockchain::wallet::Signer;

/// One endpoint's view of the ledger network.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Endpoint URL, for logs.
    fn endpoint(&self) -> &str;

    async fn chain_id(&self) -> LedgerResult<u64>;

    /// Transaction count for `account` including the pending pool.
    async fn pending_nonce(&self, account: Address) -> LedgerResult<u64>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> LedgerResult<u128>;

    /// Sign and broadcast; resolves once the endpoint returns a hash.
    async fn send_transaction(&self, call: &PreparedCall, options: &TxOptions)
        -> LedgerResult<TxHash>;

    /// Read-only contract call.
    async fn call(&self, to: Address, data: Bytes) -> LedgerResult<Bytes>;
}

/// Alloy-backed transport with a signing wallet attached.
pub struct RpcTransport {
    url: String,
    provider: Arc<dyn Provider + Send + Sync>,
    timeout_duration: Duration,
}

impl RpcTransport {
    /// Connect to `url`, signing with `signer`.
    ///
    /// Fillers are disabled: the submitter sets nonce, gas and chain id
    /// explicitly so the nonce allocator stays the single source of truth.
    pub fn connect(url: Url, signer: &Signer, timeout_duration: Duration) -> Self {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .wallet(signer.ethereum_wallet())
            .connect_http(url.clone());

        Self {
            url: url.to_string(),
            provider: Arc::new(provider) as Arc<dyn Provider + Send + Sync>,
            timeout_duration,
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout_duration.as_millis() as u64
    }
}

#[async_trait]
impl LedgerTransport for RpcTransport {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> LedgerResult<u64> {
        match timeout(self.timeout_duration, self.provider.get_chain_id()).await {
            Ok(result) => result.map_err(|e| LedgerError::from_transport(e.to_string())),
            Err(_) => Err(LedgerError::Timeout(self.timeout_ms())),
        }
    }

    async fn pending_nonce(&self, account: Address) -> LedgerResult<u64> {
        let fut = self.provider.get_transaction_count(account).pending();
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result.map_err(|e| LedgerError::from_transport(e.to_string())),
            Err(_) => Err(LedgerError::Timeout(self.timeout_ms())),
        }
    }

    async fn gas_price(&self) -> LedgerResult<u128> {
        match timeout(self.timeout_duration, self.provider.get_gas_price()).await {
            Ok(result) => result.map_err(|e| LedgerError::from_transport(e.to_string())),
            Err(_) => Err(LedgerError::Timeout(self.timeout_ms())),
        }
    }

    async fn send_transaction(
        &self,
        call: &PreparedCall,
        options: &TxOptions,
    ) -> LedgerResult<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(options.from)
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_nonce(options.nonce)
            .with_gas_price(options.gas_price)
            .with_chain_id(options.chain_id)
            .with_gas_limit(options.gas_limit);

        // The submitter owns the per-attempt deadline.
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerError::from_transport(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    async fn call(&self, to: Address, data: Bytes) -> LedgerResult<Bytes> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        match timeout(self.timeout_duration, self.provider.call(tx)).await {
            Ok(result) => result.map_err(|e| LedgerError::from_transport(e.to_string())),
            Err(_) => Err(LedgerError::Timeout(self.timeout_ms())),
        }
    }
}

impl std::fmt::Debug for RpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcTransport")
            .field("url", &self.url)
            .field("timeout_ms", &self.timeout_ms())
            .finish()
    }
}
