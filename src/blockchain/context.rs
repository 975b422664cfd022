//! Process-wide ledger client state.
//!
//! One `LedgerContext` per process and per signing account. It owns the
//! endpoint pool, the nonce cache, the signer and the contract bindings, and
//! is shared by `Arc` with every facade. Nothing here is a global.

use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::endpoint::EndpointPool;
use crate::blockchain::nonce::NonceAllocator;
use crate::blockchain::reader::ReadRetrier;
use crate::blockchain::submitter::TxSubmitter;
use crate::blockchain::transport::LedgerTransport;
use crate::blockchain::types::{
    ChainId, ContractAddresses, LedgerError, LedgerResult, NetworkIdentity,
};
use crate::blockchain::wallet::Signer;
use crate::config::{GasLimits, LedgerConfig, TransactionConfig};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Write path settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct TransactionSettings {
    pub attempt_timeout: Duration,
    /// Gas price multiplier in per-mille (1200 = ×1.2).
    pub gas_price_permille: u128,
    pub max_gas_price_wei: u128,
    pub gas_limits: GasLimits,
}

impl From<&TransactionConfig> for TransactionSettings {
    fn from(config: &TransactionConfig) -> Self {
        Self {
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
            gas_price_permille: (config.gas_price_multiplier * 1000.0).round().max(1000.0) as u128,
            max_gas_price_wei: config.max_gas_price_gwei as u128 * 1_000_000_000,
            gas_limits: config.gas_limits.clone(),
        }
    }
}

/// Shared client context for one signer.
#[derive(Debug)]
pub struct LedgerContext {
    pool: EndpointPool,
    nonces: Arc<NonceAllocator>,
    signer: Signer,
    network: NetworkIdentity,
    contracts: ContractAddresses,
    retry: RetryPolicy,
    tx: TransactionSettings,
}

impl LedgerContext {
    /// Build the context from configuration, loading the signer from the environment.
    pub fn connect(config: &LedgerConfig) -> LedgerResult<Self> {
        let signer = Signer::from_env(config.network.chain_id)?;
        Self::connect_with_signer(config, signer)
    }

    /// Build the context from configuration with an explicit signer.
    pub fn connect_with_signer(config: &LedgerConfig, signer: Signer) -> LedgerResult<Self> {
        let nonces = Arc::new(NonceAllocator::new());
        let timeout = Duration::from_secs(config.network.rpc_timeout_secs);
        let pool = EndpointPool::connect(&config.network.rpc_urls, &signer, timeout, nonces.clone())?;
        Self::assemble(config, signer, pool, nonces)
    }

    /// Build the context over caller-supplied transports (simulators, custom clients).
    pub fn with_transports(
        config: &LedgerConfig,
        signer: Signer,
        transports: Vec<Arc<dyn LedgerTransport>>,
    ) -> LedgerResult<Self> {
        let nonces = Arc::new(NonceAllocator::new());
        let pool = EndpointPool::new(transports, nonces.clone())?;
        Self::assemble(config, signer, pool, nonces)
    }

    fn assemble(
        config: &LedgerConfig,
        signer: Signer,
        pool: EndpointPool,
        nonces: Arc<NonceAllocator>,
    ) -> LedgerResult<Self> {
        let contracts = ContractAddresses::from_config(&config.contracts)?;
        if contracts.loan_registry.is_none() {
            tracing::warn!("Loan registry address not configured; loan writes will be unavailable");
        }

        Ok(Self {
            pool,
            nonces,
            signer,
            network: NetworkIdentity::from_config(&config.network),
            contracts,
            retry: RetryPolicy::from(&config.retries),
            tx: TransactionSettings::from(&config.transactions),
        })
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    pub fn nonces(&self) -> &NonceAllocator {
        &self.nonces
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn network(&self) -> &NetworkIdentity {
        &self.network
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn tx_settings(&self) -> &TransactionSettings {
        &self.tx
    }

    pub fn submitter(&self) -> TxSubmitter<'_> {
        TxSubmitter::new(self)
    }

    pub fn reader(&self) -> ReadRetrier<'_> {
        ReadRetrier::new(self)
    }

    /// Verify the active endpoint serves the configured chain.
    pub async fn verify_chain_id(&self) -> LedgerResult<ChainId> {
        let actual = self.pool.active_transport().chain_id().await?;
        if actual != self.network.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: self.network.chain_id,
                actual,
            });
        }
        Ok(ChainId(actual))
    }

    /// Check if the ledger is reachable and on the right chain.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.verify_chain_id().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimulatedEndpoint, SimulatedLedger, SimulatedNetwork, DEV_PRIVATE_KEY, SIM_CHAIN_ID};

    #[tokio::test]
    async fn test_verify_chain_id_matches_simulated_chain() {
        let net = SimulatedNetwork::builder().build().unwrap();
        assert_eq!(net.context.verify_chain_id().await.unwrap(), ChainId(SIM_CHAIN_ID));
        assert!(net.context.is_healthy().await);
    }

    #[tokio::test]
    async fn test_wrong_chain_is_unhealthy() {
        let ledger = SimulatedLedger::new(SIM_CHAIN_ID);
        let endpoint: Arc<dyn LedgerTransport> =
            Arc::new(SimulatedEndpoint::new("sim://other-chain", ledger));
        let mut config = LedgerConfig::default();
        config.network.chain_id = 80002;
        let signer = Signer::from_private_key(DEV_PRIVATE_KEY, 80002).unwrap();
        let context = LedgerContext::with_transports(&config, signer, vec![endpoint]).unwrap();

        assert!(matches!(
            context.verify_chain_id().await,
            Err(LedgerError::ChainMismatch { expected: 80002, actual: SIM_CHAIN_ID })
        ));
        assert!(!context.is_healthy().await);
    }

    #[tokio::test]
    async fn test_throttled_endpoint_is_unhealthy() {
        let net = SimulatedNetwork::builder().build().unwrap();
        net.endpoints[0].rate_limit_always(true);
        assert!(!net.context.is_healthy().await);
    }
}
