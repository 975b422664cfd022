//! In-process ledger network for tests and dry runs.
//!
//! # Data Flow
//! ```text
//! SimulatedNetwork::builder()
//!     → SimulatedLedger (shared chain state, decoded writes)
//!     → N × SimulatedEndpoint (fault queues, request counters)
//!     → LedgerContext::with_transports (same code path as live RPC)
//! ```

pub mod endpoint;
pub mod ledger;

use std::sync::Arc;

use alloy::primitives::Address;

use crate::blockchain::context::LedgerContext;
use crate::blockchain::transport::LedgerTransport;
use crate::blockchain::types::LedgerResult;
use crate::blockchain::wallet::Signer;
use crate::config::LedgerConfig;

pub use endpoint::{Fault, SimulatedEndpoint};
pub use ledger::SimulatedLedger;

/// Well-known development key (first Anvil/Hardhat account). Never funded on a real network.
pub const DEV_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const SIM_CHAIN_ID: u64 = 31337;

/// A context wired to simulated endpoints.
pub struct SimulatedNetwork {
    pub context: Arc<LedgerContext>,
    pub ledger: Arc<SimulatedLedger>,
    pub endpoints: Vec<Arc<SimulatedEndpoint>>,
}

impl SimulatedNetwork {
    pub fn builder() -> SimulatedNetworkBuilder {
        SimulatedNetworkBuilder::default()
    }

    /// Requests received across every endpoint.
    pub fn request_count(&self) -> u64 {
        self.endpoints.iter().map(|e| e.request_count()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedNetworkBuilder {
    config: LedgerConfig,
    endpoints: usize,
    base_nonce: u64,
    gas_price_gwei: u64,
}

impl Default for SimulatedNetworkBuilder {
    fn default() -> Self {
        let mut config = LedgerConfig::default();
        config.network.name = "simulated".to_string();
        config.network.chain_id = SIM_CHAIN_ID;
        config.network.explorer_url = None;
        config.contracts.loan_registry = address_hex(0x01);
        config.contracts.credit_registry = address_hex(0x02);
        config.contracts.payment_ledger = address_hex(0x03);
        config.contracts.access_control = address_hex(0x04);
        config.transactions.attempt_timeout_ms = 2_000;
        config.retries.max_attempts = 4;
        config.retries.base_delay_ms = 1;
        config.retries.max_delay_ms = 5;
        config.retries.resync_delay_ms = 1;
        config.audit.inter_call_delay_ms = 0;

        Self {
            config,
            endpoints: 1,
            base_nonce: 0,
            gas_price_gwei: 30,
        }
    }
}

fn address_hex(byte: u8) -> String {
    Address::repeat_byte(byte).to_string()
}

impl SimulatedNetworkBuilder {
    pub fn endpoints(mut self, count: usize) -> Self {
        self.endpoints = count;
        self
    }

    /// Transactions the signer has already sent before the test starts.
    pub fn base_nonce(mut self, nonce: u64) -> Self {
        self.base_nonce = nonce;
        self
    }

    pub fn gas_price_gwei(mut self, gwei: u64) -> Self {
        self.gas_price_gwei = gwei;
        self
    }

    pub fn attempt_timeout_ms(mut self, ms: u64) -> Self {
        self.config.transactions.attempt_timeout_ms = ms;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retries.max_attempts = attempts;
        self
    }

    pub fn explorer_url(mut self, url: impl Into<String>) -> Self {
        self.config.network.explorer_url = Some(url.into());
        self
    }

    /// Start from an existing configuration; network identity is kept simulated.
    pub fn config(mut self, config: LedgerConfig) -> Self {
        let retries = self.config.retries.clone();
        self.config = config;
        self.config.network.chain_id = SIM_CHAIN_ID;
        self.config.retries = retries;
        self
    }

    /// Leave every contract address unset.
    pub fn unbound(mut self) -> Self {
        self.config.contracts = Default::default();
        self
    }

    pub fn build(self) -> LedgerResult<SimulatedNetwork> {
        let signer = Signer::from_private_key(DEV_PRIVATE_KEY, SIM_CHAIN_ID)?;
        let ledger = SimulatedLedger::new(SIM_CHAIN_ID);
        ledger.set_transaction_count(signer.address(), self.base_nonce);

        let endpoints: Vec<Arc<SimulatedEndpoint>> = (0..self.endpoints)
            .map(|i| {
                let endpoint = SimulatedEndpoint::new(format!("sim://node-{}", i), ledger.clone());
                endpoint.set_gas_price_gwei(self.gas_price_gwei);
                Arc::new(endpoint)
            })
            .collect();

        let transports = endpoints
            .iter()
            .map(|e| e.clone() as Arc<dyn LedgerTransport>)
            .collect();
        let context = LedgerContext::with_transports(&self.config, signer, transports)?;

        Ok(SimulatedNetwork {
            context: Arc::new(context),
            ledger,
            endpoints,
        })
    }
}
