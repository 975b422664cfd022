//! Scripted `LedgerTransport` over a `SimulatedLedger`.
//!
//! Faults are queued per endpoint and consumed by the first request they
//! apply to. Error messages mimic what public RPC providers return so they
//! flow through the same classification as real traffic.

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::blockchain::transport::LedgerTransport;
use crate::blockchain::types::{LedgerError, LedgerResult, PreparedCall, TxOptions};
use crate::sim::ledger::SimulatedLedger;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Reason text and revert data that overlap provider throttling vocabulary.
const REVERT_MESSAGE: &str = "server returned an error response: error code 3: execution reverted: \
    daily quota exceeded the sanctioned limit, data: \"0x08c379a0000000000000000000000000000000000000000000000000000000000000429\"";

/// One injected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// HTTP 429 on the next request of any kind.
    RateLimit,
    /// "nonce too low" on the next broadcast.
    NonceTooLow,
    /// "execution reverted" on the next broadcast or view call.
    Revert,
    /// The next request never answers.
    Hang,
    /// The HTTP client gives up on the next request of any kind.
    ClientTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    ChainId,
    PendingNonce,
    GasPrice,
    Send,
    Call,
}

impl Fault {
    fn applies_to(self, method: Method) -> bool {
        match self {
            Fault::RateLimit | Fault::Hang | Fault::ClientTimeout => true,
            Fault::NonceTooLow => method == Method::Send,
            Fault::Revert => matches!(method, Method::Send | Method::Call),
        }
    }
}

#[derive(Debug)]
pub struct SimulatedEndpoint {
    url: String,
    ledger: Arc<SimulatedLedger>,
    faults: Mutex<VecDeque<Fault>>,
    rate_limit_always: AtomicBool,
    gas_price_wei: AtomicU64,
    requests: AtomicU64,
    sends: AtomicU64,
    calls: AtomicU64,
}

impl SimulatedEndpoint {
    pub fn new(url: impl Into<String>, ledger: Arc<SimulatedLedger>) -> Self {
        Self {
            url: url.into(),
            ledger,
            faults: Mutex::new(VecDeque::new()),
            rate_limit_always: AtomicBool::new(false),
            gas_price_wei: AtomicU64::new(30 * WEI_PER_GWEI as u64),
            requests: AtomicU64::new(0),
            sends: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    /// Queue `fault` for the next `times` requests it applies to.
    pub fn inject(&self, fault: Fault, times: usize) {
        let mut faults = self.faults.lock().unwrap_or_else(|p| p.into_inner());
        faults.extend(std::iter::repeat(fault).take(times));
    }

    /// Answer every request with HTTP 429 while set.
    pub fn rate_limit_always(&self, enabled: bool) {
        self.rate_limit_always.store(enabled, Ordering::SeqCst);
    }

    pub fn set_gas_price_gwei(&self, gwei: u64) {
        self.gas_price_wei
            .store(gwei.saturating_mul(WEI_PER_GWEI as u64), Ordering::SeqCst);
    }

    /// Requests of any kind received, including failed ones.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Broadcast attempts received.
    pub fn send_count(&self) -> u64 {
        self.sends.load(Ordering::SeqCst)
    }

    /// `eth_call` requests received.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_fault(&self, method: Method) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap_or_else(|p| p.into_inner());
        match faults.front() {
            Some(fault) if fault.applies_to(method) => faults.pop_front(),
            _ => None,
        }
    }

    async fn gate(&self, method: Method) -> LedgerResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.rate_limit_always.load(Ordering::SeqCst) {
            return Err(LedgerError::from_transport(
                "HTTP error 429 with body: Too Many Requests",
            ));
        }

        match self.next_fault(method) {
            None => Ok(()),
            Some(Fault::RateLimit) => Err(LedgerError::from_transport(
                "HTTP error 429 with body: Too Many Requests",
            )),
            Some(Fault::NonceTooLow) => Err(LedgerError::from_transport("nonce too low")),
            Some(Fault::Revert) => Err(LedgerError::from_transport(REVERT_MESSAGE)),
            Some(Fault::ClientTimeout) => Err(LedgerError::from_transport(format!(
                "error sending request for url ({}): operation timed out",
                self.url
            ))),
            Some(Fault::Hang) => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl LedgerTransport for SimulatedEndpoint {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> LedgerResult<u64> {
        self.gate(Method::ChainId).await?;
        Ok(self.ledger.chain_id())
    }

    async fn pending_nonce(&self, account: Address) -> LedgerResult<u64> {
        self.gate(Method::PendingNonce).await?;
        Ok(self.ledger.pending_nonce(account))
    }

    async fn gas_price(&self) -> LedgerResult<u128> {
        self.gate(Method::GasPrice).await?;
        Ok(self.gas_price_wei.load(Ordering::SeqCst) as u128)
    }

    async fn send_transaction(
        &self,
        call: &PreparedCall,
        options: &TxOptions,
    ) -> LedgerResult<TxHash> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.gate(Method::Send).await?;

        if options.chain_id != self.ledger.chain_id() {
            return Err(LedgerError::Rpc(format!(
                "invalid chain id {} (node serves {})",
                options.chain_id,
                self.ledger.chain_id()
            )));
        }

        self.ledger
            .submit(options.from, options.nonce, &call.data)
            .map_err(LedgerError::from_transport)
    }

    async fn call(&self, _to: Address, data: Bytes) -> LedgerResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate(Method::Call).await?;
        self.ledger.view(&data).map_err(LedgerError::from_transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fault_waits_for_matching_request() {
        let endpoint = SimulatedEndpoint::new("sim://a", SimulatedLedger::new(1));
        endpoint.inject(Fault::NonceTooLow, 1);

        // Not a broadcast, so the queued fault is left alone.
        assert!(endpoint.gas_price().await.is_ok());
        assert!(endpoint.chain_id().await.is_ok());
        assert_eq!(endpoint.request_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_classifies_as_rate_limited() {
        let endpoint = SimulatedEndpoint::new("sim://a", SimulatedLedger::new(1));
        endpoint.inject(Fault::RateLimit, 1);

        assert!(matches!(endpoint.chain_id().await, Err(LedgerError::RateLimited(_))));
        assert_eq!(endpoint.chain_id().await.unwrap(), 1);
    }
}
