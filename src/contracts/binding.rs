//! Shared write/read plumbing for the contract facades.
//!
//! A binding is a context plus one contract address. When either is missing
//! the facade is "not available": writes and reads return structured
//! failures without touching the network.

use alloy::primitives::{Address, Bytes};
use std::sync::Arc;

use crate::blockchain::context::LedgerContext;
use crate::blockchain::types::{
    ContractAddresses, LedgerError, LedgerResult, PreparedCall, ReadOutcome, WriteReceipt,
};
use crate::config::GasLimits;

/// A facade's view of the ledger: context and deployed address, if both exist.
#[derive(Debug, Clone)]
pub struct Binding {
    contract: &'static str,
    target: Option<(Arc<LedgerContext>, Address)>,
}

impl Binding {
    pub fn new(
        contract: &'static str,
        ctx: Option<Arc<LedgerContext>>,
        pick: impl FnOnce(&ContractAddresses) -> Option<Address>,
    ) -> Self {
        let target = ctx.and_then(|ctx| {
            let address = pick(ctx.contracts());
            address.map(|address| (ctx, address))
        });
        Self { contract, target }
    }

    pub fn is_available(&self) -> bool {
        self.target.is_some()
    }

    pub fn address(&self) -> Option<Address> {
        self.target.as_ref().map(|(_, address)| *address)
    }

    pub fn context(&self) -> Option<&Arc<LedgerContext>> {
        self.target.as_ref().map(|(ctx, _)| ctx)
    }

    fn not_available(&self) -> LedgerError {
        LedgerError::NotAvailable(format!("{} is not bound", self.contract))
    }

    /// Encode and submit a write. Every failure becomes a receipt.
    pub async fn write<G, E>(&self, operation: &'static str, gas_limit: G, encode: E) -> WriteReceipt
    where
        G: FnOnce(&GasLimits) -> u64,
        E: FnOnce() -> LedgerResult<Vec<u8>>,
    {
        let Some((ctx, to)) = &self.target else {
            tracing::debug!(
                operation = operation,
                contract = self.contract,
                "Ledger not bound, skipping write"
            );
            return WriteReceipt::failed(&self.not_available());
        };

        let data = match encode() {
            Ok(data) => Bytes::from(data),
            Err(err) => {
                tracing::warn!(operation = operation, error = %err, "Refusing to submit malformed record");
                return WriteReceipt::failed(&err);
            }
        };

        let call = PreparedCall {
            operation,
            to: *to,
            data,
            gas_limit: gas_limit(&ctx.tx_settings().gas_limits),
        };

        match ctx.submitter().submit(&call).await {
            Ok(hash) => WriteReceipt::accepted(hash.to_string()),
            Err(err) => WriteReceipt::failed(&err),
        }
    }

    /// Issue a view call and decode it. Every failure becomes an outcome.
    pub async fn read<T, D>(&self, label: &'static str, data: Vec<u8>, decode: D) -> ReadOutcome<T>
    where
        D: FnOnce(&[u8]) -> LedgerResult<Vec<T>>,
    {
        let Some((ctx, to)) = &self.target else {
            return ReadOutcome::unavailable();
        };

        match ctx.reader().read(label, *to, Bytes::from(data), decode).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(query = label, contract = self.contract, error = %err, "Ledger read failed");
                ReadOutcome::failed(&err)
            }
        }
    }
}

/// Map an ABI decode failure into the ledger taxonomy.
pub(crate) fn decode_error(label: &str, err: impl std::fmt::Display) -> LedgerError {
    LedgerError::Encoding(format!("{}: malformed response: {}", label, err))
}

/// Convert decoded chain entries into records, failing on the first bad one.
pub(crate) fn convert_all<E, R>(entries: Vec<E>) -> LedgerResult<Vec<R>>
where
    R: TryFrom<E, Error = LedgerError>,
{
    entries.into_iter().map(R::try_from).collect()
}
