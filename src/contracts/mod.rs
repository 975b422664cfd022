//! Contract facades.
//!
//! # Data Flow
//! ```text
//! Domain input (cleartext)
//!     → hashing (identifiers → keccak digests)
//!     → units / codes (decimals → base units & bps, labels → uint8 codes)
//!     → abi.rs (sol! calldata)
//!     → binding.rs → TxSubmitter / ReadRetrier
//!     ← records.rs (chain entries → normalized records)
//! ```
//!
//! # Design Decisions
//! - Facades never panic or return errors to the workflow; everything
//!   becomes a `WriteReceipt` or a `ReadOutcome`
//! - A missing context or address makes a facade inert, not an error

pub mod abi;
pub mod access_control;
pub mod binding;
pub mod codes;
pub mod credit_registry;
pub mod loan_registry;
pub mod payment_ledger;
pub mod records;
pub mod units;

use std::sync::Arc;

use crate::blockchain::context::LedgerContext;

pub use access_control::AccessControl;
pub use codes::{CreditGrade, DocumentType, LoanStatus, PaymentStatus};
pub use credit_registry::CreditRegistry;
pub use loan_registry::LoanRegistry;
pub use payment_ledger::PaymentLedger;
pub use records::{
    ChatLogRecord, ChatTurn, CreditRecord, CreditScore, Disbursement, DisbursementRecord,
    DocumentRecord, DocumentVerification, EmiPayment, LedgerRecord, LoanApplication, LoanRecord,
    PaymentRecord, SameEvent,
};

/// All four facades over one context.
#[derive(Debug, Clone)]
pub struct Ledgers {
    pub loans: LoanRegistry,
    pub credit: CreditRegistry,
    pub payments: PaymentLedger,
    pub access: AccessControl,
}

impl Ledgers {
    pub fn new(ctx: Option<Arc<LedgerContext>>) -> Self {
        Self {
            loans: LoanRegistry::new(ctx.clone()),
            credit: CreditRegistry::new(ctx.clone()),
            payments: PaymentLedger::new(ctx.clone()),
            access: AccessControl::new(ctx),
        }
    }

    /// Facades with no ledger behind them.
    pub fn unavailable() -> Self {
        Self::new(None)
    }
}
