//! Loan ledger client library.
//!
//! Commits privacy-hashed lending events to EVM ledger contracts over a
//! rate-limited JSON-RPC gateway, and rebuilds verifiable per-subject audit
//! documents from them.

pub mod audit;
pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod hashing;
pub mod observability;
pub mod resilience;
pub mod sim;

pub use audit::{AuditAggregator, AuditPublication, GenerationMode, LocalSnapshot};
pub use blockchain::{LedgerContext, LedgerError, LedgerResult, ReadOutcome, WriteReceipt};
pub use config::LedgerConfig;
pub use contracts::Ledgers;
pub use hashing::HashedIdentifier;
