//! Ledger client subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (private key) + LedgerConfig (RPC URLs, chain id)
//!     → wallet.rs (signer)
//!     → endpoint.rs (circular pool of transport.rs clients)
//!     → context.rs (one LedgerContext per process)
//!         → submitter.rs (gas price → nonce.rs reserve → broadcast)
//!         → reader.rs (eth_call with rotation/backoff, degrade to unavailable)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or cleartext identifiers
//! - All RPC calls have timeouts
//! - Graceful degradation when the ledger is unreachable

pub mod context;
pub mod endpoint;
pub mod nonce;
pub mod reader;
pub mod submitter;
pub mod transport;
pub mod types;
pub mod wallet;

pub use context::LedgerContext;
pub use endpoint::EndpointPool;
pub use nonce::NonceAllocator;
pub use transport::{LedgerTransport, RpcTransport};
pub use types::{
    ChainId, ContractAddresses, ErrorClass, LedgerError, LedgerResult, NetworkIdentity,
    PreparedCall, ReadOutcome, TxOptions, WriteReceipt,
};
pub use wallet::Signer;
