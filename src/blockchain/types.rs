//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes};
use serde::Serialize;
use thiserror::Error;

use crate::config::validation::parse_contract_address;
use crate::config::{ContractsConfig, NetworkConfig};

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Missing schema, address or key at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider refused the request for rate or capacity reasons.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} ms")]
    Timeout(u64),

    /// Provider or HTTP client reported a timeout of its own.
    #[error("RPC timeout: {0}")]
    TransportTimeout(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Stale, duplicate or underpriced-replacement nonce.
    #[error("Nonce conflict: {0}")]
    OrderingConflict(String),

    /// Business-rule revert (e.g. unauthorized signer).
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Malformed payload on the encode or decode path.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Client, signer or contract binding not initialized.
    #[error("Ledger not available: {0}")]
    NotAvailable(String),

    /// Content store or backup failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// How the retry combinator should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    Timeout,
    OrderingConflict,
    Rejected,
    Other,
}

const RATE_LIMIT_MARKERS: &[&str] = &[
    "http error 429",
    "status 429",
    "status code 429",
    "http error 503",
    "status 503",
    "status code 503",
    "service unavailable",
    "rate limit",
    "rate-limit",
    "too many requests",
    "limit exceeded",
    "compute units per second",
    "-32005",
];

const ORDERING_MARKERS: &[&str] = &[
    "nonce too low",
    "nonce has already been used",
    "replacement transaction underpriced",
    "already known",
    "known transaction",
];

const REVERT_MARKERS: &[&str] = &["execution reverted", "revert", "unauthorized"];

impl ErrorClass {
    /// Classify a raw provider error message.
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        if ORDERING_MARKERS.iter().any(|m| lowered.contains(m)) {
            ErrorClass::OrderingConflict
        } else if REVERT_MARKERS.iter().any(|m| lowered.contains(m)) {
            ErrorClass::Rejected
        } else if RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m)) {
            ErrorClass::RateLimited
        } else if lowered.contains("timed out") || lowered.contains("timeout") {
            ErrorClass::Timeout
        } else {
            ErrorClass::Other
        }
    }
}

impl LedgerError {
    /// Build a typed error from a raw transport error message.
    pub fn from_transport(message: impl Into<String>) -> Self {
        let message = message.into();
        match ErrorClass::classify(&message) {
            ErrorClass::RateLimited => LedgerError::RateLimited(message),
            ErrorClass::OrderingConflict => LedgerError::OrderingConflict(message),
            ErrorClass::Rejected => LedgerError::Rejected(message),
            ErrorClass::Timeout => LedgerError::TransportTimeout(message),
            ErrorClass::Other => LedgerError::Rpc(message),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::RateLimited(_) => ErrorClass::RateLimited,
            LedgerError::Timeout(_) | LedgerError::TransportTimeout(_) => ErrorClass::Timeout,
            LedgerError::OrderingConflict(_) => ErrorClass::OrderingConflict,
            LedgerError::Rejected(_) | LedgerError::GasPriceTooHigh { .. } => ErrorClass::Rejected,
            _ => ErrorClass::Other,
        }
    }
}

/// Network identity carried into audit provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkIdentity {
    pub name: String,
    pub chain_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl NetworkIdentity {
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            name: config.name.clone(),
            chain_id: config.chain_id,
            explorer_url: config
                .explorer_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        }
    }

    /// Link to a transaction on the configured explorer.
    pub fn transaction_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base, tx_hash))
    }
}

/// Deployed contract addresses; `None` means the ledger is not bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContractAddresses {
    pub loan_registry: Option<Address>,
    pub credit_registry: Option<Address>,
    pub payment_ledger: Option<Address>,
    pub access_control: Option<Address>,
}

impl ContractAddresses {
    pub fn from_config(config: &ContractsConfig) -> LedgerResult<Self> {
        let parse = |field: &str, raw: &str| {
            parse_contract_address(raw)
                .map_err(|e| LedgerError::Configuration(format!("contracts.{}: {}", field, e)))
        };
        Ok(Self {
            loan_registry: parse("loan_registry", &config.loan_registry)?,
            credit_registry: parse("credit_registry", &config.credit_registry)?,
            payment_ledger: parse("payment_ledger", &config.payment_ledger)?,
            access_control: parse("access_control", &config.access_control)?,
        })
    }
}

/// A contract call ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    /// Operation label for logs and metrics.
    pub operation: &'static str,
    pub to: Address,
    pub data: Bytes,
    /// Gas limit hint for this operation.
    pub gas_limit: u64,
}

/// Per-submission transaction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    pub from: Address,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

/// Structured result of a ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReceipt {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteReceipt {
    pub fn accepted(tx_hash: impl Into<String>) -> Self {
        Self {
            accepted: true,
            transaction_hash: Some(tx_hash.into()),
            error: None,
        }
    }

    pub fn failed(error: &LedgerError) -> Self {
        Self {
            accepted: false,
            transaction_hash: None,
            error: Some(error.to_string()),
        }
    }

    /// The surrounding workflow should tag its local record for reconciliation.
    pub fn pending_confirmation(&self) -> bool {
        !self.accepted
    }
}

/// Structured result of a ledger read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadOutcome<T> {
    pub available: bool,
    pub records: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ReadOutcome<T> {
    pub fn available(records: Vec<T>) -> Self {
        Self {
            available: true,
            records,
            error: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            records: Vec::new(),
            error: None,
        }
    }

    pub fn failed(error: &LedgerError) -> Self {
        Self {
            available: false,
            records: Vec::new(),
            error: Some(error.to_string()),
        }
    }

}
