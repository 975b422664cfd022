//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the ledger client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the ledger client and audit aggregator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// Network profile (chain id, RPC endpoints, explorer).
    pub network: NetworkConfig,

    /// Deployed contract addresses.
    pub contracts: ContractsConfig,

    /// Write path settings (gas, per-attempt timeout).
    pub transactions: TransactionConfig,

    /// Retry and backoff policy shared by reads and writes.
    pub retries: RetryConfig,

    /// Audit document generation and publishing.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network profile the client talks to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Human-readable network name, carried into audit provenance.
    pub name: String,

    /// Chain ID (e.g., 80002 for Polygon Amoy, 31337 for local Anvil).
    pub chain_id: u64,

    /// Ordered JSON-RPC endpoints. The first usable one is active at startup.
    pub rpc_urls: Vec<String>,

    /// Block explorer base URL used to build verification links.
    pub explorer_url: Option<String>,

    /// RPC request timeout in seconds for individual reads.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "polygon-amoy".to_string(),
            chain_id: 80002,
            rpc_urls: vec!["https://rpc-amoy.polygon.technology".to_string()],
            explorer_url: Some("https://amoy.polygonscan.com".to_string()),
            rpc_timeout_secs: 10,
        }
    }
}

/// Deployed ledger contract addresses. Empty means "not deployed".
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractsConfig {
    pub loan_registry: String,
    pub credit_registry: String,
    pub payment_ledger: String,
    pub access_control: String,
}

/// Write path configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Maximum time to wait for pending-pool acceptance per attempt.
    pub attempt_timeout_ms: u64,

    /// Gas price multiplier (1.0 = network price, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Gas limit hints per operation.
    pub gas_limits: GasLimits,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: 30_000,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
            gas_limits: GasLimits::default(),
        }
    }
}

/// Gas limit hint per ledger operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasLimits {
    pub application: u64,
    pub chat_turn: u64,
    pub document: u64,
    pub credit_score: u64,
    pub disbursement: u64,
    pub emi_payment: u64,
    pub access: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            application: 400_000,
            chat_turn: 300_000,
            document: 300_000,
            credit_score: 200_000,
            disbursement: 250_000,
            emi_payment: 250_000,
            access: 100_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per operation (first try included).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Delay before retrying after a nonce conflict, in milliseconds.
    pub resync_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            resync_delay_ms: 250,
        }
    }
}

/// Audit document generation and publishing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Version tag written into every document.
    pub version: String,

    /// Upload documents to content-addressed storage.
    pub upload_enabled: bool,

    /// Pinning API endpoint accepting JSON uploads.
    pub storage_api_url: String,

    /// Gateway base used to build retrieval URLs.
    pub gateway_url: String,

    /// Local directory for durable backups.
    pub backup_dir: String,

    /// Pause between per-category reads in on-chain mode.
    pub inter_call_delay_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            upload_enabled: true,
            storage_api_url: "https://api.pinata.cloud/pinning/pinJSONToIPFS".to_string(),
            gateway_url: "https://gateway.pinata.cloud/ipfs".to_string(),
            backup_dir: "audit_backups".to_string(),
            inter_call_delay_ms: 200,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
