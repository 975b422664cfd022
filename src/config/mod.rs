//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, placeholder endpoint exclusion)
//!     → LedgerConfig (validated, immutable)
//!     → consumed once at startup to build the LedgerContext
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets (signing key, storage token) never live in the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuditConfig, ContractsConfig, GasLimits, LedgerConfig, NetworkConfig, ObservabilityConfig,
    RetryConfig, TransactionConfig,
};
