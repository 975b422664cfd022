//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Exclude placeholder RPC endpoints before the pool is built
//! - Validate value ranges (timeouts > 0, attempts > 0, addresses parse)
//!
//! Returns all validation errors, not just the first.

use alloy::primitives::Address;
use thiserror::Error;
use url::Url;

use crate::config::schema::LedgerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const PLACEHOLDER_MARKERS: &[&str] = &["your_", "your-", "<", ">", "example.", "changeme", "xxx"];

/// True for endpoints that were left as template values or cannot be dialed.
pub fn is_placeholder_endpoint(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() || PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m)) {
        return true;
    }
    match Url::parse(&lowered) {
        Ok(url) => !matches!(url.scheme(), "http" | "https") || url.host_str().is_none(),
        Err(_) => true,
    }
}

/// Parse the configured endpoints, dropping placeholders in order.
pub fn usable_endpoints(urls: &[String]) -> Vec<Url> {
    urls.iter()
        .filter_map(|raw| {
            if is_placeholder_endpoint(raw) {
                tracing::warn!(url = %raw, "Excluding placeholder or invalid RPC endpoint");
                return None;
            }
            Url::parse(raw.trim()).ok()
        })
        .collect()
}

/// Parse an optional contract address. Empty strings mean "not deployed".
pub fn parse_contract_address(raw: &str) -> Result<Option<Address>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<Address>()
        .map(Some)
        .map_err(|e| format!("invalid address '{}': {}", trimmed, e))
}

/// Validate a parsed configuration.
pub fn validate_config(config: &LedgerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.chain_id == 0 {
        errors.push(ValidationError::new("network.chain_id", "must be non-zero"));
    }
    if usable_endpoints(&config.network.rpc_urls).is_empty() {
        errors.push(ValidationError::new(
            "network.rpc_urls",
            "no usable endpoint after excluding placeholders",
        ));
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }

    let contracts = [
        ("contracts.loan_registry", &config.contracts.loan_registry),
        ("contracts.credit_registry", &config.contracts.credit_registry),
        ("contracts.payment_ledger", &config.contracts.payment_ledger),
        ("contracts.access_control", &config.contracts.access_control),
    ];
    for (field, raw) in contracts {
        if let Err(message) = parse_contract_address(raw) {
            errors.push(ValidationError::new(field, message));
        }
    }

    let tx = &config.transactions;
    if tx.attempt_timeout_ms == 0 {
        errors.push(ValidationError::new("transactions.attempt_timeout_ms", "must be > 0"));
    }
    if !(1.0..=5.0).contains(&tx.gas_price_multiplier) {
        errors.push(ValidationError::new(
            "transactions.gas_price_multiplier",
            "must be between 1.0 and 5.0",
        ));
    }
    if tx.max_gas_price_gwei == 0 {
        errors.push(ValidationError::new("transactions.max_gas_price_gwei", "must be > 0"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if config.audit.backup_dir.trim().is_empty() {
        errors.push(ValidationError::new("audit.backup_dir", "must not be empty"));
    }
    if config.audit.upload_enabled && Url::parse(&config.audit.storage_api_url).is_err() {
        errors.push(ValidationError::new("audit.storage_api_url", "must be a valid URL"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
