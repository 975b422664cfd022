//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set, so operators can
//! raise verbosity for one run without editing the config file.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor the config says otherwise.
pub const DEFAULT_FILTER: &str = "loan_ledger=info";

/// Build the filter for `level` (a bare level like `debug` or a full directive).
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.trim();
        if level.is_empty() {
            return EnvFilter::new(DEFAULT_FILTER);
        }
        if level.contains('=') {
            EnvFilter::new(level)
        } else {
            EnvFilter::new(format!("loan_ledger={}", level))
        }
    })
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
