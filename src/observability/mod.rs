//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Cleartext identifiers never appear in log fields, only digests
//! - Metric labels are operation names and outcomes, never subject data

pub mod logging;
pub mod metrics;
