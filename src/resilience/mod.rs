//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger read or write:
//!     → retry.rs (run attempt, classify error, decide)
//!     → caller hook (rotate endpoint / invalidate nonce)
//!     → backoff.rs (capped exponential or short jittered delay)
//!     → next attempt, until success or budget spent
//! ```
//!
//! # Design Decisions
//! - One combinator for every call site; only the classifier differs
//! - Rate limiting is backpressure: back off and rotate, never queue
//! - Exhaustion is reported apart from terminal failures so reads can degrade

pub mod backoff;
pub mod retry;

pub use retry::{RetryAction, RetryError, RetryPolicy};
