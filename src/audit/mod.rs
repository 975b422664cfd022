//! Audit aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! subject id (phone)
//!     → aggregator.rs
//!         on-chain:     six facade reads, spaced by inter_call_delay
//!         hybrid-local: caller's LocalSnapshot, zero network reads
//!     → document.rs (AuditDocument: provenance, summary, per-category entries)
//!     → storage.rs (content store upload + versioned local backup)
//! ```

pub mod aggregator;
pub mod document;
pub mod storage;

pub use aggregator::{AuditAggregator, AuditPublication};
pub use document::{AuditDocument, Category, GenerationMode, LocalSnapshot};
pub use storage::{BackupWriter, ContentStore, PinataStore};
