//! Audit document shape and the local snapshot it can be built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::blockchain::types::{ContractAddresses, NetworkIdentity, WriteReceipt};
use crate::contracts::records::{
    ChatLogRecord, CreditRecord, DisbursementRecord, DocumentRecord, LedgerRecord, LoanRecord,
    PaymentRecord,
};
use crate::hashing::HashedIdentifier;

/// Where the document's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// Read back from the ledgers.
    OnChain,
    /// Built from a caller-supplied snapshot without network reads.
    HybridLocal,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::OnChain => "on-chain",
            GenerationMode::HybridLocal => "hybrid-local",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record categories, in the order they are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Loans,
    ChatLogs,
    Documents,
    CreditHistory,
    Disbursements,
    Emis,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Loans,
        Category::ChatLogs,
        Category::Documents,
        Category::CreditHistory,
        Category::Disbursements,
        Category::Emis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Loans => "loans",
            Category::ChatLogs => "chat_logs",
            Category::Documents => "documents",
            Category::CreditHistory => "credit_history",
            Category::Disbursements => "disbursements",
            Category::Emis => "emis",
        }
    }

    pub fn of(record: &LedgerRecord) -> Self {
        match record {
            LedgerRecord::Loan(_) => Category::Loans,
            LedgerRecord::ChatLog(_) => Category::ChatLogs,
            LedgerRecord::Document(_) => Category::Documents,
            LedgerRecord::Credit(_) => Category::CreditHistory,
            LedgerRecord::Disbursement(_) => Category::Disbursements,
            LedgerRecord::Payment(_) => Category::Emis,
        }
    }
}

/// A record plus how to verify it independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_url: Option<String>,
}

impl<T> AuditEntry<T> {
    pub fn new(record: T, transaction_hash: Option<String>, network: &NetworkIdentity) -> Self {
        let verify_url = transaction_hash
            .as_deref()
            .and_then(|hash| network.transaction_url(hash));
        Self {
            record,
            transaction_hash,
            verify_url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditRecords {
    pub loans: Vec<AuditEntry<LoanRecord>>,
    pub chat_logs: Vec<AuditEntry<ChatLogRecord>>,
    pub documents: Vec<AuditEntry<DocumentRecord>>,
    pub credit_history: Vec<AuditEntry<CreditRecord>>,
    pub disbursements: Vec<AuditEntry<DisbursementRecord>>,
    pub emis: Vec<AuditEntry<PaymentRecord>>,
}

impl AuditRecords {
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Loans => self.loans.len(),
            Category::ChatLogs => self.chat_logs.len(),
            Category::Documents => self.documents.len(),
            Category::CreditHistory => self.credit_history.len(),
            Category::Disbursements => self.disbursements.len(),
            Category::Emis => self.emis.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub loans: usize,
    pub chat_logs: usize,
    pub documents: usize,
    pub credit_history: usize,
    pub disbursements: usize,
    pub emis: usize,
    pub total: usize,
}

impl Summary {
    pub fn of(records: &AuditRecords) -> Self {
        let mut summary = Self {
            loans: records.loans.len(),
            chat_logs: records.chat_logs.len(),
            documents: records.documents.len(),
            credit_history: records.credit_history.len(),
            disbursements: records.disbursements.len(),
            emis: records.emis.len(),
            total: 0,
        };
        summary.total = Category::ALL.iter().map(|c| records.count(*c)).sum();
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub network: String,
    pub chain_id: u64,
    pub contracts: ContractAddresses,
    pub possibly_incomplete: bool,
    pub unavailable_categories: Vec<Category>,
}

/// Consolidated, independently verifiable history for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditDocument {
    pub document_id: Uuid,
    pub version: String,
    pub subject_id: String,
    pub subject_hash: HashedIdentifier,
    pub mode: GenerationMode,
    pub generated_at: DateTime<Utc>,
    pub provenance: Provenance,
    pub summary: Summary,
    pub records: AuditRecords,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_profile: Option<Value>,
}

/// A write as the workflow saw it, with the hash the ledger returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedRecord {
    #[serde(flatten)]
    pub record: LedgerRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// Workflow-side copy of a subject's records, kept alongside the ledger writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_profile: Option<Value>,
    #[serde(default)]
    pub records: Vec<CapturedRecord>,
}

impl LocalSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a write and, if accepted, its transaction hash.
    pub fn capture(&mut self, record: LedgerRecord, receipt: &WriteReceipt) {
        let transaction_hash = if receipt.accepted {
            receipt.transaction_hash.clone()
        } else {
            None
        };
        self.records.push(CapturedRecord {
            record,
            transaction_hash,
        });
    }

    pub fn count(&self, category: Category) -> usize {
        self.records
            .iter()
            .filter(|c| Category::of(&c.record) == category)
            .count()
    }
}
