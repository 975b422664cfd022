//! Domain inputs for ledger writes and normalized records decoded from reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::blockchain::types::LedgerResult;
use crate::contracts::abi::{
    ChatEntry, CreditEntry, DisbursementEntry, DocumentEntry, EmiEntry, LoanEntry,
};
use crate::contracts::codes::{CreditGrade, DocumentType, LoanStatus, PaymentStatus};
use crate::contracts::units::{bps_to_rate, chain_time, from_base_units};
use crate::hashing::HashedIdentifier;

// ---------------------------------------------------------------------------
// Write inputs (cleartext; hashed by the facades before leaving the process)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub phone: String,
    pub application_id: String,
    pub amount: Decimal,
    /// Annual rate in percent, e.g. 11.75.
    pub interest_rate: Decimal,
    pub tenure_months: u16,
    pub status: LoanStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub session_id: String,
    pub phone: String,
    pub user_message: String,
    pub bot_response: String,
    /// Classified intent label; not personal data.
    pub intent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVerification {
    pub application_id: String,
    pub phone: String,
    pub document_id: String,
    pub document_type: DocumentType,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditScore {
    pub phone: String,
    pub application_id: String,
    pub score: u16,
    pub grade: CreditGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disbursement {
    pub application_id: String,
    pub phone: String,
    pub amount: Decimal,
    /// Bank or UPI reference.
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiPayment {
    pub application_id: String,
    pub phone: String,
    pub installment: u16,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: PaymentStatus,
}

// ---------------------------------------------------------------------------
// Normalized records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub phone_hash: HashedIdentifier,
    pub application_hash: HashedIdentifier,
    pub amount: Decimal,
    pub interest_rate: Decimal,
    pub tenure_months: u16,
    pub status: LoanStatus,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogRecord {
    pub session_hash: HashedIdentifier,
    pub phone_hash: HashedIdentifier,
    pub message_hash: HashedIdentifier,
    pub response_hash: HashedIdentifier,
    pub intent: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub application_hash: HashedIdentifier,
    pub phone_hash: HashedIdentifier,
    pub document_hash: HashedIdentifier,
    pub document_type: DocumentType,
    pub verified: bool,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub phone_hash: HashedIdentifier,
    pub application_hash: HashedIdentifier,
    pub score: u16,
    pub grade: CreditGrade,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisbursementRecord {
    pub application_hash: HashedIdentifier,
    pub phone_hash: HashedIdentifier,
    pub amount: Decimal,
    pub reference_hash: HashedIdentifier,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub application_hash: HashedIdentifier,
    pub phone_hash: HashedIdentifier,
    pub installment: u16,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Any record the ledgers hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerRecord {
    Loan(LoanRecord),
    ChatLog(ChatLogRecord),
    Document(DocumentRecord),
    Credit(CreditRecord),
    Disbursement(DisbursementRecord),
    Payment(PaymentRecord),
}

/// Equality on everything except the ledger-assigned timestamp.
///
/// Used to attach write-path transaction hashes to records read back later.
pub trait SameEvent {
    fn same_event(&self, other: &Self) -> bool;
}

impl SameEvent for LoanRecord {
    fn same_event(&self, other: &Self) -> bool {
        self.phone_hash == other.phone_hash
            && self.application_hash == other.application_hash
            && self.amount == other.amount
            && self.interest_rate == other.interest_rate
            && self.tenure_months == other.tenure_months
            && self.status == other.status
    }
}

impl SameEvent for ChatLogRecord {
    fn same_event(&self, other: &Self) -> bool {
        self.session_hash == other.session_hash && self.message_hash == other.message_hash
    }
}

impl SameEvent for DocumentRecord {
    fn same_event(&self, other: &Self) -> bool {
        self.document_hash == other.document_hash
            && self.document_type == other.document_type
            && self.verified == other.verified
    }
}

impl SameEvent for CreditRecord {
    fn same_event(&self, other: &Self) -> bool {
        self.application_hash == other.application_hash
            && self.score == other.score
            && self.grade == other.grade
    }
}

impl SameEvent for DisbursementRecord {
    fn same_event(&self, other: &Self) -> bool {
        self.reference_hash == other.reference_hash && self.amount == other.amount
    }
}

impl SameEvent for PaymentRecord {
    fn same_event(&self, other: &Self) -> bool {
        self.application_hash == other.application_hash
            && self.installment == other.installment
            && self.status == other.status
    }
}

// ---------------------------------------------------------------------------
// Input → record, for capturing writes into a local snapshot
// ---------------------------------------------------------------------------

impl LoanApplication {
    pub fn to_record(&self, recorded_at: DateTime<Utc>) -> LoanRecord {
        LoanRecord {
            phone_hash: HashedIdentifier::of(&self.phone),
            application_hash: HashedIdentifier::of(&self.application_id),
            amount: self.amount,
            interest_rate: self.interest_rate,
            tenure_months: self.tenure_months,
            status: self.status,
            recorded_at,
        }
    }
}

impl ChatTurn {
    pub fn to_record(&self, recorded_at: DateTime<Utc>) -> ChatLogRecord {
        ChatLogRecord {
            session_hash: HashedIdentifier::of(&self.session_id),
            phone_hash: HashedIdentifier::of(&self.phone),
            message_hash: HashedIdentifier::of(&self.user_message),
            response_hash: HashedIdentifier::of(&self.bot_response),
            intent: self.intent.clone(),
            recorded_at,
        }
    }
}

impl DocumentVerification {
    pub fn to_record(&self, recorded_at: DateTime<Utc>) -> DocumentRecord {
        DocumentRecord {
            application_hash: HashedIdentifier::of(&self.application_id),
            phone_hash: HashedIdentifier::of(&self.phone),
            document_hash: HashedIdentifier::of(&self.document_id),
            document_type: self.document_type,
            verified: self.verified,
            recorded_at,
        }
    }
}

impl CreditScore {
    pub fn to_record(&self, recorded_at: DateTime<Utc>) -> CreditRecord {
        CreditRecord {
            phone_hash: HashedIdentifier::of(&self.phone),
            application_hash: HashedIdentifier::of(&self.application_id),
            score: self.score,
            grade: self.grade,
            recorded_at,
        }
    }
}

impl Disbursement {
    pub fn to_record(&self, recorded_at: DateTime<Utc>) -> DisbursementRecord {
        DisbursementRecord {
            application_hash: HashedIdentifier::of(&self.application_id),
            phone_hash: HashedIdentifier::of(&self.phone),
            amount: self.amount,
            reference_hash: HashedIdentifier::of(&self.reference),
            recorded_at,
        }
    }
}

impl EmiPayment {
    pub fn to_record(&self, recorded_at: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            application_hash: HashedIdentifier::of(&self.application_id),
            phone_hash: HashedIdentifier::of(&self.phone),
            installment: self.installment,
            amount: self.amount,
            due_date: self.due_date,
            status: self.status,
            recorded_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Chain entry → record
// ---------------------------------------------------------------------------

impl TryFrom<LoanEntry> for LoanRecord {
    type Error = crate::blockchain::types::LedgerError;

    fn try_from(entry: LoanEntry) -> LedgerResult<Self> {
        Ok(Self {
            phone_hash: entry.phoneHash.into(),
            application_hash: entry.applicationHash.into(),
            amount: from_base_units(entry.amount)?,
            interest_rate: bps_to_rate(entry.interestBps),
            tenure_months: entry.tenureMonths,
            status: LoanStatus::from_code(entry.status),
            recorded_at: chain_time(entry.timestamp)?,
        })
    }
}

impl TryFrom<ChatEntry> for ChatLogRecord {
    type Error = crate::blockchain::types::LedgerError;

    fn try_from(entry: ChatEntry) -> LedgerResult<Self> {
        Ok(Self {
            session_hash: entry.sessionHash.into(),
            phone_hash: entry.phoneHash.into(),
            message_hash: entry.messageHash.into(),
            response_hash: entry.responseHash.into(),
            intent: entry.intent,
            recorded_at: chain_time(entry.timestamp)?,
        })
    }
}

impl TryFrom<DocumentEntry> for DocumentRecord {
    type Error = crate::blockchain::types::LedgerError;

    fn try_from(entry: DocumentEntry) -> LedgerResult<Self> {
        Ok(Self {
            application_hash: entry.applicationHash.into(),
            phone_hash: entry.phoneHash.into(),
            document_hash: entry.documentHash.into(),
            document_type: DocumentType::from_code(entry.docType),
            verified: entry.verified,
            recorded_at: chain_time(entry.timestamp)?,
        })
    }
}

impl TryFrom<CreditEntry> for CreditRecord {
    type Error = crate::blockchain::types::LedgerError;

    fn try_from(entry: CreditEntry) -> LedgerResult<Self> {
        Ok(Self {
            phone_hash: entry.phoneHash.into(),
            application_hash: entry.applicationHash.into(),
            score: entry.score,
            grade: CreditGrade::from_code(entry.grade),
            recorded_at: chain_time(entry.timestamp)?,
        })
    }
}

impl TryFrom<DisbursementEntry> for DisbursementRecord {
    type Error = crate::blockchain::types::LedgerError;

    fn try_from(entry: DisbursementEntry) -> LedgerResult<Self> {
        Ok(Self {
            application_hash: entry.applicationHash.into(),
            phone_hash: entry.phoneHash.into(),
            amount: from_base_units(entry.amount)?,
            reference_hash: entry.referenceHash.into(),
            recorded_at: chain_time(entry.timestamp)?,
        })
    }
}

impl TryFrom<EmiEntry> for PaymentRecord {
    type Error = crate::blockchain::types::LedgerError;

    fn try_from(entry: EmiEntry) -> LedgerResult<Self> {
        Ok(Self {
            application_hash: entry.applicationHash.into(),
            phone_hash: entry.phoneHash.into(),
            installment: entry.installment,
            amount: from_base_units(entry.amount)?,
            due_date: chain_time(entry.dueDate)?,
            status: PaymentStatus::from_code(entry.status),
            recorded_at: chain_time(entry.timestamp)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use std::str::FromStr;

    #[test]
    fn test_loan_entry_decodes_to_labels_and_decimals() {
        let entry = LoanEntry {
            phoneHash: HashedIdentifier::of("+91-555-0100").as_b256(),
            applicationHash: HashedIdentifier::of("APP-1").as_b256(),
            amount: U256::from(50_000_000u64),
            interestBps: 1175,
            tenureMonths: 24,
            status: 1,
            timestamp: 1_700_000_000,
        };

        let record = LoanRecord::try_from(entry).unwrap();
        assert_eq!(record.status, LoanStatus::Offered);
        assert_eq!(record.interest_rate.to_string(), "11.75");
        assert_eq!(record.amount, Decimal::from(500_000));
        assert_eq!(record.phone_hash, HashedIdentifier::of("+91-555-0100"));
    }

    #[test]
    fn test_tagged_record_serialization() {
        let record = LedgerRecord::Credit(CreditRecord {
            phone_hash: HashedIdentifier::of("p"),
            application_hash: HashedIdentifier::of("a"),
            score: 742,
            grade: CreditGrade::A,
            recorded_at: chain_time(1_700_000_000).unwrap(),
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "credit");
        assert_eq!(json["grade"], "A");
        assert_eq!(json["score"], 742);
    }

    #[test]
    fn test_same_event_ignores_timestamp() {
        let app = LoanApplication {
            phone: "+91-555-0100".into(),
            application_id: "APP-1".into(),
            amount: Decimal::from(500_000),
            interest_rate: Decimal::from_str("11.75").unwrap(),
            tenure_months: 24,
            status: LoanStatus::Offered,
        };
        let local = app.to_record(chain_time(1).unwrap());
        let chain = app.to_record(chain_time(2).unwrap());
        assert!(local.same_event(&chain));

        let mut other = chain.clone();
        other.status = LoanStatus::Accepted;
        assert!(!local.same_event(&other));
    }
}
