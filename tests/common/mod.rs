//! Shared fixtures for integration tests.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use loan_ledger::audit::AuditAggregator;
use loan_ledger::config::AuditConfig;
use loan_ledger::contracts::{
    ChatTurn, CreditGrade, CreditScore, Disbursement, DocumentType, DocumentVerification,
    EmiPayment, Ledgers, LoanApplication, LoanStatus, PaymentStatus,
};
use loan_ledger::sim::SimulatedNetwork;

pub const SUBJECT: &str = "+91-555-0100";
#[allow(dead_code)]
pub const OTHER_SUBJECT: &str = "+91-555-0199";

pub fn loan_application(phone: &str) -> LoanApplication {
    LoanApplication {
        phone: phone.into(),
        application_id: format!("APP-{}", phone),
        amount: Decimal::from(500_000),
        interest_rate: Decimal::from_str("11.75").unwrap(),
        tenure_months: 36,
        status: LoanStatus::Offered,
    }
}

#[allow(dead_code)]
pub fn chat_turn(phone: &str, turn: u32) -> ChatTurn {
    ChatTurn {
        session_id: format!("S-{}", phone),
        phone: phone.into(),
        user_message: format!("message {}", turn),
        bot_response: format!("response {}", turn),
        intent: "loan_inquiry".into(),
    }
}

#[allow(dead_code)]
pub fn document(phone: &str) -> DocumentVerification {
    DocumentVerification {
        application_id: format!("APP-{}", phone),
        phone: phone.into(),
        document_id: "DOC-PAN-1".into(),
        document_type: DocumentType::Pan,
        verified: true,
    }
}

#[allow(dead_code)]
pub fn credit_score(phone: &str) -> CreditScore {
    CreditScore {
        phone: phone.into(),
        application_id: format!("APP-{}", phone),
        score: 742,
        grade: CreditGrade::A,
    }
}

#[allow(dead_code)]
pub fn disbursement(phone: &str) -> Disbursement {
    Disbursement {
        application_id: format!("APP-{}", phone),
        phone: phone.into(),
        amount: Decimal::from(500_000),
        reference: "UTR-000123".into(),
    }
}

#[allow(dead_code)]
pub fn emi(phone: &str, installment: u16) -> EmiPayment {
    EmiPayment {
        application_id: format!("APP-{}", phone),
        phone: phone.into(),
        installment,
        amount: Decimal::from_str("16528.50").unwrap(),
        due_date: Utc
            .with_ymd_and_hms(2025, u32::from(installment), 5, 0, 0, 0)
            .unwrap(),
        status: PaymentStatus::Paid,
    }
}

/// Aggregator over `net` that backs up into `backup_dir` and never uploads.
#[allow(dead_code)]
pub fn aggregator(net: &SimulatedNetwork, backup_dir: &Path) -> AuditAggregator {
    let config = AuditConfig {
        upload_enabled: false,
        backup_dir: backup_dir.display().to_string(),
        inter_call_delay_ms: 0,
        ..AuditConfig::default()
    };
    AuditAggregator::new(
        Ledgers::new(Some(net.context.clone())),
        net.context.network().clone(),
        *net.context.contracts(),
        &config,
    )
}

/// Single-threaded runtime for driving async code inside proptest bodies.
#[allow(dead_code)]
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}
