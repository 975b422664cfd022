//! Audit documents built from local snapshots.

use chrono::Utc;
use serde_json::json;

use loan_ledger::audit::{Category, GenerationMode, LocalSnapshot};
use loan_ledger::contracts::{LedgerRecord, Ledgers};
use loan_ledger::sim::{Fault, SimulatedNetwork};
use loan_ledger::WriteReceipt;

mod common;
use common::{OTHER_SUBJECT, SUBJECT};

/// Every event kind for `phone`, captured the way a workflow would after writing it.
fn complete_snapshot(phone: &str) -> LocalSnapshot {
    let now = Utc::now();
    let receipt = |n: u8| WriteReceipt::accepted(format!("0x{:064x}", n));

    let mut snapshot = LocalSnapshot::new();
    snapshot.application = Some(json!({ "application_id": format!("APP-{}", phone), "purpose": "home" }));
    snapshot.customer_profile = Some(json!({ "segment": "salaried", "city": "Pune" }));

    snapshot.capture(
        LedgerRecord::Loan(common::loan_application(phone).to_record(now)),
        &receipt(1),
    );
    for turn in 0..3 {
        snapshot.capture(
            LedgerRecord::ChatLog(common::chat_turn(phone, turn).to_record(now)),
            &receipt(2),
        );
    }
    snapshot.capture(
        LedgerRecord::Document(common::document(phone).to_record(now)),
        &receipt(3),
    );
    snapshot.capture(
        LedgerRecord::Credit(common::credit_score(phone).to_record(now)),
        &receipt(4),
    );
    snapshot.capture(
        LedgerRecord::Disbursement(common::disbursement(phone).to_record(now)),
        &receipt(5),
    );
    for installment in 1..=4 {
        snapshot.capture(
            LedgerRecord::Payment(common::emi(phone, installment).to_record(now)),
            &receipt(6),
        );
    }
    snapshot
}

#[tokio::test]
async fn test_hybrid_counts_match_snapshot_without_network_calls() {
    let net = SimulatedNetwork::builder().build().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let snapshot = complete_snapshot(SUBJECT);

    let publication = common::aggregator(&net, dir.path())
        .build_audit_document(SUBJECT, GenerationMode::HybridLocal, Some(&snapshot))
        .await
        .unwrap();

    assert_eq!(net.request_count(), 0);

    let document = &publication.document;
    assert_eq!(document.mode, GenerationMode::HybridLocal);
    for category in Category::ALL {
        assert_eq!(
            document.records.count(category),
            snapshot.count(category),
            "{}",
            category.as_str()
        );
    }
    assert_eq!(document.summary.total, snapshot.records.len());
    assert!(!document.provenance.possibly_incomplete);
    assert_eq!(document.customer_profile, snapshot.customer_profile);
    assert_eq!(document.application, snapshot.application);
    assert!(publication.backup_path.is_some());
}

#[tokio::test]
async fn test_hybrid_ignores_other_subjects_records() {
    let net = SimulatedNetwork::builder().build().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut snapshot = complete_snapshot(SUBJECT);
    let foreign = complete_snapshot(OTHER_SUBJECT);
    snapshot.records.extend(foreign.records);

    let publication = common::aggregator(&net, dir.path())
        .build_audit_document(SUBJECT, GenerationMode::HybridLocal, Some(&snapshot))
        .await
        .unwrap();

    assert_eq!(publication.document.summary.total, snapshot.records.len() / 2);
    assert_eq!(publication.document.summary.emis, 4);
    assert_eq!(net.request_count(), 0);
}

#[tokio::test]
async fn test_hybrid_works_while_ledger_is_throttled() {
    let net = SimulatedNetwork::builder().endpoints(2).build().unwrap();
    for endpoint in &net.endpoints {
        endpoint.rate_limit_always(true);
    }
    let dir = tempfile::tempdir().unwrap();
    let snapshot = complete_snapshot(SUBJECT);
    let aggregator = common::aggregator(&net, dir.path());

    let on_chain = aggregator
        .build_audit_document(SUBJECT, GenerationMode::OnChain, Some(&snapshot))
        .await
        .unwrap();
    assert!(on_chain.document.provenance.possibly_incomplete);
    assert_eq!(on_chain.document.summary.total, 0);
    assert_eq!(
        on_chain.document.provenance.unavailable_categories,
        Category::ALL.to_vec()
    );

    let requests = net.request_count();
    let hybrid = aggregator
        .build_audit_document(SUBJECT, GenerationMode::HybridLocal, Some(&snapshot))
        .await
        .unwrap();
    assert_eq!(net.request_count(), requests);
    assert_eq!(hybrid.document.summary.total, snapshot.records.len());
    assert_ne!(on_chain.backup_path, hybrid.backup_path);
}

#[tokio::test]
async fn test_on_chain_marks_only_the_failed_category() {
    let net = SimulatedNetwork::builder().build().unwrap();
    let ledgers = Ledgers::new(Some(net.context.clone()));
    assert!(
        ledgers
            .loans
            .submit_loan_application(&common::loan_application(SUBJECT))
            .await
            .accepted
    );
    assert!(
        ledgers
            .credit
            .submit_credit_score(&common::credit_score(SUBJECT))
            .await
            .accepted
    );

    // Loans are read first; a revert is not retried.
    net.endpoints[0].inject(Fault::Revert, 1);
    let dir = tempfile::tempdir().unwrap();
    let before = net.request_count();

    let publication = common::aggregator(&net, dir.path())
        .build_audit_document(SUBJECT, GenerationMode::OnChain, None)
        .await
        .unwrap();

    let document = &publication.document;
    assert!(document.provenance.possibly_incomplete);
    assert_eq!(document.provenance.unavailable_categories, vec![Category::Loans]);
    assert_eq!(document.summary.loans, 0);
    assert_eq!(document.summary.credit_history, 1);
    assert!(document.records.credit_history[0].transaction_hash.is_none());
    assert_eq!(net.request_count() - before, Category::ALL.len() as u64);
}
