//! End-to-end ledger writes and reads against the simulated network.

use alloy::primitives::B256;
use alloy::sol_types::SolCall;
use proptest::prelude::*;

use loan_ledger::audit::{GenerationMode, LocalSnapshot};
use loan_ledger::contracts::abi::ILoanRegistry;
use loan_ledger::contracts::{LedgerRecord, Ledgers, LoanStatus};
use loan_ledger::hashing::HashedIdentifier;
use loan_ledger::sim::SimulatedNetwork;

mod common;
use common::SUBJECT;

fn is_tx_hash(hash: &str) -> bool {
    hash.len() == 66
        && hash.starts_with("0x")
        && hash[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[tokio::test]
async fn test_loan_application_scenario() {
    let net = SimulatedNetwork::builder().build().unwrap();
    let ledgers = Ledgers::new(Some(net.context.clone()));

    let receipt = ledgers
        .loans
        .submit_loan_application(&common::loan_application(SUBJECT))
        .await;
    assert!(receipt.accepted, "write failed: {:?}", receipt.error);
    let hash = receipt.transaction_hash.clone().unwrap();
    assert!(is_tx_hash(&hash), "malformed hash {}", hash);

    // What actually went on chain.
    let phone_hash: B256 = HashedIdentifier::of(SUBJECT).into();
    let raw = net
        .ledger
        .view(&ILoanRegistry::getLoansByPhoneCall { phoneHash: phone_hash }.abi_encode())
        .unwrap();
    let entries = ILoanRegistry::getLoansByPhoneCall::abi_decode_returns(&raw).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].interestBps, 1175);
    assert_eq!(entries[0].status, LoanStatus::Offered.code().unwrap());

    let outcome = ledgers.loans.query_loans(SUBJECT).await;
    assert!(outcome.available);
    assert_eq!(outcome.records.len(), 1);
    let loan = &outcome.records[0];
    assert_eq!(loan.interest_rate.to_string(), "11.75");
    assert_eq!(loan.status, LoanStatus::Offered);
    assert_eq!(loan.phone_hash, HashedIdentifier::of(SUBJECT));
}

#[tokio::test]
async fn test_consecutive_submissions_get_n_and_n_plus_one() {
    let net = SimulatedNetwork::builder().base_nonce(12).build().unwrap();
    let ledgers = Ledgers::new(Some(net.context.clone()));

    let first = ledgers
        .loans
        .submit_loan_application(&common::loan_application(SUBJECT))
        .await;
    let second = ledgers
        .credit
        .submit_credit_score(&common::credit_score(SUBJECT))
        .await;

    assert!(first.accepted && second.accepted);
    assert_ne!(first.transaction_hash, second.transaction_hash);
    assert_eq!(net.ledger.accepted_nonces(), vec![12, 13]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_never_collide() {
    let net = SimulatedNetwork::builder().endpoints(2).base_nonce(5).build().unwrap();
    let ledgers = Ledgers::new(Some(net.context.clone()));

    let mut tasks = tokio::task::JoinSet::new();
    for turn in 0..8u32 {
        let ledgers = ledgers.clone();
        tasks.spawn(async move {
            ledgers
                .loans
                .submit_chat_turn(&common::chat_turn(SUBJECT, turn))
                .await
        });
    }
    while let Some(receipt) = tasks.join_next().await {
        assert!(receipt.unwrap().accepted);
    }

    let mut nonces = net.ledger.accepted_nonces();
    nonces.sort_unstable();
    assert_eq!(nonces, (5..13).collect::<Vec<u64>>());
    assert_eq!(ledgers.loans.query_chat_logs(SUBJECT).await.records.len(), 8);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_nonces_follow_issuance_order(base in 0u64..10_000, writes in 1usize..8) {
        let accepted = common::runtime().block_on(async {
            let net = SimulatedNetwork::builder().base_nonce(base).build().unwrap();
            let ledgers = Ledgers::new(Some(net.context.clone()));
            for _ in 0..writes {
                let receipt = ledgers
                    .credit
                    .submit_credit_score(&common::credit_score(SUBJECT))
                    .await;
                assert!(receipt.accepted);
            }
            net.ledger.accepted_nonces()
        });

        let expected: Vec<u64> = (base..base + writes as u64).collect();
        prop_assert_eq!(accepted, expected);
    }
}

#[tokio::test]
async fn test_full_lifecycle_on_chain_audit() {
    let net = SimulatedNetwork::builder()
        .explorer_url("https://amoy.polygonscan.com")
        .build()
        .unwrap();
    let ledgers = Ledgers::new(Some(net.context.clone()));
    let mut snapshot = LocalSnapshot::new();
    let now = chrono::Utc::now();

    let app = common::loan_application(SUBJECT);
    let receipt = ledgers.loans.submit_loan_application(&app).await;
    snapshot.capture(LedgerRecord::Loan(app.to_record(now)), &receipt);

    for turn in 0..2 {
        let chat = common::chat_turn(SUBJECT, turn);
        let receipt = ledgers.loans.submit_chat_turn(&chat).await;
        snapshot.capture(LedgerRecord::ChatLog(chat.to_record(now)), &receipt);
    }

    let doc = common::document(SUBJECT);
    let receipt = ledgers.loans.submit_document_verification(&doc).await;
    snapshot.capture(LedgerRecord::Document(doc.to_record(now)), &receipt);

    let score = common::credit_score(SUBJECT);
    let receipt = ledgers.credit.submit_credit_score(&score).await;
    snapshot.capture(LedgerRecord::Credit(score.to_record(now)), &receipt);

    let payout = common::disbursement(SUBJECT);
    let receipt = ledgers.payments.submit_disbursement(&payout).await;
    snapshot.capture(LedgerRecord::Disbursement(payout.to_record(now)), &receipt);

    for installment in 1..=2 {
        let payment = common::emi(SUBJECT, installment);
        let receipt = ledgers.payments.submit_emi_payment(&payment).await;
        snapshot.capture(LedgerRecord::Payment(payment.to_record(now)), &receipt);
    }

    // Another borrower's activity must not leak into the document.
    ledgers
        .loans
        .submit_loan_application(&common::loan_application(common::OTHER_SUBJECT))
        .await;

    assert_eq!(net.ledger.entry_count(), 9);
    assert!(snapshot.records.iter().all(|r| r.transaction_hash.is_some()));

    let dir = tempfile::tempdir().unwrap();
    let publication = common::aggregator(&net, dir.path())
        .build_audit_document(SUBJECT, GenerationMode::OnChain, Some(&snapshot))
        .await
        .unwrap();

    let document = &publication.document;
    assert_eq!(document.summary.loans, 1);
    assert_eq!(document.summary.chat_logs, 2);
    assert_eq!(document.summary.documents, 1);
    assert_eq!(document.summary.credit_history, 1);
    assert_eq!(document.summary.disbursements, 1);
    assert_eq!(document.summary.emis, 2);
    assert_eq!(document.summary.total, 8);
    assert!(!document.provenance.possibly_incomplete);
    assert_eq!(document.provenance.chain_id, net.context.network().chain_id);

    let emi = &document.records.emis[1];
    assert_eq!(emi.record.installment, 2);
    assert!(emi
        .verify_url
        .as_deref()
        .unwrap()
        .starts_with("https://amoy.polygonscan.com/tx/0x"));

    assert_eq!(publication.published_hash, None);
    let backup = publication.backup_path.unwrap();
    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&backup).unwrap()).unwrap();
    assert_eq!(written["mode"], "on-chain");
    assert_eq!(written["summary"]["total"], 8);
    assert_eq!(
        written["subject_hash"],
        serde_json::to_value(HashedIdentifier::of(SUBJECT)).unwrap()
    );
}
