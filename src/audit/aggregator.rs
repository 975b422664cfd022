//! Per-subject audit aggregation.
//!
//! # Responsibilities
//! - Gather a subject's records from the ledgers (on-chain) or a snapshot (hybrid-local)
//! - Attach write-path transaction hashes and explorer links where known
//! - Publish to the content store and a local backup, never failing the caller for it
//!
//! The aggregator only reads. One unavailable category marks the document
//! possibly incomplete; it never aborts the whole aggregation.

use alloy::primitives::{hex, keccak256};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::audit::document::{
    AuditDocument, AuditEntry, AuditRecords, CapturedRecord, Category, GenerationMode,
    LocalSnapshot, Provenance, Summary,
};
use crate::audit::storage::{BackupWriter, ContentStore, PinataStore};
use crate::blockchain::context::LedgerContext;
use crate::blockchain::types::{
    ContractAddresses, LedgerError, LedgerResult, NetworkIdentity, ReadOutcome,
};
use crate::config::{AuditConfig, LedgerConfig};
use crate::contracts::records::{LedgerRecord, SameEvent};
use crate::contracts::Ledgers;
use crate::hashing::HashedIdentifier;
use crate::observability::metrics;

/// A built document and where it ended up.
#[derive(Debug, Clone)]
pub struct AuditPublication {
    /// Content hash from the store; `None` when the upload did not happen.
    pub published_hash: Option<String>,
    pub url: Option<String>,
    pub document: AuditDocument,
    pub backup_path: Option<PathBuf>,
}

pub struct AuditAggregator {
    ledgers: Ledgers,
    network: NetworkIdentity,
    contracts: ContractAddresses,
    version: String,
    inter_call_delay: Duration,
    store: Option<Arc<dyn ContentStore>>,
    backups: BackupWriter,
}

impl AuditAggregator {
    pub fn new(
        ledgers: Ledgers,
        network: NetworkIdentity,
        contracts: ContractAddresses,
        config: &AuditConfig,
    ) -> Self {
        Self {
            ledgers,
            network,
            contracts,
            version: config.version.clone(),
            inter_call_delay: Duration::from_millis(config.inter_call_delay_ms),
            store: None,
            backups: BackupWriter::new(&config.backup_dir),
        }
    }

    /// Aggregator over `ctx` (or over nothing), with the store taken from the environment.
    pub fn from_config(ctx: Option<Arc<LedgerContext>>, config: &LedgerConfig) -> LedgerResult<Self> {
        let (network, contracts) = match &ctx {
            Some(ctx) => (ctx.network().clone(), *ctx.contracts()),
            None => (
                NetworkIdentity::from_config(&config.network),
                ContractAddresses::from_config(&config.contracts)?,
            ),
        };

        let mut aggregator = Self::new(Ledgers::new(ctx), network, contracts, &config.audit);
        if let Some(store) = PinataStore::from_env(&config.audit) {
            aggregator = aggregator.with_store(Arc::new(store));
        }
        Ok(aggregator)
    }

    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build, publish and back up the audit document for `subject_id` (a phone number).
    ///
    /// In on-chain mode a snapshot, if given, only contributes transaction
    /// hashes. Hybrid-local mode requires one.
    pub async fn build_audit_document(
        &self,
        subject_id: &str,
        mode: GenerationMode,
        snapshot: Option<&LocalSnapshot>,
    ) -> LedgerResult<AuditPublication> {
        let subject_hash = HashedIdentifier::of(subject_id);
        tracing::info!(subject_hash = %subject_hash, mode = %mode, "Building audit document");

        let (records, unavailable) = match mode {
            GenerationMode::OnChain => self.collect_on_chain(subject_hash, snapshot).await,
            GenerationMode::HybridLocal => {
                let snapshot = snapshot.ok_or_else(|| {
                    LedgerError::NotAvailable("hybrid-local mode requires a local snapshot".into())
                })?;
                (self.collect_hybrid(subject_hash, snapshot), Vec::new())
            }
        };

        let document = AuditDocument {
            document_id: Uuid::new_v4(),
            version: self.version.clone(),
            subject_id: subject_id.to_string(),
            subject_hash,
            mode,
            generated_at: Utc::now(),
            provenance: Provenance {
                network: self.network.name.clone(),
                chain_id: self.network.chain_id,
                contracts: self.contracts,
                possibly_incomplete: !unavailable.is_empty(),
                unavailable_categories: unavailable,
            },
            summary: Summary::of(&records),
            records,
            application: snapshot.and_then(|s| s.application.clone()),
            customer_profile: snapshot.and_then(|s| s.customer_profile.clone()),
        };

        metrics::record_audit_document(mode.as_str());
        if document.provenance.possibly_incomplete {
            tracing::warn!(
                subject_hash = %subject_hash,
                unavailable = ?document.provenance.unavailable_categories,
                "Audit document is possibly incomplete"
            );
        }

        Ok(self.publish(document).await)
    }

    async fn collect_on_chain(
        &self,
        subject: HashedIdentifier,
        snapshot: Option<&LocalSnapshot>,
    ) -> (AuditRecords, Vec<Category>) {
        let mut records = AuditRecords::default();
        let mut unavailable = Vec::new();
        let captured = snapshot.map(|s| s.records.as_slice()).unwrap_or_default();

        for (i, category) in Category::ALL.into_iter().enumerate() {
            if i > 0 && !self.inter_call_delay.is_zero() {
                tokio::time::sleep(self.inter_call_delay).await;
            }

            let available = match category {
                Category::Loans => {
                    let outcome = self.ledgers.loans.query_loans_by_hash(subject).await;
                    self.fill(outcome, &mut records.loans, captured, |r| match r {
                        LedgerRecord::Loan(r) => Some(r),
                        _ => None,
                    })
                }
                Category::ChatLogs => {
                    let outcome = self.ledgers.loans.query_chat_logs_by_hash(subject).await;
                    self.fill(outcome, &mut records.chat_logs, captured, |r| match r {
                        LedgerRecord::ChatLog(r) => Some(r),
                        _ => None,
                    })
                }
                Category::Documents => {
                    let outcome = self.ledgers.loans.query_documents_by_hash(subject).await;
                    self.fill(outcome, &mut records.documents, captured, |r| match r {
                        LedgerRecord::Document(r) => Some(r),
                        _ => None,
                    })
                }
                Category::CreditHistory => {
                    let outcome = self.ledgers.credit.query_credit_history_by_hash(subject).await;
                    self.fill(outcome, &mut records.credit_history, captured, |r| match r {
                        LedgerRecord::Credit(r) => Some(r),
                        _ => None,
                    })
                }
                Category::Disbursements => {
                    let outcome = self.ledgers.payments.query_disbursements_by_hash(subject).await;
                    self.fill(outcome, &mut records.disbursements, captured, |r| match r {
                        LedgerRecord::Disbursement(r) => Some(r),
                        _ => None,
                    })
                }
                Category::Emis => {
                    let outcome = self.ledgers.payments.query_emis_by_hash(subject).await;
                    self.fill(outcome, &mut records.emis, captured, |r| match r {
                        LedgerRecord::Payment(r) => Some(r),
                        _ => None,
                    })
                }
            };

            if !available {
                unavailable.push(category);
            }
        }

        (records, unavailable)
    }

    /// Move an outcome's records into `into`, matching captured writes for their hashes.
    fn fill<T, P>(
        &self,
        outcome: ReadOutcome<T>,
        into: &mut Vec<AuditEntry<T>>,
        captured: &[CapturedRecord],
        project: P,
    ) -> bool
    where
        T: SameEvent,
        P: Fn(&LedgerRecord) -> Option<&T>,
    {
        if let Some(error) = &outcome.error {
            tracing::warn!(error = %error, "Audit category read failed");
        }

        let mut used = vec![false; captured.len()];
        for record in outcome.records {
            let hash = captured.iter().enumerate().find_map(|(i, c)| {
                let local = project(&c.record)?;
                if used[i] || !local.same_event(&record) {
                    return None;
                }
                used[i] = true;
                Some(c.transaction_hash.clone())
            });
            into.push(AuditEntry::new(record, hash.flatten(), &self.network));
        }

        outcome.available
    }

    fn collect_hybrid(&self, subject: HashedIdentifier, snapshot: &LocalSnapshot) -> AuditRecords {
        let mut records = AuditRecords::default();

        for captured in &snapshot.records {
            let hash = captured.transaction_hash.clone();
            let network = &self.network;
            match &captured.record {
                LedgerRecord::Loan(r) if r.phone_hash == subject => {
                    records.loans.push(AuditEntry::new(r.clone(), hash, network))
                }
                LedgerRecord::ChatLog(r) if r.phone_hash == subject => {
                    records.chat_logs.push(AuditEntry::new(r.clone(), hash, network))
                }
                LedgerRecord::Document(r) if r.phone_hash == subject => {
                    records.documents.push(AuditEntry::new(r.clone(), hash, network))
                }
                LedgerRecord::Credit(r) if r.phone_hash == subject => {
                    records.credit_history.push(AuditEntry::new(r.clone(), hash, network))
                }
                LedgerRecord::Disbursement(r) if r.phone_hash == subject => {
                    records.disbursements.push(AuditEntry::new(r.clone(), hash, network))
                }
                LedgerRecord::Payment(r) if r.phone_hash == subject => {
                    records.emis.push(AuditEntry::new(r.clone(), hash, network))
                }
                _ => tracing::debug!("Skipping snapshot record for another subject"),
            }
        }

        records
    }

    async fn publish(&self, document: AuditDocument) -> AuditPublication {
        let mut publication = AuditPublication {
            published_hash: None,
            url: None,
            document,
            backup_path: None,
        };

        let value = match serde_json::to_value(&publication.document) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Audit document could not be serialized");
                return publication;
            }
        };
        let bytes = match serde_json::to_vec_pretty(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Audit document could not be serialized");
                return publication;
            }
        };

        let generated = publication.document.generated_at;
        let subject = publication.document.subject_id.clone();
        let subject_hash = publication.document.subject_hash;

        if let Some(store) = &self.store {
            let name = format!("audit-{}-{}", subject_hash, generated.timestamp_millis());
            match store.put_json(&name, &value).await {
                Ok(stored) => {
                    tracing::info!(
                        subject_hash = %subject_hash,
                        content_hash = %stored.content_hash,
                        "Audit document published"
                    );
                    publication.published_hash = Some(stored.content_hash);
                    publication.url = Some(stored.url);
                }
                Err(e) => {
                    tracing::warn!(subject_hash = %subject_hash, error = %e, "Audit upload failed")
                }
            }
        }

        let digest = keccak256(&bytes);
        let short_hash = hex::encode(&digest[..4]);
        match self
            .backups
            .write(&subject, generated.timestamp_millis(), &short_hash, &bytes)
            .await
        {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Audit backup written");
                publication.backup_path = Some(path);
            }
            Err(e) => tracing::warn!(subject_hash = %subject_hash, error = %e, "Audit backup failed"),
        }

        publication
    }
}
