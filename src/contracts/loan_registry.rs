//! Loan registry facade: applications, chat turns and document verifications.

use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::blockchain::context::LedgerContext;
use crate::blockchain::types::{LedgerResult, ReadOutcome, WriteReceipt};
use crate::contracts::abi::ILoanRegistry;
use crate::contracts::binding::{convert_all, decode_error, Binding};
use crate::contracts::records::{
    ChatLogRecord, ChatTurn, DocumentRecord, DocumentVerification, LoanApplication, LoanRecord,
};
use crate::contracts::units::{rate_to_bps, to_base_units};
use crate::hashing::HashedIdentifier;

#[derive(Debug, Clone)]
pub struct LoanRegistry {
    binding: Binding,
}

impl LoanRegistry {
    pub fn new(ctx: Option<Arc<LedgerContext>>) -> Self {
        Self {
            binding: Binding::new("loan registry", ctx, |c| c.loan_registry),
        }
    }

    pub fn is_available(&self) -> bool {
        self.binding.is_available()
    }

    pub async fn submit_loan_application(&self, application: &LoanApplication) -> WriteReceipt {
        let phone_hash = HashedIdentifier::of(&application.phone);
        tracing::info!(
            phone_hash = %phone_hash,
            status = %application.status,
            "Logging loan application"
        );

        self.binding
            .write("log_application", |g| g.application, || {
                Ok(ILoanRegistry::logApplicationCall {
                    phoneHash: phone_hash.as_b256(),
                    applicationHash: HashedIdentifier::of(&application.application_id).as_b256(),
                    amount: to_base_units(application.amount)?,
                    interestBps: rate_to_bps(application.interest_rate)?,
                    tenureMonths: application.tenure_months,
                    status: application.status.code()?,
                }
                .abi_encode())
            })
            .await
    }

    pub async fn submit_chat_turn(&self, turn: &ChatTurn) -> WriteReceipt {
        self.binding
            .write("log_chat_turn", |g| g.chat_turn, || {
                Ok(ILoanRegistry::logChatTurnCall {
                    sessionHash: HashedIdentifier::of(&turn.session_id).as_b256(),
                    phoneHash: HashedIdentifier::of(&turn.phone).as_b256(),
                    messageHash: HashedIdentifier::of(&turn.user_message).as_b256(),
                    responseHash: HashedIdentifier::of(&turn.bot_response).as_b256(),
                    intent: turn.intent.clone(),
                }
                .abi_encode())
            })
            .await
    }

    pub async fn submit_document_verification(
        &self,
        document: &DocumentVerification,
    ) -> WriteReceipt {
        self.binding
            .write("log_document", |g| g.document, || {
                Ok(ILoanRegistry::logDocumentCall {
                    applicationHash: HashedIdentifier::of(&document.application_id).as_b256(),
                    phoneHash: HashedIdentifier::of(&document.phone).as_b256(),
                    documentHash: HashedIdentifier::of(&document.document_id).as_b256(),
                    docType: document.document_type.code()?,
                    verified: document.verified,
                }
                .abi_encode())
            })
            .await
    }

    /// Every loan logged for `phone`, oldest first.
    pub async fn query_loans(&self, phone: &str) -> ReadOutcome<LoanRecord> {
        self.query_loans_by_hash(HashedIdentifier::of(phone)).await
    }

    pub async fn query_loans_by_hash(&self, phone_hash: HashedIdentifier) -> ReadOutcome<LoanRecord> {
        let data = ILoanRegistry::getLoansByPhoneCall {
            phoneHash: phone_hash.as_b256(),
        }
        .abi_encode();

        self.binding
            .read("get_loans_by_phone", data, |bytes| -> LedgerResult<Vec<LoanRecord>> {
                let entries = ILoanRegistry::getLoansByPhoneCall::abi_decode_returns(bytes)
                    .map_err(|e| decode_error("get_loans_by_phone", e))?;
                convert_all(entries)
            })
            .await
    }

    pub async fn query_chat_logs(&self, phone: &str) -> ReadOutcome<ChatLogRecord> {
        self.query_chat_logs_by_hash(HashedIdentifier::of(phone)).await
    }

    pub async fn query_chat_logs_by_hash(
        &self,
        phone_hash: HashedIdentifier,
    ) -> ReadOutcome<ChatLogRecord> {
        let data = ILoanRegistry::getChatLogsCall {
            phoneHash: phone_hash.as_b256(),
        }
        .abi_encode();

        self.binding
            .read("get_chat_logs", data, |bytes| -> LedgerResult<Vec<ChatLogRecord>> {
                let entries = ILoanRegistry::getChatLogsCall::abi_decode_returns(bytes)
                    .map_err(|e| decode_error("get_chat_logs", e))?;
                convert_all(entries)
            })
            .await
    }

    pub async fn query_documents(&self, phone: &str) -> ReadOutcome<DocumentRecord> {
        self.query_documents_by_hash(HashedIdentifier::of(phone)).await
    }

    pub async fn query_documents_by_hash(
        &self,
        phone_hash: HashedIdentifier,
    ) -> ReadOutcome<DocumentRecord> {
        let data = ILoanRegistry::getDocumentsCall {
            phoneHash: phone_hash.as_b256(),
        }
        .abi_encode();

        self.binding
            .read("get_documents", data, |bytes| -> LedgerResult<Vec<DocumentRecord>> {
                let entries = ILoanRegistry::getDocumentsCall::abi_decode_returns(bytes)
                    .map_err(|e| decode_error("get_documents", e))?;
                convert_all(entries)
            })
            .await
    }
}
