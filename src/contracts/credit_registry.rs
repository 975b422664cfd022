//! Credit registry facade.

use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::blockchain::context::LedgerContext;
use crate::blockchain::types::{LedgerResult, ReadOutcome, WriteReceipt};
use crate::contracts::abi::ICreditRegistry;
use crate::contracts::binding::{convert_all, decode_error, Binding};
use crate::contracts::records::{CreditRecord, CreditScore};
use crate::hashing::HashedIdentifier;

#[derive(Debug, Clone)]
pub struct CreditRegistry {
    binding: Binding,
}

impl CreditRegistry {
    pub fn new(ctx: Option<Arc<LedgerContext>>) -> Self {
        Self {
            binding: Binding::new("credit registry", ctx, |c| c.credit_registry),
        }
    }

    pub fn is_available(&self) -> bool {
        self.binding.is_available()
    }

    pub async fn submit_credit_score(&self, score: &CreditScore) -> WriteReceipt {
        self.binding
            .write("record_credit_score", |g| g.credit_score, || {
                Ok(ICreditRegistry::recordCreditScoreCall {
                    phoneHash: HashedIdentifier::of(&score.phone).as_b256(),
                    applicationHash: HashedIdentifier::of(&score.application_id).as_b256(),
                    score: score.score,
                    grade: score.grade.code()?,
                }
                .abi_encode())
            })
            .await
    }

    pub async fn query_credit_history(&self, phone: &str) -> ReadOutcome<CreditRecord> {
        self.query_credit_history_by_hash(HashedIdentifier::of(phone)).await
    }

    pub async fn query_credit_history_by_hash(
        &self,
        phone_hash: HashedIdentifier,
    ) -> ReadOutcome<CreditRecord> {
        let data = ICreditRegistry::getCreditHistoryCall {
            phoneHash: phone_hash.as_b256(),
        }
        .abi_encode();

        self.binding
            .read("get_credit_history", data, |bytes| -> LedgerResult<Vec<CreditRecord>> {
                let entries = ICreditRegistry::getCreditHistoryCall::abi_decode_returns(bytes)
                    .map_err(|e| decode_error("get_credit_history", e))?;
                convert_all(entries)
            })
            .await
    }
}
