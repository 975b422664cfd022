//! Writer allow-list shared by the ledger contracts.
//!
//! The loan contracts revert for signers that are not writers, so the client
//! checks its own authorization at startup.

use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::blockchain::context::LedgerContext;
use crate::blockchain::types::{LedgerResult, ReadOutcome, WriteReceipt};
use crate::contracts::abi::IAccessControl;
use crate::contracts::binding::{decode_error, Binding};

#[derive(Debug, Clone)]
pub struct AccessControl {
    binding: Binding,
}

impl AccessControl {
    pub fn new(ctx: Option<Arc<LedgerContext>>) -> Self {
        Self {
            binding: Binding::new("access control", ctx, |c| c.access_control),
        }
    }

    pub fn is_available(&self) -> bool {
        self.binding.is_available()
    }

    /// `Some(authorized)` when the contract answered, `None` otherwise.
    pub async fn is_authorized(&self, account: Address) -> Option<bool> {
        let data = IAccessControl::isAuthorizedCall { account }.abi_encode();
        let outcome: ReadOutcome<bool> = self
            .binding
            .read("is_authorized", data, |bytes| -> LedgerResult<Vec<bool>> {
                let authorized = IAccessControl::isAuthorizedCall::abi_decode_returns(bytes)
                    .map_err(|e| decode_error("is_authorized", e))?;
                Ok(vec![authorized])
            })
            .await;
        outcome.records.first().copied()
    }

    /// Check the context's own signer, warning when it cannot write.
    pub async fn check_signer(&self) -> Option<bool> {
        let signer = self.binding.context()?.signer().address();
        let authorized = self.is_authorized(signer).await;
        match authorized {
            Some(true) => tracing::info!(signer = %signer, "Signer is an authorized writer"),
            Some(false) => tracing::warn!(
                signer = %signer,
                "Signer is not an authorized writer; ledger writes will revert"
            ),
            None => tracing::warn!(signer = %signer, "Could not verify signer authorization"),
        }
        authorized
    }

    pub async fn grant_writer(&self, account: Address) -> WriteReceipt {
        tracing::info!(account = %account, "Granting writer role");
        self.binding
            .write("grant_writer", |g| g.access, || {
                Ok(IAccessControl::grantWriterCall { account }.abi_encode())
            })
            .await
    }

    pub async fn revoke_writer(&self, account: Address) -> WriteReceipt {
        tracing::info!(account = %account, "Revoking writer role");
        self.binding
            .write("revoke_writer", |g| g.access, || {
                Ok(IAccessControl::revokeWriterCall { account }.abi_encode())
            })
            .await
    }
}
