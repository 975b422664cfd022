//! Transaction submission.
//!
//! # Responsibilities
//! - Price each attempt with a fresh gas price (capped, multiplied)
//! - Reserve a nonce and broadcast the prepared call
//! - Return on pending-pool acceptance, never waiting for confirmation
//! - Retry rate limits (rotate + backoff) and one nonce conflict (resync)
//!
//! # Failure handling
//! ```text
//! rate limited        → rotate endpoint, exponential backoff, retry
//! nonce conflict      → drop nonce cache, jittered delay, retry once
//! attempt timeout     → drop nonce cache, fail (caller re-submits via fresh reserve)
//! anything else       → fail unchanged
//! ```

use alloy::primitives::TxHash;
use tokio::time::timeout;

use crate::blockchain::context::LedgerContext;
use crate::blockchain::transport::LedgerTransport;
use crate::blockchain::types::{ErrorClass, LedgerError, LedgerResult, PreparedCall, TxOptions};
use crate::observability::metrics;
use crate::resilience::{RetryAction, RetryError};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Write path over a shared context.
pub struct TxSubmitter<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> TxSubmitter<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Submit `call` and return its hash once the network accepts it into the pending pool.
    pub async fn submit(&self, call: &PreparedCall) -> LedgerResult<TxHash> {
        let pool = self.ctx.pool();
        let mut conflicts = 0u32;

        let result = self
            .ctx
            .retry_policy()
            .run(
                move |attempt| self.attempt(call, attempt),
                |err: &LedgerError| match err.class() {
                    ErrorClass::RateLimited => RetryAction::Backoff,
                    ErrorClass::OrderingConflict if conflicts == 0 => {
                        conflicts += 1;
                        RetryAction::Resync
                    }
                    _ => RetryAction::Fail,
                },
                |action, attempt| {
                    if action == RetryAction::Backoff {
                        pool.rotate();
                    }
                    tracing::warn!(
                        operation = call.operation,
                        attempt = attempt,
                        action = ?action,
                        "Submission attempt failed, retrying"
                    );
                },
            )
            .await;

        match result {
            Ok(hash) => {
                metrics::record_submission(call.operation, "accepted");
                tracing::info!(operation = call.operation, tx_hash = %hash, "Transaction accepted");
                Ok(hash)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                metrics::record_submission(call.operation, "exhausted");
                tracing::warn!(
                    operation = call.operation,
                    attempts = attempts,
                    error = %last,
                    "Submission retries exhausted"
                );
                Err(last)
            }
            Err(RetryError::Failed(err)) => {
                metrics::record_submission(call.operation, "failed");
                tracing::warn!(operation = call.operation, error = %err, "Submission failed");
                Err(err)
            }
        }
    }

    async fn attempt(&self, call: &PreparedCall, attempt: u32) -> LedgerResult<TxHash> {
        let transport = self.ctx.pool().active_transport();
        let deadline = self.ctx.tx_settings().attempt_timeout;

        tracing::debug!(
            operation = call.operation,
            attempt = attempt,
            endpoint = transport.endpoint(),
            "Submitting transaction"
        );

        match timeout(deadline, self.send_once(transport.as_ref(), call)).await {
            Ok(result) => result,
            Err(_) => {
                // The reserved nonce may or may not have reached the pool.
                self.ctx.nonces().invalidate();
                Err(LedgerError::Timeout(deadline.as_millis() as u64))
            }
        }
    }

    async fn send_once(
        &self,
        transport: &dyn LedgerTransport,
        call: &PreparedCall,
    ) -> LedgerResult<TxHash> {
        let settings = self.ctx.tx_settings();

        let gas_price = transport.gas_price().await?;
        if gas_price > settings.max_gas_price_wei {
            return Err(LedgerError::GasPriceTooHigh {
                current_gwei: (gas_price / WEI_PER_GWEI) as u64,
                max_gwei: (settings.max_gas_price_wei / WEI_PER_GWEI) as u64,
            });
        }
        let adjusted_gas_price = gas_price.saturating_mul(settings.gas_price_permille) / 1000;

        let from = self.ctx.signer().address();
        let nonce = self
            .ctx
            .nonces()
            .reserve(|| transport.pending_nonce(from))
            .await?;

        let options = TxOptions {
            from,
            gas_limit: call.gas_limit,
            gas_price: adjusted_gas_price,
            nonce,
            chain_id: self.ctx.signer().chain_id(),
        };

        match transport.send_transaction(call, &options).await {
            Ok(hash) => Ok(hash),
            Err(err) => {
                self.ctx.nonces().invalidate();
                Err(err)
            }
        }
    }
}
