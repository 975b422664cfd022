//! Read path with the write path's rotation and backoff policy.
//!
//! Rate limits and timeouts are retried; when the budget runs out the caller
//! gets `ReadOutcome::unavailable()` instead of an error so aggregation can
//! continue with partial data. Any other error propagates. A single call
//! rotates through the pool at most once.

use alloy::primitives::{Address, Bytes};

use crate::blockchain::context::LedgerContext;
use crate::blockchain::types::{ErrorClass, LedgerError, LedgerResult, ReadOutcome};
use crate::observability::metrics;
use crate::resilience::{RetryAction, RetryError};

/// Read-only queries over a shared context.
pub struct ReadRetrier<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> ReadRetrier<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Execute `eth_call(to, data)` and decode the returned bytes.
    pub async fn read<T, D>(
        &self,
        label: &'static str,
        to: Address,
        data: Bytes,
        decode: D,
    ) -> LedgerResult<ReadOutcome<T>>
    where
        D: FnOnce(&[u8]) -> LedgerResult<Vec<T>>,
    {
        let pool = self.ctx.pool();
        let max_rotations = pool.len();
        let mut rotations = 0usize;

        let result = self
            .ctx
            .retry_policy()
            .run(
                |_attempt| {
                    let transport = pool.active_transport();
                    let data = data.clone();
                    async move { transport.call(to, data).await }
                },
                |err: &LedgerError| match err.class() {
                    ErrorClass::RateLimited | ErrorClass::Timeout => RetryAction::Backoff,
                    _ => RetryAction::Fail,
                },
                |_action, attempt| {
                    if rotations < max_rotations && pool.rotate() {
                        rotations += 1;
                    }
                    tracing::debug!(query = label, attempt = attempt, "Read throttled, retrying");
                },
            )
            .await;

        match result {
            Ok(bytes) => {
                metrics::record_read("available");
                Ok(ReadOutcome::available(decode(&bytes)?))
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                metrics::record_read("unavailable");
                tracing::warn!(
                    query = label,
                    attempts = attempts,
                    error = %last,
                    "Read retries exhausted, returning unavailable"
                );
                Ok(ReadOutcome::unavailable())
            }
            Err(RetryError::Failed(err)) => {
                metrics::record_read("failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Fault, SimulatedNetwork};

    fn echo(bytes: &[u8]) -> LedgerResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    #[tokio::test]
    async fn test_always_rate_limited_read_is_unavailable() {
        let net = SimulatedNetwork::builder().endpoints(2).build().unwrap();
        for endpoint in &net.endpoints {
            endpoint.rate_limit_always(true);
        }

        let outcome = net
            .context
            .reader()
            .read("probe", Address::ZERO, Bytes::new(), echo)
            .await
            .unwrap();

        assert!(!outcome.available);
        assert!(outcome.records.is_empty());
        assert!(net.context.pool().rotation_count() <= 2);
    }

    #[tokio::test]
    async fn test_rotations_capped_at_one_cycle() {
        let net = SimulatedNetwork::builder().endpoints(2).max_attempts(6).build().unwrap();
        for endpoint in &net.endpoints {
            endpoint.rate_limit_always(true);
        }

        let outcome = net
            .context
            .reader()
            .read("probe", Address::ZERO, Bytes::new(), echo)
            .await
            .unwrap();

        assert!(!outcome.available);
        assert_eq!(net.context.pool().rotation_count(), 2);
    }

    #[tokio::test]
    async fn test_non_throttle_errors_propagate() {
        let net = SimulatedNetwork::builder().endpoints(1).build().unwrap();
        net.endpoints[0].inject(Fault::Revert, 1);

        let result = net
            .context
            .reader()
            .read("probe", Address::ZERO, Bytes::new(), echo)
            .await;
        assert!(matches!(result, Err(LedgerError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_recovers_after_throttling() {
        let net = SimulatedNetwork::builder().endpoints(1).build().unwrap();
        net.endpoints[0].inject(Fault::RateLimit, 2);

        let outcome = net
            .context
            .reader()
            .read("probe", Address::ZERO, Bytes::new(), echo)
            .await
            .unwrap();
        assert!(outcome.available);
        assert_eq!(net.endpoints[0].call_count(), 3);
    }
}
