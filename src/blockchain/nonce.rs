//! Per-account nonce reservation.
//!
//! # Responsibilities
//! - Hand out strictly increasing nonces for the process's signer
//! - Lazily sync from the network's pending transaction count
//! - Drop the cached value on endpoint rotation or submission errors
//!
//! Reservations are serialized by an async mutex, so two tasks in one process
//! never receive the same value. Nothing here coordinates across processes.
//!
//! Invalidation only bumps an epoch counter and never waits on the mutex, so
//! the endpoint pool can call it from synchronous code. `reserve()` notices
//! the epoch change and re-syncs.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use crate::blockchain::types::LedgerResult;

#[derive(Debug, Default)]
struct NonceState {
    next: Option<u64>,
    epoch: u64,
}

/// Cached "next nonce" for the active signer.
#[derive(Debug, Default)]
pub struct NonceAllocator {
    state: Mutex<NonceState>,
    epoch: AtomicU64,
    syncs: AtomicU64,
}

impl NonceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next nonce, syncing from `fetch_pending` when nothing is cached.
    pub async fn reserve<F, Fut>(&self, fetch_pending: F) -> LedgerResult<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LedgerResult<u64>>,
    {
        let mut state = self.state.lock().await;

        let epoch = self.epoch.load(Ordering::SeqCst);
        if state.epoch != epoch {
            state.next = None;
            state.epoch = epoch;
        }

        let nonce = match state.next {
            Some(next) => next,
            None => {
                let pending = fetch_pending().await?;
                self.syncs.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(pending_nonce = pending, "Nonce cache synced from network");
                pending
            }
        };

        state.next = Some(nonce + 1);
        Ok(nonce)
    }

    /// Forget the cached value; the next `reserve()` re-syncs.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Nonce cache invalidated");
    }

    /// Peek at the cached next value, if still valid.
    pub async fn cached(&self) -> Option<u64> {
        let state = self.state.lock().await;
        if state.epoch == self.epoch.load(Ordering::SeqCst) {
            state.next
        } else {
            None
        }
    }

    /// Number of times the cache was filled from the network.
    pub fn sync_count(&self) -> u64 {
        self.syncs.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::LedgerError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sequential_reservations() {
        let nonces = NonceAllocator::new();
        let mut issued = Vec::new();
        for _ in 0..5 {
            issued.push(nonces.reserve(|| async { Ok(7) }).await.unwrap());
        }
        assert_eq!(issued, vec![7, 8, 9, 10, 11]);
        assert_eq!(nonces.sync_count(), 1);
        assert_eq!(nonces.cached().await, Some(12));
    }

    #[tokio::test]
    async fn test_invalidate_forces_resync() {
        let nonces = NonceAllocator::new();
        assert_eq!(nonces.reserve(|| async { Ok(3) }).await.unwrap(), 3);
        assert_eq!(nonces.reserve(|| async { Ok(99) }).await.unwrap(), 4);

        nonces.invalidate();
        assert_eq!(nonces.cached().await, None);
        assert_eq!(nonces.reserve(|| async { Ok(20) }).await.unwrap(), 20);
        assert_eq!(nonces.sync_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_sync_leaves_cache_empty() {
        let nonces = NonceAllocator::new();
        let err = nonces
            .reserve(|| async { Err(LedgerError::RateLimited("429".into())) })
            .await;
        assert!(err.is_err());
        assert_eq!(nonces.reserve(|| async { Ok(1) }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_collide() {
        let nonces = Arc::new(NonceAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let nonces = nonces.clone();
            handles.push(tokio::spawn(async move {
                nonces.reserve(|| async { Ok(100) }).await.unwrap()
            }));
        }

        let mut issued = Vec::new();
        for handle in handles {
            issued.push(handle.await.unwrap());
        }
        issued.sort_unstable();
        assert_eq!(issued, (100..132).collect::<Vec<_>>());
    }
}
