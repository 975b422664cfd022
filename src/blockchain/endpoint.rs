//! Circular pool of RPC endpoints.
//!
//! # Responsibilities
//! - Hold the ordered endpoint list for the active network profile
//! - Hand out the active transport to new calls
//! - Rotate to the next endpoint on rate limiting, invalidating the nonce cache
//!
//! In-flight calls keep the transport they were handed; rotation only affects
//! calls issued afterwards.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::nonce::NonceAllocator;
use crate::blockchain::transport::{LedgerTransport, RpcTransport};
use crate::blockchain::types::{LedgerError, LedgerResult};
use crate::blockchain::wallet::Signer;
use crate::config::validation::usable_endpoints;
use crate::observability::metrics;

/// One pool member.
#[derive(Clone)]
pub struct Endpoint {
    pub ordinal: usize,
    pub url: String,
    transport: Arc<dyn LedgerTransport>,
}

impl Endpoint {
    pub fn transport(&self) -> Arc<dyn LedgerTransport> {
        self.transport.clone()
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("ordinal", &self.ordinal)
            .field("url", &self.url)
            .finish()
    }
}

/// Ordered endpoints with a shared active pointer.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    active: AtomicUsize,
    rotations: AtomicU64,
    nonces: Arc<NonceAllocator>,
}

impl EndpointPool {
    /// Build a pool over already-constructed transports, in order.
    pub fn new(
        transports: Vec<Arc<dyn LedgerTransport>>,
        nonces: Arc<NonceAllocator>,
    ) -> LedgerResult<Self> {
        if transports.is_empty() {
            return Err(LedgerError::Configuration(
                "no usable RPC endpoints configured".to_string(),
            ));
        }

        let endpoints = transports
            .into_iter()
            .enumerate()
            .map(|(ordinal, transport)| Endpoint {
                ordinal,
                url: transport.endpoint().to_string(),
                transport,
            })
            .collect();

        Ok(Self {
            endpoints,
            active: AtomicUsize::new(0),
            rotations: AtomicU64::new(0),
            nonces,
        })
    }

    /// Connect to every configured URL that is not a placeholder.
    pub fn connect(
        urls: &[String],
        signer: &Signer,
        timeout: Duration,
        nonces: Arc<NonceAllocator>,
    ) -> LedgerResult<Self> {
        let transports = usable_endpoints(urls)
            .into_iter()
            .map(|url| {
                Arc::new(RpcTransport::connect(url, signer, timeout)) as Arc<dyn LedgerTransport>
            })
            .collect();

        let pool = Self::new(transports, nonces)?;
        tracing::info!(
            endpoints = pool.len(),
            active = %pool.active().url,
            "RPC endpoint pool ready"
        );
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// The endpoint new calls should use.
    pub fn active(&self) -> &Endpoint {
        &self.endpoints[self.active.load(Ordering::SeqCst) % self.endpoints.len()]
    }

    pub fn active_transport(&self) -> Arc<dyn LedgerTransport> {
        self.active().transport()
    }

    /// Advance to the next endpoint. No-op for a single-entry pool.
    ///
    /// Returns true if the active endpoint changed.
    pub fn rotate(&self) -> bool {
        let len = self.endpoints.len();
        if len <= 1 {
            return false;
        }

        let previous = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or_default();
        let next = (previous + 1) % len;

        self.rotations.fetch_add(1, Ordering::Relaxed);
        self.nonces.invalidate();
        metrics::record_rotation();

        tracing::warn!(
            from = %self.endpoints[previous].url,
            to = %self.endpoints[next].url,
            "Rotated RPC endpoint"
        );
        true
    }

    /// Total rotations since startup.
    pub fn rotation_count(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}
