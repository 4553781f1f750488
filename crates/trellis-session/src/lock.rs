//! Time-bounded, key-scoped mutual exclusion.
//!
//! Every mutating session operation runs under a lease on the session id,
//! so concurrent submissions serialize instead of trampling each other's
//! context document. Leases expire on their own, which keeps a crashed
//! holder from wedging the key forever.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::warn;

use crate::error::LockError;

/// Proof of holding a key.
///
/// Release demands the token the acquire handed out, so a holder that
/// outlived its lease cannot free a successor's grip on the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    key: String,
    token: u64,
}

impl Lease {
    pub fn new(key: impl Into<String>, token: u64) -> Self {
        Self {
            key: key.into(),
            token,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Lease timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockConfig {
    /// How long a lease holds before anyone may steal the key.
    pub lease_ttl: Duration,
    /// How long `acquire` keeps retrying a contended key.
    pub acquire_wait: Duration,
    /// Pause between retries.
    pub poll_interval: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::from_secs(120),
            acquire_wait: Duration::from_secs(30),
            poll_interval: Duration::from_millis(25),
        }
    }
}

/// Key-scoped leases shared by every dispatcher in a deployment.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Take the key now if it is free or its current lease has expired.
    async fn try_acquire(&self, key: &str) -> Option<Lease>;

    /// Take the key, waiting out the current holder up to the configured
    /// acquire window.
    async fn acquire(&self, key: &str) -> Result<Lease, LockError>;

    /// Give the key back. Fails with [`LockError::StaleLease`] when the
    /// lease no longer holds it.
    async fn release(&self, lease: Lease) -> Result<(), LockError>;
}

struct HeldLease {
    token: u64,
    expires_at: Instant,
}

/// Single-process lock service for tests and embedding.
pub struct InMemoryLockService {
    config: LockConfig,
    held: Mutex<HashMap<String, HeldLease>>,
    next_token: AtomicU64,
}

impl InMemoryLockService {
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    pub fn with_config(config: LockConfig) -> Self {
        Self {
            config,
            held: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    fn grab(&self, key: &str) -> Option<Lease> {
        let mut held = self.held.lock().expect("lock poisoned");
        let now = Instant::now();
        match held.get(key) {
            Some(current) if current.expires_at > now => None,
            _ => {
                let token = self.next_token.fetch_add(1, Ordering::Relaxed);
                held.insert(
                    key.to_string(),
                    HeldLease {
                        token,
                        expires_at: now + self.config.lease_ttl,
                    },
                );
                Some(Lease::new(key, token))
            }
        }
    }
}

impl Default for InMemoryLockService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn try_acquire(&self, key: &str) -> Option<Lease> {
        self.grab(key)
    }

    async fn acquire(&self, key: &str) -> Result<Lease, LockError> {
        let deadline = Instant::now() + self.config.acquire_wait;
        loop {
            if let Some(lease) = self.grab(key) {
                return Ok(lease);
            }
            if Instant::now() >= deadline {
                warn!(key, "gave up waiting for lock");
                return Err(LockError::AcquireTimeout {
                    key: key.to_string(),
                    waited_ms: self.config.acquire_wait.as_millis() as u64,
                });
            }
            sleep(self.config.poll_interval).await;
        }
    }

    async fn release(&self, lease: Lease) -> Result<(), LockError> {
        let mut held = self.held.lock().expect("lock poisoned");
        match held.get(lease.key()) {
            // an expired but unsuperseded lease may still release cleanly
            Some(current) if current.token == lease.token() => {
                held.remove(lease.key());
                Ok(())
            }
            _ => Err(LockError::StaleLease {
                key: lease.key().to_string(),
            }),
        }
    }
}
