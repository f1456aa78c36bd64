use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Lock provider unavailable: {0}")]
    Provider(String),
}

/// Proof of lock ownership, surrendered back to the provider on release.
///
/// The token is generated per acquisition so a release can never tear down
/// a lock that has since expired and been granted to someone else.
#[derive(Debug)]
pub struct LockHandle {
    pub name: String,
    pub token: String,
}

/// Named mutual-exclusion provider with bounded wait and a lease that
/// auto-expires the lock independently of holder liveness.
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Try to acquire `name` for up to `wait`. `Ok(None)` means the wait
    /// elapsed without a grant (contention, not a fault); provider errors
    /// must never silently degrade to unguarded access.
    async fn acquire(
        &self,
        name: &str,
        wait: Duration,
        lease: Duration,
    ) -> Result<Option<LockHandle>, LockError>;

    /// Token-checked release. False means the lease had already expired
    /// and the lock is no longer (or no longer ours to) release.
    async fn release(&self, handle: LockHandle) -> Result<bool, LockError>;
}
