use async_trait::async_trait;
use std::time::Duration;

use crate::seat::SeatState;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection failure: {0}")]
    Connection(String),
    #[error("Store script execution failed: {0}")]
    Script(String),
    #[error("Store returned malformed seat state: {0}")]
    Data(String),
}

/// Result of an atomic hold attempt.
///
/// `Conflict` is the expected outcome under contention, not a fault;
/// infrastructure failures travel separately as `StoreError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    /// The caller won the seat.
    Held,
    /// The seat was not available at evaluation time.
    Conflict,
    /// The seat was never initialized.
    UnknownSeat,
}

/// Narrow interface over the shared key-value store holding seat state.
///
/// Implementations must make `hold_if_available`, `confirm_if_held` and
/// `release_if_held` single indivisible steps with no intermediate state
/// observable by other callers; `state` and `put` are the raw primitives
/// the pessimistic protocol sequences under its own lock.
///
/// A seat key that is absent but registered is an expired hold and counts
/// as available; absent and unregistered means the seat was never
/// initialized.
#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Register seats and mark every one of them AVAILABLE.
    async fn register(&self, seats: &[String]) -> Result<(), StoreError>;

    async fn is_registered(&self, seat_id: &str) -> Result<bool, StoreError>;

    /// Raw read; `Ok(None)` when the key is absent (expired or never set).
    async fn state(&self, seat_id: &str) -> Result<Option<SeatState>, StoreError>;

    /// Unconditional write with expiry. Only safe under external mutual
    /// exclusion; the protocols never call this outside a lock.
    async fn put(
        &self,
        seat_id: &str,
        state: &SeatState,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Atomically move AVAILABLE → HELD:<claimant> and arm the hold TTL.
    async fn hold_if_available(
        &self,
        seat_id: &str,
        claimant_id: &str,
        ttl: Duration,
    ) -> Result<HoldOutcome, StoreError>;

    /// Atomically move HELD:<claimant> → SOLD with durable retention.
    /// False covers both "not held" and "held by someone else".
    async fn confirm_if_held(
        &self,
        seat_id: &str,
        claimant_id: &str,
        retention: Duration,
    ) -> Result<bool, StoreError>;

    /// Atomically revert HELD:<claimant> → AVAILABLE; no-op otherwise.
    async fn release_if_held(
        &self,
        seat_id: &str,
        claimant_id: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;
}
