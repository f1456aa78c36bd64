use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::lock::LockProvider;
use crate::seat::SeatState;
use crate::store::{HoldOutcome, SeatStore};
use crate::ReservationResult;

/// Lock key namespace on the pessimistic path.
pub const LOCK_PREFIX: &str = "LOCK:";

/// One of two interchangeable strategies for winning a seat.
///
/// Both guarantee that across any number of concurrent callers racing on
/// the same seat, at most one hold succeeds; they differ in where the
/// mutual exclusion comes from.
#[async_trait]
pub trait HoldProtocol: Send + Sync {
    async fn hold(&self, seat_id: &str, claimant_id: &str) -> ReservationResult<HoldOutcome>;
}

/// Optimistic protocol: one atomic conditional-set against the store.
///
/// Correctness follows from the atomicity of the store operation, not
/// from any locking above it.
pub struct OptimisticHold {
    store: Arc<dyn SeatStore>,
    hold_ttl: Duration,
}

impl OptimisticHold {
    pub fn new(store: Arc<dyn SeatStore>, hold_ttl: Duration) -> Self {
        Self { store, hold_ttl }
    }
}

#[async_trait]
impl HoldProtocol for OptimisticHold {
    async fn hold(&self, seat_id: &str, claimant_id: &str) -> ReservationResult<HoldOutcome> {
        let outcome = self
            .store
            .hold_if_available(seat_id, claimant_id, self.hold_ttl)
            .await?;
        Ok(outcome)
    }
}

/// Pessimistic protocol: a named distributed mutex guards a plain
/// read-check-write sequence.
///
/// Used when atomicity must span multiple store operations or keys. The
/// lease bounds how long a crashed holder can strand the seat; it must
/// exceed the critical-section duration or spurious double-holds become
/// possible.
pub struct PessimisticHold {
    store: Arc<dyn SeatStore>,
    locks: Arc<dyn LockProvider>,
    hold_ttl: Duration,
    lock_wait: Duration,
    lock_lease: Duration,
}

impl PessimisticHold {
    pub fn new(
        store: Arc<dyn SeatStore>,
        locks: Arc<dyn LockProvider>,
        hold_ttl: Duration,
        lock_wait: Duration,
        lock_lease: Duration,
    ) -> Self {
        Self { store, locks, hold_ttl, lock_wait, lock_lease }
    }

    /// The critical section: read, check, write. Only ever runs while the
    /// seat lock is held.
    async fn hold_locked(&self, seat_id: &str, claimant_id: &str) -> ReservationResult<HoldOutcome> {
        match self.store.state(seat_id).await? {
            // Absent means the previous hold expired; registration was
            // checked before the lock was taken.
            Some(SeatState::Available) | None => {
                self.store
                    .put(seat_id, &SeatState::held(claimant_id), self.hold_ttl)
                    .await?;
                Ok(HoldOutcome::Held)
            }
            Some(_) => Ok(HoldOutcome::Conflict),
        }
    }
}

#[async_trait]
impl HoldProtocol for PessimisticHold {
    async fn hold(&self, seat_id: &str, claimant_id: &str) -> ReservationResult<HoldOutcome> {
        if !self.store.is_registered(seat_id).await? {
            return Ok(HoldOutcome::UnknownSeat);
        }

        let lock_name = format!("{}{}", LOCK_PREFIX, seat_id);
        let handle = match self
            .locks
            .acquire(&lock_name, self.lock_wait, self.lock_lease)
            .await?
        {
            Some(handle) => handle,
            None => {
                debug!("Lock wait elapsed for {}: hold fails closed", seat_id);
                return Ok(HoldOutcome::Conflict);
            }
        };

        let outcome = self.hold_locked(seat_id, claimant_id).await;

        // Released on every exit path; ownership is verified by token on
        // the provider side, so an expired lease is reported, not torn down.
        match self.locks.release(handle).await {
            Ok(true) => {}
            Ok(false) => warn!("Seat lock for {} expired before release", seat_id),
            Err(e) => warn!("Failed to release seat lock for {}: {}", seat_id, e),
        }

        outcome
    }
}
