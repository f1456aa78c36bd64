//! In-memory implementations of the store and lock traits.
//!
//! Single-process stand-ins for Redis with the same observable semantics:
//! TTL-expired entries read as absent, holds are atomic (one mutex-guarded
//! step), lock releases are token-checked. Used by tests and single-node
//! deployments.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use parterre_core::lock::{LockError, LockHandle, LockProvider};
use parterre_core::seat::SeatState;
use parterre_core::store::{HoldOutcome, SeatStore, StoreError};

struct Entry {
    state: SeatState,
    expires_at: Option<Instant>,
}

#[derive(Default)]
struct SeatTable {
    registry: HashSet<String>,
    seats: HashMap<String, Entry>,
}

impl SeatTable {
    /// Read a seat, dropping it first if its TTL has passed. Mirrors the
    /// store-side eviction Redis performs on expired keys.
    fn live_state(&mut self, seat_id: &str, now: Instant) -> Option<SeatState> {
        let expired = self
            .seats
            .get(seat_id)
            .map_or(false, |e| e.expires_at.map_or(false, |at| at <= now));
        if expired {
            self.seats.remove(seat_id);
            return None;
        }
        self.seats.get(seat_id).map(|e| e.state.clone())
    }

    fn write(&mut self, seat_id: &str, state: SeatState, expires_at: Option<Instant>) {
        self.seats
            .insert(seat_id.to_string(), Entry { state, expires_at });
    }
}

#[derive(Default, Clone)]
pub struct MemorySeatStore {
    inner: Arc<Mutex<SeatTable>>,
}

impl MemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeatStore for MemorySeatStore {
    async fn register(&self, seats: &[String]) -> Result<(), StoreError> {
        let mut table = self.inner.lock().expect("seat table mutex poisoned");
        for seat_id in seats {
            table.registry.insert(seat_id.clone());
            table.write(seat_id, SeatState::Available, None);
        }
        Ok(())
    }

    async fn is_registered(&self, seat_id: &str) -> Result<bool, StoreError> {
        let table = self.inner.lock().expect("seat table mutex poisoned");
        Ok(table.registry.contains(seat_id))
    }

    async fn state(&self, seat_id: &str) -> Result<Option<SeatState>, StoreError> {
        let mut table = self.inner.lock().expect("seat table mutex poisoned");
        Ok(table.live_state(seat_id, Instant::now()))
    }

    async fn put(
        &self,
        seat_id: &str,
        state: &SeatState,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut table = self.inner.lock().expect("seat table mutex poisoned");
        table.write(seat_id, state.clone(), Some(Instant::now() + ttl));
        Ok(())
    }

    async fn hold_if_available(
        &self,
        seat_id: &str,
        claimant_id: &str,
        ttl: Duration,
    ) -> Result<HoldOutcome, StoreError> {
        let now = Instant::now();
        let mut table = self.inner.lock().expect("seat table mutex poisoned");

        let open = match table.live_state(seat_id, now) {
            Some(SeatState::Available) => true,
            Some(_) => return Ok(HoldOutcome::Conflict),
            // Absent: expired hold on a registered seat is open again.
            None if table.registry.contains(seat_id) => true,
            None => return Ok(HoldOutcome::UnknownSeat),
        };

        debug_assert!(open);
        table.write(seat_id, SeatState::held(claimant_id), Some(now + ttl));
        Ok(HoldOutcome::Held)
    }

    async fn confirm_if_held(
        &self,
        seat_id: &str,
        claimant_id: &str,
        retention: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut table = self.inner.lock().expect("seat table mutex poisoned");
        match table.live_state(seat_id, now) {
            Some(state) if state.is_held_by(claimant_id) => {
                table.write(seat_id, SeatState::Sold, Some(now + retention));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_if_held(
        &self,
        seat_id: &str,
        claimant_id: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut table = self.inner.lock().expect("seat table mutex poisoned");
        match table.live_state(seat_id, now) {
            Some(state) if state.is_held_by(claimant_id) => {
                table.write(seat_id, SeatState::Available, Some(now + ttl));
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

struct Grant {
    token: String,
    expires_at: Instant,
}

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// In-process lock provider with the same lease semantics as the Redis
/// one: a grant outlives its holder only until the lease runs out.
#[derive(Default, Clone)]
pub struct MemoryLockProvider {
    locks: Arc<Mutex<HashMap<String, Grant>>>,
}

impl MemoryLockProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    async fn acquire(
        &self,
        name: &str,
        wait: Duration,
        lease: Duration,
    ) -> Result<Option<LockHandle>, LockError> {
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + wait;

        loop {
            {
                let mut locks = self.locks.lock().expect("lock table mutex poisoned");
                let now = Instant::now();
                let vacant = locks.get(name).map_or(true, |g| g.expires_at <= now);
                if vacant {
                    locks.insert(
                        name.to_string(),
                        Grant {
                            token: token.clone(),
                            expires_at: now + lease,
                        },
                    );
                    return Ok(Some(LockHandle {
                        name: name.to_string(),
                        token,
                    }));
                }
            }

            if Instant::now() + RETRY_INTERVAL > deadline {
                return Ok(None);
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    async fn release(&self, handle: LockHandle) -> Result<bool, LockError> {
        let mut locks = self.locks.lock().expect("lock table mutex poisoned");
        let now = Instant::now();
        let owned = locks
            .get(&handle.name)
            .map_or(false, |g| g.token == handle.token && g.expires_at > now);
        if owned {
            locks.remove(&handle.name);
        }
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_hold_outcomes() {
        let store = MemorySeatStore::new();
        store.register(&seats(&["A1"])).await.unwrap();

        let ttl = Duration::from_secs(300);
        assert_eq!(
            store.hold_if_available("A1", "u1", ttl).await.unwrap(),
            HoldOutcome::Held
        );
        assert_eq!(
            store.hold_if_available("A1", "u2", ttl).await.unwrap(),
            HoldOutcome::Conflict
        );
        assert_eq!(
            store.hold_if_available("Z9", "u1", ttl).await.unwrap(),
            HoldOutcome::UnknownSeat
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_hold_reads_as_absent_and_is_reholdable() {
        let store = MemorySeatStore::new();
        store.register(&seats(&["A1"])).await.unwrap();

        let ttl = Duration::from_secs(300);
        store.hold_if_available("A1", "u1", ttl).await.unwrap();
        assert!(store.state("A1").await.unwrap().unwrap().is_held_by("u1"));

        tokio::time::sleep(Duration::from_secs(301)).await;

        assert_eq!(store.state("A1").await.unwrap(), None);
        assert!(store.is_registered("A1").await.unwrap());
        assert_eq!(
            store.hold_if_available("A1", "u2", ttl).await.unwrap(),
            HoldOutcome::Held
        );
    }

    #[tokio::test]
    async fn test_confirm_requires_identity_match() {
        let store = MemorySeatStore::new();
        store.register(&seats(&["A1"])).await.unwrap();
        let ttl = Duration::from_secs(300);
        store.hold_if_available("A1", "u1", ttl).await.unwrap();

        assert!(!store.confirm_if_held("A1", "u2", ttl).await.unwrap());
        assert!(store.confirm_if_held("A1", "u1", ttl).await.unwrap());
        // Terminal: a second confirm finds SOLD, not a hold
        assert!(!store.confirm_if_held("A1", "u1", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_only_reverts_own_hold() {
        let store = MemorySeatStore::new();
        store.register(&seats(&["A1"])).await.unwrap();
        let ttl = Duration::from_secs(300);

        assert!(!store.release_if_held("A1", "u1", ttl).await.unwrap());

        store.hold_if_available("A1", "u1", ttl).await.unwrap();
        assert!(!store.release_if_held("A1", "u2", ttl).await.unwrap());
        assert!(store.release_if_held("A1", "u1", ttl).await.unwrap());
        assert_eq!(
            store.state("A1").await.unwrap(),
            Some(SeatState::Available)
        );
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_until_released() {
        let locks = MemoryLockProvider::new();
        let wait = Duration::ZERO;
        let lease = Duration::from_secs(10);

        let handle = locks.acquire("LOCK:A1", wait, lease).await.unwrap().unwrap();
        assert!(locks.acquire("LOCK:A1", wait, lease).await.unwrap().is_none());

        assert!(locks.release(handle).await.unwrap());
        assert!(locks.acquire("LOCK:A1", wait, lease).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_lease_can_be_stolen_but_not_released() {
        let locks = MemoryLockProvider::new();
        let wait = Duration::ZERO;
        let lease = Duration::from_secs(10);

        let stale = locks.acquire("LOCK:A1", wait, lease).await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;

        // Lease ran out: the lock moves on, and the stale handle must not
        // be able to tear down the new grant.
        let fresh = locks.acquire("LOCK:A1", wait, lease).await.unwrap().unwrap();
        assert!(!locks.release(stale).await.unwrap());
        assert!(locks.release(fresh).await.unwrap());
    }
}
