use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use parterre_core::hold::{HoldProtocol, OptimisticHold, PessimisticHold};
use parterre_core::lock::LockProvider;
use parterre_core::notify::SaleNotifier;
use parterre_core::seat::SeatState;
use parterre_core::store::{HoldOutcome, SeatStore};
use parterre_core::{ReservationError, ReservationResult};
use parterre_store::app_config::{Config, ReservationRules};
use parterre_store::{RedisLockProvider, RedisSaleNotifier, RedisSeatStore};

use crate::strategy::HoldStrategy;

/// Boundary view of a seat. `NotFound` marks a seat that was never
/// initialized and is deliberately distinct from `Available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Held { claimant: String },
    Sold,
    NotFound,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatStatus::Available => write!(f, "AVAILABLE"),
            SeatStatus::Held { claimant } => write!(f, "HELD:{}", claimant),
            SeatStatus::Sold => write!(f, "SOLD"),
            SeatStatus::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

/// Stateless orchestration over the store, the hold protocols and the
/// optional sale notifier. Every call is a pass-through; all seat state
/// lives in the shared store, never in this struct.
pub struct ReservationService {
    store: Arc<dyn SeatStore>,
    optimistic: OptimisticHold,
    pessimistic: PessimisticHold,
    default_strategy: HoldStrategy,
    notifier: Option<Arc<dyn SaleNotifier>>,
    sold_ttl: Duration,
    release_ttl: Duration,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn SeatStore>,
        locks: Arc<dyn LockProvider>,
        rules: &ReservationRules,
    ) -> ReservationResult<Self> {
        let default_strategy = rules.strategy.parse().map_err(ReservationError::Config)?;
        Ok(Self {
            optimistic: OptimisticHold::new(store.clone(), rules.hold_ttl()),
            pessimistic: PessimisticHold::new(
                store.clone(),
                locks,
                rules.hold_ttl(),
                rules.lock_wait(),
                rules.lock_lease(),
            ),
            store,
            default_strategy,
            notifier: None,
            sold_ttl: rules.sold_ttl(),
            release_ttl: rules.release_ttl(),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn SaleNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wire the Redis-backed store, lock provider and (if enabled)
    /// notifier from configuration.
    pub fn from_config(cfg: &Config) -> ReservationResult<Self> {
        let store = Arc::new(RedisSeatStore::connect(&cfg.redis.url)?);
        let locks = Arc::new(RedisLockProvider::connect(&cfg.redis.url)?);
        let mut service = Self::new(store, locks, &cfg.reservation)?;
        if cfg.notifications.enabled {
            let notifier =
                RedisSaleNotifier::connect(&cfg.redis.url, &cfg.notifications.channel)
                    .map_err(|e| ReservationError::Config(e.to_string()))?;
            service = service.with_notifier(Arc::new(notifier));
        }
        Ok(service)
    }

    pub fn default_strategy(&self) -> HoldStrategy {
        self.default_strategy
    }

    /// Register seats and mark them all AVAILABLE.
    pub async fn init_seats(&self, seats: &[String]) -> ReservationResult<()> {
        self.store.register(seats).await?;
        info!("Initialized {} seats", seats.len());
        Ok(())
    }

    /// Provisionally reserve a seat with the configured strategy. False is
    /// the contention outcome (someone else has the seat), never a fault.
    pub async fn hold(&self, seat_id: &str, claimant_id: &str) -> ReservationResult<bool> {
        self.hold_with(self.default_strategy, seat_id, claimant_id)
            .await
    }

    /// Same as `hold` with an explicit strategy, so callers and tests can
    /// select or compare the two protocols.
    pub async fn hold_with(
        &self,
        strategy: HoldStrategy,
        seat_id: &str,
        claimant_id: &str,
    ) -> ReservationResult<bool> {
        let protocol: &dyn HoldProtocol = match strategy {
            HoldStrategy::Optimistic => &self.optimistic,
            HoldStrategy::Pessimistic => &self.pessimistic,
        };

        match protocol.hold(seat_id, claimant_id).await? {
            HoldOutcome::Held => {
                info!("Seat held: {} by {}", seat_id, claimant_id);
                Ok(true)
            }
            HoldOutcome::Conflict => Ok(false),
            HoldOutcome::UnknownSeat => {
                Err(ReservationError::UnknownSeat(seat_id.to_string()))
            }
        }
    }

    /// Finalize a hold into an irreversible sale. False covers both "seat
    /// not held" and "held by someone else".
    pub async fn confirm(&self, seat_id: &str, claimant_id: &str) -> ReservationResult<bool> {
        let sold = self
            .store
            .confirm_if_held(seat_id, claimant_id, self.sold_ttl)
            .await?;

        if sold {
            info!("Seat sold: {} to {}", seat_id, claimant_id);
            if let Some(notifier) = &self.notifier {
                // Fan-out only; a notification failure never voids the sale.
                if let Err(e) = notifier.sale_confirmed(seat_id, claimant_id).await {
                    error!("Sale notification failed for {}: {}", seat_id, e);
                }
            }
        }
        Ok(sold)
    }

    /// Best-effort revert of the caller's own hold; a no-op for any other
    /// seat state.
    pub async fn release(&self, seat_id: &str, claimant_id: &str) -> ReservationResult<()> {
        let reverted = self
            .store
            .release_if_held(seat_id, claimant_id, self.release_ttl)
            .await?;
        if reverted {
            info!("Seat released: {} by {}", seat_id, claimant_id);
        }
        Ok(())
    }

    pub async fn status(&self, seat_id: &str) -> ReservationResult<SeatStatus> {
        match self.store.state(seat_id).await? {
            Some(SeatState::Available) => Ok(SeatStatus::Available),
            Some(SeatState::Held { claimant }) => Ok(SeatStatus::Held { claimant }),
            Some(SeatState::Sold) => Ok(SeatStatus::Sold),
            // Absent key: an expired hold on a registered seat is open
            // again; an unregistered seat is not found.
            None if self.store.is_registered(seat_id).await? => Ok(SeatStatus::Available),
            None => Ok(SeatStatus::NotFound),
        }
    }
}
