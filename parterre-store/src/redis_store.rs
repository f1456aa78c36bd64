use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use std::time::Duration;
use tracing::info;

use parterre_core::seat::SeatState;
use parterre_core::store::{HoldOutcome, SeatStore, StoreError};

use crate::keys;

/// AVAILABLE → HELD:<claimant> as one server-side step. A missing key is
/// re-holdable only when the seat is in the registry (its previous hold
/// expired); an unregistered seat reports -1.
const HOLD_IF_AVAILABLE: &str = r#"
local v = redis.call('GET', KEYS[1])
if v == 'AVAILABLE' then
    redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
    return 1
end
if v then
    return 0
end
if redis.call('SISMEMBER', KEYS[2], ARGV[3]) == 1 then
    redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
    return 1
end
return -1
"#;

/// Conditional rewrite keyed on the exact current value. Used for both
/// confirm (HELD:<claimant> → SOLD) and release (HELD:<claimant> →
/// AVAILABLE) so neither is a separate read-then-write.
const SWAP_IF_EQUALS: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
    return 1
end
return 0
"#;

/// Seat store backed by Redis; all conditional transitions run as Lua
/// scripts so they are indivisible on the server.
#[derive(Clone)]
pub struct RedisSeatStore {
    client: redis::Client,
    hold_script: Script,
    swap_script: Script,
}

impl RedisSeatStore {
    pub fn connect(connection_string: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_string)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            hold_script: Script::new(HOLD_IF_AVAILABLE),
            swap_script: Script::new(SWAP_IF_EQUALS),
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    /// Run one of the conditional-set scripts, distinguishing transport
    /// failures from script-evaluation failures.
    async fn swap_if_equals(
        &self,
        seat_id: &str,
        expected: &SeatState,
        next: &SeatState,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let result: i64 = self
            .swap_script
            .key(keys::seat(seat_id))
            .arg(expected.to_string())
            .arg(next.to_string())
            .arg(ttl.as_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(result == 1)
    }
}

fn map_redis_err(e: redis::RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Script(e.to_string())
    }
}

#[async_trait]
impl SeatStore for RedisSeatStore {
    async fn register(&self, seats: &[String]) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        for seat_id in seats {
            pipe.sadd(keys::REGISTRY, seat_id).ignore();
            pipe.set(keys::seat(seat_id), SeatState::Available.to_string())
                .ignore();
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        info!("Registered {} seats as AVAILABLE", seats.len());
        Ok(())
    }

    async fn is_registered(&self, seat_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        conn.sismember(keys::REGISTRY, seat_id)
            .await
            .map_err(map_redis_err)
    }

    async fn state(&self, seat_id: &str) -> Result<Option<SeatState>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(keys::seat(seat_id))
            .await
            .map_err(map_redis_err)?;
        raw.map(|v| v.parse().map_err(|_| StoreError::Data(v)))
            .transpose()
    }

    async fn put(
        &self,
        seat_id: &str,
        state: &SeatState,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(keys::seat(seat_id), state.to_string(), ttl.as_secs())
            .await
            .map_err(map_redis_err)
    }

    async fn hold_if_available(
        &self,
        seat_id: &str,
        claimant_id: &str,
        ttl: Duration,
    ) -> Result<HoldOutcome, StoreError> {
        let mut conn = self.connection().await?;
        let result: i64 = self
            .hold_script
            .key(keys::seat(seat_id))
            .key(keys::REGISTRY)
            .arg(SeatState::held(claimant_id).to_string())
            .arg(ttl.as_secs())
            .arg(seat_id)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        match result {
            1 => Ok(HoldOutcome::Held),
            0 => Ok(HoldOutcome::Conflict),
            _ => Ok(HoldOutcome::UnknownSeat),
        }
    }

    async fn confirm_if_held(
        &self,
        seat_id: &str,
        claimant_id: &str,
        retention: Duration,
    ) -> Result<bool, StoreError> {
        self.swap_if_equals(
            seat_id,
            &SeatState::held(claimant_id),
            &SeatState::Sold,
            retention,
        )
        .await
    }

    async fn release_if_held(
        &self,
        seat_id: &str,
        claimant_id: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.swap_if_equals(
            seat_id,
            &SeatState::held(claimant_id),
            &SeatState::Available,
            ttl,
        )
        .await
    }
}
