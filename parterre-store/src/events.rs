use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use parterre_core::notify::{NotifyError, SaleNotifier};

/// Payload published on the notification channel after a confirmed sale.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaleEvent {
    pub seat_id: String,
    pub claimant_id: String,
    pub confirmed_at: i64, // Unix timestamp
}

/// Pub/sub fan-out for confirmed sales. Fire-and-forget from the service's
/// perspective; downstream subscribers (email, SMS, push) consume the
/// channel on their own schedule.
#[derive(Clone)]
pub struct RedisSaleNotifier {
    client: redis::Client,
    channel: String,
}

impl RedisSaleNotifier {
    pub fn connect(connection_string: &str, channel: &str) -> Result<Self, NotifyError> {
        let client = redis::Client::open(connection_string)
            .map_err(|e| NotifyError(e.to_string()))?;
        Ok(Self {
            client,
            channel: channel.to_string(),
        })
    }
}

#[async_trait]
impl SaleNotifier for RedisSaleNotifier {
    async fn sale_confirmed(&self, seat_id: &str, claimant_id: &str) -> Result<(), NotifyError> {
        let event = SaleEvent {
            seat_id: seat_id.to_string(),
            claimant_id: claimant_id.to_string(),
            confirmed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs() as i64),
        };
        let payload = serde_json::to_string(&event).map_err(|e| NotifyError(e.to_string()))?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        let receivers: i64 = conn
            .publish(&self.channel, payload)
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        info!(
            "Sale event published to {}: {} -> {} ({} receivers)",
            self.channel, seat_id, claimant_id, receivers
        );
        Ok(())
    }
}
