use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Observer signaled after a sale is finalized.
///
/// Strictly decoupled fan-out: the reservation service logs failures from
/// this channel and never rolls back a confirmed sale because of them.
#[async_trait]
pub trait SaleNotifier: Send + Sync {
    async fn sale_confirmed(&self, seat_id: &str, claimant_id: &str) -> Result<(), NotifyError>;
}
