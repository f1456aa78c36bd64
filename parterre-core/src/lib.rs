pub mod hold;
pub mod lock;
pub mod notify;
pub mod seat;
pub mod store;

use crate::lock::LockError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
    #[error("Lock failure: {0}")]
    Lock(#[from] LockError),
    #[error("Unknown seat: {0}")]
    UnknownSeat(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ReservationResult<T> = Result<T, ReservationError>;
