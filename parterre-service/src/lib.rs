pub mod service;
pub mod strategy;

pub use service::{ReservationService, SeatStatus};
pub use strategy::HoldStrategy;
