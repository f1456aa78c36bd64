//! Key builders for everything the engine writes to the shared store.
//!
//! Centralising key construction keeps the layout (`seat:<id>`, the seat
//! registry set) in one place.

/// Registry set of every initialized seat id. Distinguishes "hold expired,
/// seat is open again" from "seat was never initialized".
pub const REGISTRY: &str = "seat:index";

/// State key for a seat.
pub fn seat(seat_id: &str) -> String {
    format!("seat:{}", seat_id)
}
