use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a seat as stored in the shared store.
///
/// Transitions: Available → Held(claimant) → Sold (terminal), with
/// Held(claimant) → Available via explicit release or TTL expiry.
/// A sale is irreversible; a hold can only be advanced by the claimant
/// that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatState {
    Available,
    Held { claimant: String },
    Sold,
}

impl SeatState {
    pub fn held(claimant: impl Into<String>) -> Self {
        SeatState::Held { claimant: claimant.into() }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SeatState::Available)
    }

    pub fn is_sold(&self) -> bool {
        matches!(self, SeatState::Sold)
    }

    /// Possession check: true only for an exact claimant match.
    pub fn is_held_by(&self, claimant_id: &str) -> bool {
        matches!(self, SeatState::Held { claimant } if claimant == claimant_id)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &SeatState) -> bool {
        match (self, next) {
            (SeatState::Available, SeatState::Held { .. }) => true,
            (SeatState::Held { .. }, SeatState::Sold) => true,
            (SeatState::Held { .. }, SeatState::Available) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatState::Available => write!(f, "AVAILABLE"),
            SeatState::Held { claimant } => write!(f, "HELD:{}", claimant),
            SeatState::Sold => write!(f, "SOLD"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unrecognized seat state: {0}")]
pub struct ParseSeatStateError(String);

impl FromStr for SeatState {
    type Err = ParseSeatStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatState::Available),
            "SOLD" => Ok(SeatState::Sold),
            other => match other.strip_prefix("HELD:") {
                Some(claimant) if !claimant.is_empty() => Ok(SeatState::held(claimant)),
                _ => Err(ParseSeatStateError(other.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_encoding_round_trip() {
        let states = [
            SeatState::Available,
            SeatState::held("u1"),
            SeatState::Sold,
        ];

        for state in states {
            let encoded = state.to_string();
            let decoded: SeatState = encoded.parse().unwrap();
            assert_eq!(decoded, state);
        }

        assert_eq!(SeatState::held("u1").to_string(), "HELD:u1");
    }

    #[test]
    fn test_rejects_malformed_values() {
        assert!("".parse::<SeatState>().is_err());
        assert!("HELD:".parse::<SeatState>().is_err());
        assert!("held:u1".parse::<SeatState>().is_err());
        assert!("RESERVED".parse::<SeatState>().is_err());
    }

    #[test]
    fn test_possession_requires_exact_match() {
        let held = SeatState::held("u1");
        assert!(held.is_held_by("u1"));
        assert!(!held.is_held_by("u2"));
        assert!(!SeatState::Available.is_held_by("u1"));
        assert!(!SeatState::Sold.is_held_by("u1"));
    }

    #[test]
    fn test_legal_transitions() {
        let held = SeatState::held("u1");

        assert!(SeatState::Available.can_transition_to(&held));
        assert!(held.can_transition_to(&SeatState::Sold));
        assert!(held.can_transition_to(&SeatState::Available));
    }

    #[test]
    fn test_illegal_transitions() {
        let held_a = SeatState::held("u1");
        let held_b = SeatState::held("u2");

        // No direct sale, nothing out of SOLD, no cross-claimant handoff
        assert!(!SeatState::Available.can_transition_to(&SeatState::Sold));
        assert!(!SeatState::Sold.can_transition_to(&SeatState::Available));
        assert!(!SeatState::Sold.can_transition_to(&held_a));
        assert!(!held_a.can_transition_to(&held_b));
    }
}
