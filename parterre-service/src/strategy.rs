use std::fmt;
use std::str::FromStr;

/// Which hold protocol the service runs by default. Both are always wired
/// up; callers can override per call via `hold_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldStrategy {
    Optimistic,
    Pessimistic,
}

impl fmt::Display for HoldStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldStrategy::Optimistic => write!(f, "optimistic"),
            HoldStrategy::Pessimistic => write!(f, "pessimistic"),
        }
    }
}

impl FromStr for HoldStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimistic" => Ok(HoldStrategy::Optimistic),
            "pessimistic" => Ok(HoldStrategy::Pessimistic),
            other => Err(format!(
                "unknown hold strategy '{}', expected optimistic or pessimistic",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "optimistic".parse::<HoldStrategy>().unwrap(),
            HoldStrategy::Optimistic
        );
        assert_eq!(
            "Pessimistic".parse::<HoldStrategy>().unwrap(),
            HoldStrategy::Pessimistic
        );
        assert!("redlock".parse::<HoldStrategy>().is_err());
    }
}
