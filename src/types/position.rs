//! Position enums
//!
//! Option contract type, trade direction and the position lifecycle status.
//! Status transitions are checked here so no handler carries its own
//! string comparisons.

use std::{fmt, str::FromStr};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

impl FromStr for OptionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<OptionType, Error> {
        match s {
            "CALL" => Ok(OptionType::Call),
            "PUT" => Ok(OptionType::Put),
            _ => Err(Error::Validation(format!(
                "unknown option type: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Direction, Error> {
        match s {
            "BUY" => Ok(Direction::Buy),
            "SELL" => Ok(Direction::Sell),
            _ => Err(Error::Validation(format!("unknown direction: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    PartiallyClosed,
    Closed,
}

impl PositionStatus {
    /// Legal lifecycle moves. PartiallyClosed -> PartiallyClosed covers
    /// repeated partial closes on the same record.
    pub fn can_transition_to(&self, next: PositionStatus) -> bool {
        matches!(
            (self, next),
            (PositionStatus::Open, PositionStatus::PartiallyClosed)
                | (PositionStatus::Open, PositionStatus::Closed)
                | (
                    PositionStatus::PartiallyClosed,
                    PositionStatus::PartiallyClosed
                )
                | (PositionStatus::PartiallyClosed, PositionStatus::Closed)
        )
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "Open"),
            PositionStatus::PartiallyClosed => write!(f, "PartiallyClosed"),
            PositionStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for PositionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<PositionStatus, Error> {
        match s {
            "Open" => Ok(PositionStatus::Open),
            "PartiallyClosed" => Ok(PositionStatus::PartiallyClosed),
            "Closed" => Ok(PositionStatus::Closed),
            _ => Err(Error::Validation(format!(
                "unknown position status: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_is_terminal() {
        assert!(!PositionStatus::Closed
            .can_transition_to(PositionStatus::Open));
        assert!(!PositionStatus::Closed
            .can_transition_to(PositionStatus::PartiallyClosed));
        assert!(!PositionStatus::Closed
            .can_transition_to(PositionStatus::Closed));
    }

    #[test]
    fn partial_close_can_repeat() {
        assert!(PositionStatus::PartiallyClosed
            .can_transition_to(PositionStatus::PartiallyClosed));
        assert!(PositionStatus::PartiallyClosed
            .can_transition_to(PositionStatus::Closed));
    }

    #[test]
    fn reopen_is_rejected() {
        assert!(!PositionStatus::PartiallyClosed
            .can_transition_to(PositionStatus::Open));
    }

    #[test]
    fn status_round_trip() {
        for status in ["Open", "PartiallyClosed", "Closed"] {
            let parsed: PositionStatus = status.parse().unwrap();
            assert_eq!(parsed.to_string(), status);
        }
        assert!("open".parse::<PositionStatus>().is_err());
    }
}
