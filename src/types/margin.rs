use std::{fmt, str::FromStr};

use crate::error::Error;

/// The four margin-limit mutations accepted by `POST /api/margin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginOpKind {
    Deposit,
    Withdraw,
    Adjust,
    InitialSetup,
}

impl fmt::Display for MarginOpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MarginOpKind::Deposit => write!(f, "deposit"),
            MarginOpKind::Withdraw => write!(f, "withdraw"),
            MarginOpKind::Adjust => write!(f, "adjust"),
            MarginOpKind::InitialSetup => write!(f, "initial-setup"),
        }
    }
}

impl FromStr for MarginOpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<MarginOpKind, Error> {
        match s {
            "deposit" => Ok(MarginOpKind::Deposit),
            "withdraw" => Ok(MarginOpKind::Withdraw),
            "adjust" => Ok(MarginOpKind::Adjust),
            "initial-setup" => Ok(MarginOpKind::InitialSetup),
            _ => Err(Error::Validation(format!(
                "unknown margin operation: {}",
                s
            ))),
        }
    }
}
