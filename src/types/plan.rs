use std::{fmt, str::FromStr};

use chrono::Duration;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Monthly,
    Quarterly,
    Yearly,
}

impl Plan {
    /// Subscription length granted by one confirmed payment.
    pub fn period(&self) -> Duration {
        match self {
            Plan::Monthly => Duration::days(30),
            Plan::Quarterly => Duration::days(90),
            Plan::Yearly => Duration::days(365),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Plan::Monthly => write!(f, "monthly"),
            Plan::Quarterly => write!(f, "quarterly"),
            Plan::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for Plan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Plan, Error> {
        match s {
            "monthly" => Ok(Plan::Monthly),
            "quarterly" => Ok(Plan::Quarterly),
            "yearly" => Ok(Plan::Yearly),
            _ => Err(Error::Validation(format!("unknown plan: {}", s))),
        }
    }
}
