//! Margin aggregator
//!
//! Utilized margin is always recomputed from open positions; the
//! `margin_used` column on the user row is a denormalized hint refreshed on
//! every read or update, never read back as a source of truth.
//!
//! Sign convention carried over from the accounting rules of this system:
//! BUY positions add exposure, SELL positions subtract it. The whole
//! convention lives in `contribution`.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    model::{Position, User},
    types::{Direction, MarginOpKind, PositionStatus},
};

#[derive(Debug, Serialize)]
pub struct MarginState {
    pub limit: BigDecimal,
    pub used: BigDecimal,
    pub available: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct PositionContribution {
    pub position_id: i64,
    pub visual_id: String,
    pub amount: BigDecimal,
}

/// Margin a single position contributes to utilization. `None` when the
/// position declares no margin. PartiallyClosed positions scale by the
/// fraction of quantity still open.
pub fn contribution(
    position: &Position,
) -> Result<Option<BigDecimal>, Error> {
    let status = PositionStatus::from_str(&position.status)?;
    let direction = Direction::from_str(&position.direction)?;

    if position.margin <= BigDecimal::from(0) {
        return Ok(None);
    }

    let scaled = match status {
        PositionStatus::Open => position.margin.to_owned(),
        PositionStatus::PartiallyClosed => {
            &position.margin * BigDecimal::from(position.remaining_quantity())
                / BigDecimal::from(position.original_quantity())
        },
        PositionStatus::Closed => return Ok(None),
    };

    let signed = match direction {
        Direction::Buy => scaled,
        Direction::Sell => -scaled,
    };

    Ok(Some(signed))
}

pub fn aggregate(positions: &[Position]) -> Result<BigDecimal, Error> {
    let mut total = BigDecimal::from(0);

    for position in positions {
        if let Some(amount) = contribution(position)? {
            total += amount;
        }
    }

    Ok(total)
}

/// Recomputes utilized margin from the user's open positions and persists
/// it on the user row.
pub async fn recompute(
    state: &AppState<State>,
    user_id: i64,
) -> Result<BigDecimal, Error> {
    let positions = state.database.position.get_open_by_user(user_id).await?;
    let used = aggregate(&positions)?;

    state
        .database
        .user
        .update_margin_used(user_id, used.to_owned())
        .await?;

    Ok(used)
}

pub async fn breakdown(
    state: &AppState<State>,
    user: &User,
) -> Result<(MarginState, Vec<PositionContribution>), Error> {
    let positions =
        state.database.position.get_open_by_user(user.id).await?;
    let mut contributions = vec![];
    let mut used = BigDecimal::from(0);

    for position in &positions {
        if let Some(amount) = contribution(position)? {
            used += &amount;
            contributions.push(PositionContribution {
                position_id: position.id,
                visual_id: position.visual_id.to_owned(),
                amount,
            });
        }
    }

    state
        .database
        .user
        .update_margin_used(user.id, used.to_owned())
        .await?;

    let available = &user.margin_limit - &used;

    Ok((
        MarginState {
            limit: user.margin_limit.to_owned(),
            used,
            available,
        },
        contributions,
    ))
}

/// Decides the new margin ceiling for one of the four update operations.
/// `used` is the freshly recomputed utilization. Pure.
pub fn plan_margin_op(
    kind: MarginOpKind,
    amount: &BigDecimal,
    limit: &BigDecimal,
    used: &BigDecimal,
) -> Result<BigDecimal, Error> {
    let zero = BigDecimal::from(0);

    match kind {
        MarginOpKind::Deposit => {
            if amount <= &zero {
                return Err(Error::Validation(String::from(
                    "deposit amount must be positive",
                )));
            }
            Ok(limit + amount)
        },
        MarginOpKind::Withdraw => {
            if amount <= &zero {
                return Err(Error::Validation(String::from(
                    "withdrawal amount must be positive",
                )));
            }
            let new_limit = limit - amount;
            if &new_limit < used {
                return Err(Error::Validation(String::from(
                    "withdrawal would drop the margin limit below current utilization",
                )));
            }
            Ok(new_limit)
        },
        MarginOpKind::Adjust => {
            if amount < &zero {
                return Err(Error::Validation(String::from(
                    "adjusted margin limit must be non-negative",
                )));
            }
            if amount < used {
                return Err(Error::Validation(String::from(
                    "adjusted margin limit is below current utilization",
                )));
            }
            Ok(amount.to_owned())
        },
        MarginOpKind::InitialSetup => {
            if amount <= &zero {
                return Err(Error::Validation(String::from(
                    "initial margin limit must be positive",
                )));
            }
            if limit > &zero {
                return Err(Error::Validation(String::from(
                    "margin limit is already configured",
                )));
            }
            Ok(amount.to_owned())
        },
    }
}

/// Recomputes utilization, applies the operation and persists the new
/// ceiling. Rejected operations leave no state change beyond the refreshed
/// utilization hint.
pub async fn apply_margin_op(
    state: &AppState<State>,
    user: &User,
    kind: MarginOpKind,
    amount: &BigDecimal,
) -> Result<MarginState, Error> {
    let used = recompute(state, user.id).await?;
    let limit = plan_margin_op(kind, amount, &user.margin_limit, &used)?;

    state
        .database
        .user
        .update_margin_limit(user.id, limit.to_owned(), used.to_owned())
        .await?;

    let available = &limit - &used;

    Ok(MarginState {
        limit,
        used,
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn position(
        direction: &str,
        status: &str,
        quantity: i32,
        quantity_closed: i32,
        margin: i64,
    ) -> Position {
        Position {
            id: 1,
            visual_id: String::from("OP-TEST01"),
            ticker: String::from("VALE3"),
            option_type: String::from("PUT"),
            direction: String::from(direction),
            strike: BigDecimal::from(60),
            entry_price: BigDecimal::from(2),
            quantity,
            quantity_closed,
            status: String::from(status),
            open_date: Utc::now(),
            close_date: None,
            close_price: None,
            open_value: None,
            close_value: None,
            result: None,
            margin: BigDecimal::from(margin),
            user_id: 42,
            parent_id: None,
            child_ids: vec![],
        }
    }

    #[test]
    fn open_buy_contributes_full_margin() {
        let p = position("BUY", "Open", 100, 0, 500);
        assert_eq!(contribution(&p).unwrap(), Some(BigDecimal::from(500)));
    }

    #[test]
    fn partially_closed_scales_by_open_fraction() {
        let p = position("BUY", "PartiallyClosed", 60, 40, 500);
        assert_eq!(contribution(&p).unwrap(), Some(BigDecimal::from(300)));
    }

    #[test]
    fn sell_contributes_negatively() {
        let p = position("SELL", "Open", 100, 0, 500);
        assert_eq!(contribution(&p).unwrap(), Some(BigDecimal::from(-500)));
    }

    #[test]
    fn zero_margin_is_skipped() {
        let p = position("BUY", "Open", 100, 0, 0);
        assert_eq!(contribution(&p).unwrap(), None);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let positions = vec![
            position("BUY", "Open", 100, 0, 500),
            position("SELL", "PartiallyClosed", 30, 70, 1000),
        ];

        let first = aggregate(&positions).unwrap();
        let second = aggregate(&positions).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, BigDecimal::from(200));
    }

    #[test]
    fn deposit_raises_limit() {
        let limit = plan_margin_op(
            MarginOpKind::Deposit,
            &BigDecimal::from(250),
            &BigDecimal::from(1000),
            &BigDecimal::from(400),
        )
        .unwrap();
        assert_eq!(limit, BigDecimal::from(1250));
    }

    #[test]
    fn withdrawal_below_utilization_is_rejected() {
        let err = plan_margin_op(
            MarginOpKind::Withdraw,
            &BigDecimal::from(700),
            &BigDecimal::from(1000),
            &BigDecimal::from(400),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn adjust_below_utilization_is_rejected() {
        let err = plan_margin_op(
            MarginOpKind::Adjust,
            &BigDecimal::from(300),
            &BigDecimal::from(1000),
            &BigDecimal::from(400),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn initial_setup_rejected_when_configured() {
        let err = plan_margin_op(
            MarginOpKind::InitialSetup,
            &BigDecimal::from(300),
            &BigDecimal::from(1000),
            &BigDecimal::from(0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let limit = plan_margin_op(
            MarginOpKind::InitialSetup,
            &BigDecimal::from(300),
            &BigDecimal::from(0),
            &BigDecimal::from(0),
        )
        .unwrap();
        assert_eq!(limit, BigDecimal::from(300));
    }
}
