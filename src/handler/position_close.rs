//! Position close handler
//!
//! Splits a position into a closed slice plus an open remainder, or closes
//! the whole remaining quantity in place. The arithmetic and validation are
//! pure (`plan_close`); `close_position` applies the outcome inside one
//! database transaction and refreshes the owner's margin.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    auth::Identity,
    configuration::{AppState, State},
    error::Error,
    handler::margin,
    helpers::generate_visual_id,
    model::{New_Position_Slice, Position},
    types::{Direction, PositionStatus},
};

#[derive(Debug)]
pub enum CloseOutcome {
    Partial {
        slice: New_Position_Slice,
        remaining_quantity: i32,
        quantity_closed: i32,
    },
    Full {
        close_date: DateTime<Utc>,
        close_price: BigDecimal,
        open_value: BigDecimal,
        close_value: BigDecimal,
        result: BigDecimal,
    },
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub position: Position,
    pub slice: Option<Position>,
}

pub fn per_unit_result(
    direction: Direction,
    entry_price: &BigDecimal,
    close_price: &BigDecimal,
) -> BigDecimal {
    match direction {
        Direction::Buy => close_price - entry_price,
        Direction::Sell => entry_price - close_price,
    }
}

/// Validates a close request against the current record and computes what
/// has to be written. Performs no I/O.
pub fn plan_close(
    position: &Position,
    close_price: &BigDecimal,
    quantity: Option<i32>,
    now: DateTime<Utc>,
) -> Result<CloseOutcome, Error> {
    let status = PositionStatus::from_str(&position.status)?;
    let direction = Direction::from_str(&position.direction)?;

    if close_price < &BigDecimal::from(0) {
        return Err(Error::Validation(String::from(
            "close price must be non-negative",
        )));
    }

    let remaining = position.remaining_quantity();
    let close_quantity = quantity.unwrap_or(remaining);

    if close_quantity <= 0 {
        return Err(Error::Validation(String::from(
            "quantity to close must be positive",
        )));
    }

    if close_quantity > remaining {
        return Err(Error::Validation(format!(
            "quantity to close {} exceeds remaining open quantity {}",
            close_quantity, remaining
        )));
    }

    let next_status = if close_quantity == remaining {
        PositionStatus::Closed
    } else {
        PositionStatus::PartiallyClosed
    };

    if !status.can_transition_to(next_status) {
        return Err(Error::Validation(format!(
            "position is {} and cannot be closed",
            status
        )));
    }

    let quantity_dec = BigDecimal::from(close_quantity);
    let per_unit =
        per_unit_result(direction, &position.entry_price, close_price);
    let open_value = &position.entry_price * &quantity_dec;
    let close_value = close_price * &quantity_dec;
    let result = &per_unit * &quantity_dec;

    if close_quantity == remaining {
        return Ok(CloseOutcome::Full {
            close_date: now,
            close_price: close_price.to_owned(),
            open_value,
            close_value,
            result,
        });
    }

    let original = BigDecimal::from(position.original_quantity());
    let slice_margin = &position.margin * &quantity_dec / original;

    Ok(CloseOutcome::Partial {
        slice: New_Position_Slice {
            ticker: position.ticker.to_owned(),
            option_type: position.option_type.to_owned(),
            direction: position.direction.to_owned(),
            strike: position.strike.to_owned(),
            entry_price: position.entry_price.to_owned(),
            quantity: close_quantity,
            open_date: position.open_date,
            close_date: now,
            close_price: close_price.to_owned(),
            open_value,
            close_value,
            result,
            margin: slice_margin,
            user_id: position.user_id,
            parent_id: position.id,
        },
        remaining_quantity: remaining - close_quantity,
        quantity_closed: position.quantity_closed + close_quantity,
    })
}

pub async fn close_position(
    state: &AppState<State>,
    caller: &Identity,
    id: i64,
    close_price: BigDecimal,
    quantity: Option<i32>,
) -> Result<CloseResponse, Error> {
    let position = state
        .database
        .position
        .get_one(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("position {} not found", id)))?;

    if position.user_id != caller.id {
        return Err(Error::Forbidden(String::from(
            "position belongs to another user",
        )));
    }

    let outcome = plan_close(&position, &close_price, quantity, Utc::now())?;
    let mut transaction = state.database.pool.begin().await?;

    let response = match outcome {
        CloseOutcome::Partial {
            slice,
            remaining_quantity,
            quantity_closed,
        } => {
            let child = state
                .database
                .position
                .insert_slice(generate_visual_id(), slice, &mut transaction)
                .await?;
            let updated = state
                .database
                .position
                .apply_partial_close(
                    position.id,
                    remaining_quantity,
                    quantity_closed,
                    child.id,
                    &mut transaction,
                )
                .await?;

            info!(
                "position {} partially closed: {} contracts off, {} remain",
                updated.visual_id, child.quantity, remaining_quantity
            );

            CloseResponse {
                position: updated,
                slice: Some(child),
            }
        },
        CloseOutcome::Full {
            close_date,
            close_price,
            open_value,
            close_value,
            result,
        } => {
            let updated = state
                .database
                .position
                .apply_full_close(
                    position.id,
                    close_date,
                    close_price,
                    open_value,
                    close_value,
                    result,
                    &mut transaction,
                )
                .await?;

            info!("position {} closed", updated.visual_id);

            CloseResponse {
                position: updated,
                slice: None,
            }
        },
    };

    transaction.commit().await?;

    margin::recompute(state, caller.id).await?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy_position() -> Position {
        Position {
            id: 1,
            visual_id: String::from("OP-TEST01"),
            ticker: String::from("PETR4"),
            option_type: String::from("CALL"),
            direction: String::from("BUY"),
            strike: BigDecimal::from(30),
            entry_price: BigDecimal::from(10),
            quantity: 100,
            quantity_closed: 0,
            status: String::from("Open"),
            open_date: Utc::now(),
            close_date: None,
            close_price: None,
            open_value: None,
            close_value: None,
            result: None,
            margin: BigDecimal::from(500),
            user_id: 42,
            parent_id: None,
            child_ids: vec![],
        }
    }

    #[test]
    fn buy_partial_close_splits_result() {
        let position = buy_position();
        let outcome = plan_close(
            &position,
            &BigDecimal::from(12),
            Some(40),
            Utc::now(),
        )
        .unwrap();

        match outcome {
            CloseOutcome::Partial {
                slice,
                remaining_quantity,
                quantity_closed,
            } => {
                assert_eq!(slice.quantity, 40);
                assert_eq!(slice.result, BigDecimal::from(80));
                assert_eq!(slice.open_value, BigDecimal::from(400));
                assert_eq!(slice.close_value, BigDecimal::from(480));
                assert_eq!(slice.margin, BigDecimal::from(200));
                assert_eq!(slice.parent_id, 1);
                assert_eq!(remaining_quantity, 60);
                assert_eq!(quantity_closed, 40);
            },
            CloseOutcome::Full { .. } => panic!("expected a partial close"),
        }
    }

    #[test]
    fn closing_the_remainder_closes_in_place() {
        let mut position = buy_position();
        position.quantity = 60;
        position.quantity_closed = 40;
        position.status = String::from("PartiallyClosed");

        let outcome =
            plan_close(&position, &BigDecimal::from(8), None, Utc::now())
                .unwrap();

        match outcome {
            CloseOutcome::Full { result, .. } => {
                assert_eq!(result, BigDecimal::from(-120));
            },
            CloseOutcome::Partial { .. } => panic!("expected a full close"),
        }
    }

    #[test]
    fn sell_direction_inverts_result() {
        let mut position = buy_position();
        position.direction = String::from("SELL");

        let outcome = plan_close(
            &position,
            &BigDecimal::from(12),
            Some(40),
            Utc::now(),
        )
        .unwrap();

        match outcome {
            CloseOutcome::Partial { slice, .. } => {
                assert_eq!(slice.result, BigDecimal::from(-80));
            },
            CloseOutcome::Full { .. } => panic!("expected a partial close"),
        }
    }

    #[test]
    fn slice_quantities_always_sum_to_original() {
        let mut position = buy_position();
        let mut closed_total = 0;

        for qty in [10, 25, 5] {
            let outcome = plan_close(
                &position,
                &BigDecimal::from(11),
                Some(qty),
                Utc::now(),
            )
            .unwrap();

            match outcome {
                CloseOutcome::Partial {
                    slice,
                    remaining_quantity,
                    quantity_closed,
                } => {
                    closed_total += slice.quantity;
                    position.quantity = remaining_quantity;
                    position.quantity_closed = quantity_closed;
                    position.status = String::from("PartiallyClosed");
                },
                CloseOutcome::Full { .. } => panic!("expected partial"),
            }
        }

        assert_eq!(closed_total + position.remaining_quantity(), 100);
        assert_eq!(position.quantity_closed, closed_total);
    }

    #[test]
    fn overclose_is_rejected() {
        let position = buy_position();
        let err = plan_close(
            &position,
            &BigDecimal::from(12),
            Some(101),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        let position = buy_position();
        for qty in [0, -5] {
            let err = plan_close(
                &position,
                &BigDecimal::from(12),
                Some(qty),
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn negative_close_price_is_rejected() {
        let position = buy_position();
        let err =
            plan_close(&position, &BigDecimal::from(-1), None, Utc::now())
                .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn closed_position_cannot_be_closed_again() {
        let mut position = buy_position();
        position.status = String::from("Closed");
        position.quantity_closed = 100;

        let err =
            plan_close(&position, &BigDecimal::from(12), None, Utc::now())
                .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
