//! Margin endpoints
//!
//! GET recomputes and returns the utilization breakdown. POST applies one
//! of the four limit mutations (deposit, withdraw, adjust, initial-setup),
//! always recomputing utilization first.

use std::str::FromStr;

use actix_web::{get, post, web, Responder};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::Identity,
    configuration::{AppState, State},
    error::Error,
    handler::margin::{
        apply_margin_op, breakdown, MarginState, PositionContribution,
    },
    types::MarginOpKind,
};

#[get("/margin")]
pub async fn get_index(
    state: web::Data<AppState<State>>,
    identity: Identity,
) -> Result<impl Responder, Error> {
    let user = state
        .database
        .user
        .get_one(identity.id)
        .await?
        .ok_or_else(|| Error::NotFound(String::from("user not found")))?;

    let (margin, positions) = breakdown(&state, &user).await?;

    Ok(web::Json(MarginResponse { margin, positions }))
}

#[post("/margin")]
pub async fn post_index(
    state: web::Data<AppState<State>>,
    identity: Identity,
    data: web::Json<MarginOpRequest>,
) -> Result<impl Responder, Error> {
    let kind = MarginOpKind::from_str(&data.kind)?;

    let user = state
        .database
        .user
        .get_one(identity.id)
        .await?
        .ok_or_else(|| Error::NotFound(String::from("user not found")))?;

    let margin = apply_margin_op(&state, &user, kind, &data.amount).await?;

    info!(
        "margin {} of {} applied for user {}",
        kind, data.amount, identity.id
    );

    Ok(web::Json(margin))
}

#[derive(Debug, Deserialize)]
pub struct MarginOpRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct MarginResponse {
    #[serde(flatten)]
    pub margin: MarginState,
    pub positions: Vec<PositionContribution>,
}
