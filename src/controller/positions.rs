//! Position endpoints: create, list, fetch, close, delete.

use std::str::FromStr;

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::Identity,
    configuration::{AppState, State},
    error::Error,
    handler::{margin, position_close},
    helpers::generate_visual_id,
    types::{Direction, OptionType, PositionStatus},
};

fn parse_id(raw: &str) -> Result<i64, Error> {
    raw.parse::<i64>()
        .map_err(|_| Error::Validation(format!("invalid position id: {}", raw)))
}

#[post("/positions")]
pub async fn create(
    state: web::Data<AppState<State>>,
    identity: Identity,
    data: web::Json<CreatePositionRequest>,
) -> Result<impl Responder, Error> {
    let option_type = OptionType::from_str(&data.option_type)?;
    let direction = Direction::from_str(&data.direction)?;
    let zero = BigDecimal::from(0);

    if data.ticker.trim().is_empty() {
        return Err(Error::Validation(String::from("ticker is required")));
    }

    if data.quantity <= 0 {
        return Err(Error::Validation(String::from(
            "quantity must be positive",
        )));
    }

    if data.strike < zero || data.entry_price < zero {
        return Err(Error::Validation(String::from(
            "prices must be non-negative",
        )));
    }

    let margin_amount = data.margin.to_owned().unwrap_or_else(|| zero.clone());
    if margin_amount < zero {
        return Err(Error::Validation(String::from(
            "margin must be non-negative",
        )));
    }

    let position = state
        .database
        .position
        .insert_open(
            generate_visual_id(),
            data.ticker.trim().to_uppercase(),
            option_type.to_string(),
            direction.to_string(),
            data.strike.to_owned(),
            data.entry_price.to_owned(),
            data.quantity,
            margin_amount,
            identity.id,
        )
        .await?;

    margin::recompute(&state, identity.id).await?;

    info!("position {} opened by user {}", position.visual_id, identity.id);

    Ok(web::Json(position))
}

#[get("/positions")]
pub async fn list(
    state: web::Data<AppState<State>>,
    identity: Identity,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, Error> {
    let status = match &query.status {
        Some(raw) => Some(PositionStatus::from_str(raw)?.to_string()),
        None => None,
    };

    let positions = state
        .database
        .position
        .get_by_user(identity.id, status)
        .await?;

    Ok(web::Json(positions))
}

#[get("/positions/{id}")]
pub async fn get_one(
    state: web::Data<AppState<State>>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    let id = parse_id(&path)?;

    let position = state
        .database
        .position
        .get_one(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("position {} not found", id)))?;

    if position.user_id != identity.id && !identity.is_admin() {
        return Err(Error::Forbidden(String::from(
            "position belongs to another user",
        )));
    }

    Ok(web::Json(position))
}

#[post("/positions/{id}/close")]
pub async fn close(
    state: web::Data<AppState<State>>,
    identity: Identity,
    path: web::Path<String>,
    data: web::Json<CloseRequest>,
) -> Result<impl Responder, Error> {
    let id = parse_id(&path)?;

    let response = position_close::close_position(
        &state,
        &identity,
        id,
        data.close_price.to_owned(),
        data.quantity,
    )
    .await?;

    Ok(web::Json(response))
}

#[delete("/positions/{id}")]
pub async fn remove(
    state: web::Data<AppState<State>>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    let id = parse_id(&path)?;

    let position = state
        .database
        .position
        .get_one(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("position {} not found", id)))?;

    if position.user_id != identity.id && !identity.is_admin() {
        return Err(Error::Forbidden(String::from(
            "position belongs to another user",
        )));
    }

    state.database.position.delete(id).await?;
    margin::recompute(&state, position.user_id).await?;

    info!("position {} deleted", position.visual_id);

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct CreatePositionRequest {
    pub ticker: String,
    pub option_type: String,
    pub direction: String,
    pub strike: BigDecimal,
    pub entry_price: BigDecimal,
    pub quantity: i32,
    pub margin: Option<BigDecimal>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseRequest {
    pub close_price: BigDecimal,
    pub quantity: Option<i32>,
}
