//! Accounting endpoints, admin only.

use actix_web::{get, post, web, Responder};

use crate::{
    auth::Identity,
    configuration::{AppState, State},
    error::Error,
    handler::accounting,
};

#[post("/accounting/close-period")]
pub async fn close_period(
    state: web::Data<AppState<State>>,
    identity: Identity,
) -> Result<impl Responder, Error> {
    identity.require_admin()?;

    let report = accounting::close_period(&state).await?;

    Ok(web::Json(report))
}

#[get("/accounting/reports")]
pub async fn reports(
    state: web::Data<AppState<State>>,
    identity: Identity,
) -> Result<impl Responder, Error> {
    identity.require_admin()?;

    let reports = state.database.accounting_report.get_all().await?;

    Ok(web::Json(reports))
}
