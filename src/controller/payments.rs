//! Payment confirmation webhook
//!
//! Inbound flow from the external payment provider. Authenticated by a
//! shared secret header. Records an unsettled subscription charge and
//! refreshes the user's subscription in one transaction.

use std::str::FromStr;

use actix_web::{post, web, HttpRequest, Responder};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::{
    configuration::{AppState, State},
    error::Error,
    types::Plan,
};

#[post("/payments/confirm")]
pub async fn confirm(
    state: web::Data<AppState<State>>,
    data: web::Json<PaymentConfirmation>,
    req: HttpRequest,
) -> Result<impl Responder, Error> {
    let token = req
        .headers()
        .get("x-webhook-token")
        .ok_or_else(|| Error::Unauthorized(String::from("missing webhook token")))?
        .to_str()?;

    if token != state.config.payment_webhook_token {
        return Err(Error::Unauthorized(String::from("invalid webhook token")));
    }

    let plan = Plan::from_str(&data.plan)?;

    if data.amount <= BigDecimal::from(0) {
        return Err(Error::Validation(String::from(
            "payment amount must be positive",
        )));
    }

    let user = state
        .database
        .user
        .get_one(data.user_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("user {} not found", data.user_id))
        })?;

    let duplicate = state
        .database
        .subscription_charge
        .reference_exists(data.payment_reference.to_owned())
        .await?;

    if duplicate {
        return Err(Error::Validation(format!(
            "payment {} was already processed",
            data.payment_reference
        )));
    }

    let now = Utc::now();
    let base = match user.subscription_expires_at {
        Some(current) if current > now => current,
        _ => now,
    };
    let expires_at = base + plan.period();

    let mut transaction = state.database.pool.begin().await?;

    let charge = state
        .database
        .subscription_charge
        .insert(
            user.id,
            plan.to_string(),
            data.amount.to_owned(),
            data.payment_reference.to_owned(),
            &mut transaction,
        )
        .await?;

    state
        .database
        .user
        .update_subscription(
            user.id,
            plan.to_string(),
            String::from("active"),
            expires_at,
            data.payment_reference.to_owned(),
            &mut transaction,
        )
        .await?;

    transaction.commit().await?;

    info!(
        "payment {} confirmed for user {}: {} plan until {}",
        charge.payment_reference, user.id, plan, expires_at
    );

    let s = state.get_ref().clone();
    tokio::spawn(async move {
        s.mailer
            .send(
                user.email,
                String::from("Subscription payment confirmed"),
                format!(
                    "Hello {}, your {} subscription is active until {}.",
                    user.name, plan, expires_at
                ),
            )
            .await;
    });

    Ok(web::Json(charge))
}

#[derive(Debug, Deserialize)]
pub struct PaymentConfirmation {
    pub user_id: i64,
    pub plan: String,
    pub amount: BigDecimal,
    pub payment_reference: String,
}
