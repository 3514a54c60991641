//! Registration, login and password reset.

use actix_web::{post, web, HttpResponse, Responder};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::{generate_salt, hash_password, issue_token, verify_password},
    configuration::{AppState, State},
    error::Error,
    model::User,
    types::Role,
};

#[post("/auth/register")]
pub async fn register(
    state: web::Data<AppState<State>>,
    data: web::Json<RegisterRequest>,
) -> Result<impl Responder, Error> {
    let name = data.name.trim();
    let email = data.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(Error::Validation(String::from("name is required")));
    }

    if !email.contains('@') {
        return Err(Error::Validation(String::from("invalid email")));
    }

    if data.password.len() < 8 {
        return Err(Error::Validation(String::from(
            "password must be at least 8 characters",
        )));
    }

    if state.database.user.email_exists(email.to_owned()).await? {
        return Err(Error::Validation(String::from(
            "email is already registered",
        )));
    }

    let salt = generate_salt();
    let hash = hash_password(&data.password, &salt);

    let user = state
        .database
        .user
        .insert(
            name.to_owned(),
            email,
            hash,
            salt,
            Role::User.to_string(),
        )
        .await?;

    info!("user {} registered", user.id);

    let token = issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    Ok(web::Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState<State>>,
    data: web::Json<LoginRequest>,
) -> Result<impl Responder, Error> {
    let email = data.email.trim().to_lowercase();

    let user = state
        .database
        .user
        .get_by_email(email)
        .await?
        .ok_or_else(|| {
            Error::Unauthorized(String::from("invalid email or password"))
        })?;

    if !verify_password(&data.password, &user) {
        return Err(Error::Unauthorized(String::from(
            "invalid email or password",
        )));
    }

    let token = issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    Ok(web::Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Always answers 200 so the endpoint does not leak which emails exist.
/// The notification itself is fire-and-forget.
#[post("/auth/password-reset")]
pub async fn password_reset(
    state: web::Data<AppState<State>>,
    data: web::Json<PasswordResetRequest>,
) -> Result<impl Responder, Error> {
    let email = data.email.trim().to_lowercase();

    if let Some(user) = state.database.user.get_by_email(email).await? {
        let s = state.get_ref().clone();
        tokio::spawn(async move {
            s.mailer
                .send(
                    user.email,
                    String::from("Password reset"),
                    format!(
                        "Hello {}, a password reset was requested for your account.",
                        user.name
                    ),
                )
                .await;
        });
    }

    Ok(HttpResponse::Ok().json(PasswordResetResponse { result: true }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordResetResponse {
    pub result: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// User projection without credential fields.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub margin_limit: BigDecimal,
    pub margin_used: BigDecimal,
    pub plan: Option<String>,
    pub subscription_status: String,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> UserResponse {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            margin_limit: user.margin_limit,
            margin_used: user.margin_used,
            plan: user.plan,
            subscription_status: user.subscription_status,
            subscription_expires_at: user.subscription_expires_at,
            created_at: user.created_at,
        }
    }
}
