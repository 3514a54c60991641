//! Authentication
//!
//! JWT issue/verify, salted password digests and the `Identity` extractor
//! every protected route receives. Handlers trust the verified claims for
//! ownership and role checks.

use std::future::{ready, Ready};
use std::str::FromStr;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    configuration::{AppState, State},
    error::Error,
    model::User,
    types::{Claims, Role},
};

pub fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    sha256::digest(format!("{}{}", salt, password))
}

pub fn verify_password(password: &str, user: &User) -> bool {
    hash_password(password, &user.password_salt) == user.password_hash
}

pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, Error> {
    let claims = Claims {
        sub: user.id,
        email: user.email.to_owned(),
        role: user.role.to_owned(),
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| Error::Unauthorized(String::from("invalid token")))?;

    Ok(data.claims)
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), Error> {
        if self.is_admin() {
            return Ok(());
        }

        Err(Error::Forbidden(String::from("admin role required")))
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Identity, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from_request(req))
    }
}

fn identity_from_request(req: &HttpRequest) -> Result<Identity, Error> {
    let state = req
        .app_data::<web::Data<AppState<State>>>()
        .ok_or_else(|| Error::ServerError(String::from("missing app state")))?;

    let header = req
        .headers()
        .get("authorization")
        .ok_or_else(|| Error::Unauthorized(String::from("not authenticated")))?
        .to_str()?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized(String::from("not authenticated")))?;

    let claims = verify_token(token, &state.config.jwt_secret)?;
    let role = Role::from_str(&claims.role)
        .map_err(|_| Error::Unauthorized(String::from("invalid token")))?;

    Ok(Identity {
        id: claims.sub,
        email: claims.email,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn user() -> User {
        let salt = generate_salt();
        User {
            id: 7,
            name: String::from("Ana"),
            email: String::from("ana@example.com"),
            password_hash: hash_password("s3cret", &salt),
            password_salt: salt,
            role: String::from("user"),
            margin_limit: BigDecimal::from(0),
            margin_used: BigDecimal::from(0),
            plan: None,
            subscription_status: String::from("none"),
            subscription_expires_at: None,
            last_payment_reference: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_round_trip() {
        let user = user();
        assert!(verify_password("s3cret", &user));
        assert!(!verify_password("wrong", &user));
    }

    #[test]
    fn token_round_trip() {
        let user = user();
        let token = issue_token(&user, "test-secret", 12).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let user = user();
        let token = issue_token(&user, "test-secret", 12).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
