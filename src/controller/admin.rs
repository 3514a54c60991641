//! Admin user management
//!
//! Admin accounts are protected: their role cannot be changed and they
//! cannot be deleted through these endpoints.

use std::str::FromStr;

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::Identity,
    configuration::{AppState, State},
    controller::auth::UserResponse,
    error::Error,
    types::Role,
};

fn parse_id(raw: &str) -> Result<i64, Error> {
    raw.parse::<i64>()
        .map_err(|_| Error::Validation(format!("invalid user id: {}", raw)))
}

/// Admin accounts are immutable through these endpoints.
fn ensure_mutable(role: &str) -> Result<(), Error> {
    if Role::from_str(role)? == Role::Admin {
        return Err(Error::Forbidden(String::from(
            "admin accounts cannot be modified",
        )));
    }

    Ok(())
}

#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<AppState<State>>,
    identity: Identity,
) -> Result<impl Responder, Error> {
    identity.require_admin()?;

    let users = state.database.user.get_all().await?;
    let users: Vec<UserResponse> =
        users.into_iter().map(UserResponse::from).collect();

    Ok(web::Json(users))
}

#[post("/admin/users/{id}/role")]
pub async fn change_role(
    state: web::Data<AppState<State>>,
    identity: Identity,
    path: web::Path<String>,
    data: web::Json<ChangeRoleRequest>,
) -> Result<impl Responder, Error> {
    identity.require_admin()?;

    let id = parse_id(&path)?;
    let role = Role::from_str(&data.role)?;

    let user = state
        .database
        .user
        .get_one(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {} not found", id)))?;

    ensure_mutable(&user.role)?;

    state.database.user.update_role(id, role.to_string()).await?;

    info!("user {} role changed to {}", id, role);

    let user = state
        .database
        .user
        .get_one(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {} not found", id)))?;

    Ok(web::Json(UserResponse::from(user)))
}

#[delete("/admin/users/{id}")]
pub async fn remove_user(
    state: web::Data<AppState<State>>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    identity.require_admin()?;

    let id = parse_id(&path)?;

    let user = state
        .database
        .user
        .get_one(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {} not found", id)))?;

    ensure_mutable(&user.role)?;

    let mut transaction = state.database.pool.begin().await?;

    state
        .database
        .position
        .delete_by_user(id, &mut transaction)
        .await?;
    state.database.user.delete(id, &mut transaction).await?;

    transaction.commit().await?;

    info!("user {} deleted with positions cascade", id);

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_accounts_are_protected() {
        let err = ensure_mutable("admin").unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn regular_roles_are_mutable() {
        assert!(ensure_mutable("user").is_ok());
        assert!(ensure_mutable("model").is_ok());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = ensure_mutable("root").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
