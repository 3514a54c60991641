use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{error::Error, Transaction};

use super::DataBase;
use crate::model::{Table, User};

impl Table<User> {
    pub async fn get_one(&self, id: i64) -> Result<Option<User>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "User" WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_by_email(
        &self,
        email: String,
    ) -> Result<Option<User>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "User" WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self) -> Result<Vec<User>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "User" ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn email_exists(
        &self,
        email: String,
    ) -> Result<bool, crate::error::Error> {
        let (value,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM "User" WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(value > 0)
    }

    pub async fn insert(
        &self,
        name: String,
        email: String,
        password_hash: String,
        password_salt: String,
        role: String,
    ) -> Result<User, Error> {
        sqlx::query_as(
            r#"
            INSERT INTO "User" (
                name,
                email,
                password_hash,
                password_salt,
                role,
                margin_limit,
                margin_used,
                subscription_status,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, 0, 0, 'none', $6)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(password_salt)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    /// Persists the recomputed utilization. The column is a denormalized
    /// hint; reads recompute from positions.
    pub async fn update_margin_used(
        &self,
        id: i64,
        margin_used: BigDecimal,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE "User" SET margin_used = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(margin_used)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn update_margin_limit(
        &self,
        id: i64,
        margin_limit: BigDecimal,
        margin_used: BigDecimal,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE "User" SET margin_limit = $2, margin_used = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(margin_limit)
        .bind(margin_used)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn update_role(
        &self,
        id: i64,
        role: String,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE "User" SET role = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn update_subscription(
        &self,
        id: i64,
        plan: String,
        subscription_status: String,
        expires_at: DateTime<Utc>,
        payment_reference: String,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE "User" SET
                plan = $2,
                subscription_status = $3,
                subscription_expires_at = $4,
                last_payment_reference = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(plan)
        .bind(subscription_status)
        .bind(expires_at)
        .bind(payment_reference)
        .execute(&mut **transaction)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(
        &self,
        id: i64,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM "User" WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut **transaction)
        .await?;

        Ok(result.rows_affected())
    }
}
