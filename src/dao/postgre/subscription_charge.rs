use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::{error::Error, Transaction};

use super::DataBase;
use crate::model::{Subscription_Charge, Table};

impl Table<Subscription_Charge> {
    pub async fn insert(
        &self,
        user_id: i64,
        plan: String,
        amount: BigDecimal,
        payment_reference: String,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<Subscription_Charge, Error> {
        sqlx::query_as(
            r#"
            INSERT INTO "Subscription_Charge" (
                user_id,
                plan,
                amount,
                payment_reference,
                created_at,
                settled
            )
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(plan)
        .bind(amount)
        .bind(payment_reference)
        .bind(Utc::now())
        .fetch_one(&mut **transaction)
        .await
    }

    pub async fn reference_exists(
        &self,
        payment_reference: String,
    ) -> Result<bool, crate::error::Error> {
        let (value,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM "Subscription_Charge"
            WHERE payment_reference = $1
            "#,
        )
        .bind(payment_reference)
        .fetch_one(&self.pool)
        .await?;

        Ok(value > 0)
    }

    /// Charges not yet included in a closed accounting period.
    pub async fn get_pending(
        &self,
    ) -> Result<Vec<Subscription_Charge>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "Subscription_Charge"
            WHERE settled = FALSE
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn mark_settled(
        &self,
        ids: Vec<i64>,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE "Subscription_Charge" SET settled = TRUE
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .execute(&mut **transaction)
        .await?;

        Ok(result.rows_affected())
    }
}
