use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{error::Error, Transaction};

use super::DataBase;
use crate::model::{New_Position_Slice, Position, Table};

impl Table<Position> {
    pub async fn get_one(&self, id: i64) -> Result<Option<Position>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "Position" WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_by_user(
        &self,
        user_id: i64,
        status: Option<String>,
    ) -> Result<Vec<Position>, Error> {
        match status {
            Some(status) => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM "Position"
                    WHERE user_id = $1 AND status = $2
                    ORDER BY open_date DESC, id DESC
                    "#,
                )
                .bind(user_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await
            },
            None => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM "Position"
                    WHERE user_id = $1
                    ORDER BY open_date DESC, id DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            },
        }
    }

    /// Positions still counting toward margin utilization.
    pub async fn get_open_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Position>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "Position"
            WHERE user_id = $1 AND status IN ('Open', 'PartiallyClosed')
            ORDER BY open_date DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn insert_open(
        &self,
        visual_id: String,
        ticker: String,
        option_type: String,
        direction: String,
        strike: BigDecimal,
        entry_price: BigDecimal,
        quantity: i32,
        margin: BigDecimal,
        user_id: i64,
    ) -> Result<Position, Error> {
        sqlx::query_as(
            r#"
            INSERT INTO "Position" (
                visual_id,
                ticker,
                option_type,
                direction,
                strike,
                entry_price,
                quantity,
                quantity_closed,
                status,
                open_date,
                margin,
                user_id,
                child_ids
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, 'Open', $8, $9, $10, '{}')
            RETURNING *
            "#,
        )
        .bind(visual_id)
        .bind(ticker)
        .bind(option_type)
        .bind(direction)
        .bind(strike)
        .bind(entry_price)
        .bind(quantity)
        .bind(Utc::now())
        .bind(margin)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Inserts the closed slice split off by a partial close.
    pub async fn insert_slice(
        &self,
        visual_id: String,
        data: New_Position_Slice,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<Position, Error> {
        sqlx::query_as(
            r#"
            INSERT INTO "Position" (
                visual_id,
                ticker,
                option_type,
                direction,
                strike,
                entry_price,
                quantity,
                quantity_closed,
                status,
                open_date,
                close_date,
                close_price,
                open_value,
                close_value,
                result,
                margin,
                user_id,
                parent_id,
                child_ids
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $7, 'Closed',
                $8, $9, $10, $11, $12, $13, $14, $15, $16, '{}'
            )
            RETURNING *
            "#,
        )
        .bind(visual_id)
        .bind(&data.ticker)
        .bind(&data.option_type)
        .bind(&data.direction)
        .bind(&data.strike)
        .bind(&data.entry_price)
        .bind(data.quantity)
        .bind(data.open_date)
        .bind(data.close_date)
        .bind(&data.close_price)
        .bind(&data.open_value)
        .bind(&data.close_value)
        .bind(&data.result)
        .bind(&data.margin)
        .bind(data.user_id)
        .bind(data.parent_id)
        .fetch_one(&mut **transaction)
        .await
    }

    /// Reduces the original record after a partial close and links the
    /// split-off slice.
    pub async fn apply_partial_close(
        &self,
        id: i64,
        quantity: i32,
        quantity_closed: i32,
        child_id: i64,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<Position, Error> {
        sqlx::query_as(
            r#"
            UPDATE "Position" SET
                quantity = $2,
                quantity_closed = $3,
                status = 'PartiallyClosed',
                child_ids = array_append(child_ids, $4)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(quantity_closed)
        .bind(child_id)
        .fetch_one(&mut **transaction)
        .await
    }

    pub async fn apply_full_close(
        &self,
        id: i64,
        close_date: DateTime<Utc>,
        close_price: BigDecimal,
        open_value: BigDecimal,
        close_value: BigDecimal,
        result: BigDecimal,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<Position, Error> {
        sqlx::query_as(
            r#"
            UPDATE "Position" SET
                status = 'Closed',
                quantity = quantity + quantity_closed,
                quantity_closed = quantity + quantity_closed,
                close_date = $2,
                close_price = $3,
                open_value = $4,
                close_value = $5,
                result = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(close_date)
        .bind(close_price)
        .bind(open_value)
        .bind(close_value)
        .bind(result)
        .fetch_one(&mut **transaction)
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM "Position" WHERE id = $1 OR parent_id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_by_user(
        &self,
        user_id: i64,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM "Position" WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut **transaction)
        .await?;

        Ok(result.rows_affected())
    }
}
