use sqlx::{error::Error, Transaction};

use super::DataBase;
use crate::model::{Accounting_Report, Table};

impl Table<Accounting_Report> {
    pub async fn get_latest(
        &self,
    ) -> Result<Option<Accounting_Report>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "Accounting_Report"
            ORDER BY period_end DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self) -> Result<Vec<Accounting_Report>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM "Accounting_Report"
            ORDER BY period_end DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Reports are immutable once written. No update or delete exists.
    pub async fn insert(
        &self,
        data: Accounting_Report,
        transaction: &mut Transaction<'_, DataBase>,
    ) -> Result<Accounting_Report, Error> {
        sqlx::query_as(
            r#"
            INSERT INTO "Accounting_Report" (
                closed_at,
                period_start,
                period_end,
                monthly_count,
                monthly_total,
                quarterly_count,
                quarterly_total,
                yearly_count,
                yearly_total,
                gross,
                tax,
                net
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(data.closed_at)
        .bind(data.period_start)
        .bind(data.period_end)
        .bind(data.monthly_count)
        .bind(&data.monthly_total)
        .bind(data.quarterly_count)
        .bind(&data.quarterly_total)
        .bind(data.yearly_count)
        .bind(&data.yearly_total)
        .bind(&data.gross)
        .bind(&data.tax)
        .bind(&data.net)
        .fetch_one(&mut **transaction)
        .await
    }
}
