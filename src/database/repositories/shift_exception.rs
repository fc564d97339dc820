use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{models::ShiftException, utils::sql};
use crate::error::AppError;
use crate::services::ports::ShiftExceptionSink;

#[derive(Clone)]
pub struct PgShiftExceptionSink {
    pool: PgPool,
}

impl PgShiftExceptionSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ShiftException>, AppError> {
        let exception = sqlx::query_as::<_, ShiftException>(&sql(r#"
            SELECT
                id,
                employee_id,
                date,
                shift_id,
                created_by,
                created_at,
                updated_at
            FROM
                shift_exceptions
            WHERE
                employee_id = ?
                AND date = ?
        "#))
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exception)
    }
}

#[async_trait]
impl ShiftExceptionSink for PgShiftExceptionSink {
    async fn upsert(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
        shift_id: Uuid,
        created_by: Uuid,
    ) -> Result<(), AppError> {
        let now = Utc::now();

        if let Some(existing) = self.find(employee_id, date).await? {
            sqlx::query(&sql(r#"
                UPDATE
                    shift_exceptions
                SET
                    shift_id = ?,
                    updated_at = ?
                WHERE
                    id = ?
            "#))
            .bind(shift_id)
            .bind(now)
            .bind(existing.id)
            .execute(&self.pool)
            .await?;

            return Ok(());
        }

        sqlx::query(&sql(r#"
            INSERT INTO
                shift_exceptions (id, employee_id, date, shift_id, created_by, created_at, updated_at)
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
        "#))
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(date)
        .bind(shift_id)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
