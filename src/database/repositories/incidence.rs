use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{IncidenceDraft, IncidenceStatus},
    utils::sql,
};
use crate::error::AppError;
use crate::services::ports::IncidenceSink;

#[derive(Clone)]
pub struct PgIncidenceSink {
    pool: PgPool,
}

impl PgIncidenceSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidenceSink for PgIncidenceSink {
    async fn create_placeholder(&self, draft: &IncidenceDraft) -> Result<Uuid, AppError> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, Uuid>(&sql(r#"
            INSERT INTO
                payroll_incidences (
                    id,
                    request_id,
                    employee_id,
                    payroll_id,
                    request_type,
                    start_date,
                    end_date,
                    total_days,
                    paid_days,
                    unpaid_days,
                    status,
                    late_approval,
                    excluded_from_payroll,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, FALSE, ?, ?)
            RETURNING
                id
        "#))
        .bind(Uuid::new_v4())
        .bind(draft.request_id)
        .bind(draft.employee_id)
        .bind(&draft.payroll_id)
        .bind(draft.request_type)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.total_days)
        .bind(&draft.paid_days)
        .bind(&draft.unpaid_days)
        .bind(IncidenceStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn finalize(
        &self,
        incidence_id: Uuid,
        amount: &BigDecimal,
        late_approval: bool,
        excluded_from_payroll: bool,
    ) -> Result<(), AppError> {
        let result = sqlx::query(&sql(r#"
            UPDATE
                payroll_incidences
            SET
                amount = ?,
                status = ?,
                late_approval = ?,
                excluded_from_payroll = ?,
                updated_at = ?
            WHERE
                id = ?
        "#))
        .bind(amount)
        .bind(IncidenceStatus::Finalized)
        .bind(late_approval)
        .bind(excluded_from_payroll)
        .bind(Utc::now())
        .bind(incidence_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ExternalService(format!(
                "Incidence {} does not exist",
                incidence_id
            )));
        }

        Ok(())
    }

    async fn update_flags(
        &self,
        incidence_id: Uuid,
        late_approval: bool,
        excluded_from_payroll: bool,
    ) -> Result<(), AppError> {
        sqlx::query(&sql(r#"
            UPDATE
                payroll_incidences
            SET
                late_approval = ?,
                excluded_from_payroll = ?,
                updated_at = ?
            WHERE
                id = ?
        "#))
        .bind(late_approval)
        .bind(excluded_from_payroll)
        .bind(Utc::now())
        .bind(incidence_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn discard(&self, incidence_id: Uuid) -> Result<(), AppError> {
        sqlx::query(&sql("DELETE FROM payroll_incidences WHERE id = ? AND status = ?"))
            .bind(incidence_id)
            .bind(IncidenceStatus::Pending)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
