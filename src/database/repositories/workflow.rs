use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{AbsenceRequest, ApprovalHistoryEntry, ApprovalStage, EscalationLogEntry, RequestStatus},
    store::{WorkflowStore, WorkflowTransaction},
    utils::sql,
};
use crate::error::AppError;

const REQUEST_COLUMNS: &str = r#"
    id,
    employee_id,
    request_type,
    start_date,
    end_date,
    total_days,
    hours_per_day,
    paid_days,
    unpaid_days,
    shift_id,
    reason,
    status,
    current_stage,
    last_action_at,
    payroll_cutoff_date,
    late_approval_flag,
    excluded_from_payroll,
    escalation_count,
    is_escalated,
    incidence_id,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct PgWorkflowStore {
    pool: PgPool,
}

impl PgWorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    async fn begin(&self) -> Result<Box<dyn WorkflowTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgWorkflowTransaction { tx }))
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<AbsenceRequest>, AppError> {
        let request = sqlx::query_as::<_, AbsenceRequest>(&sql(&format!(
            "SELECT {} FROM absence_requests WHERE id = ?",
            REQUEST_COLUMNS
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn list_history(&self, request_id: Uuid) -> Result<Vec<ApprovalHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, ApprovalHistoryEntry>(&sql(r#"
            SELECT
                id,
                request_id,
                approver_id,
                stage,
                action,
                comments,
                auto_approved,
                created_at
            FROM
                approval_history
            WHERE
                request_id = ?
            ORDER BY
                created_at ASC,
                seq ASC
        "#))
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn list_escalations(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<EscalationLogEntry>, AppError> {
        let entries = sqlx::query_as::<_, EscalationLogEntry>(&sql(r#"
            SELECT
                id,
                request_id,
                from_stage,
                to_stage,
                reason,
                created_at
            FROM
                escalation_log
            WHERE
                request_id = ?
            ORDER BY
                created_at ASC,
                seq ASC
        "#))
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn find_stale_requests(
        &self,
        idle_before: DateTime<Utc>,
    ) -> Result<Vec<AbsenceRequest>, AppError> {
        let requests = sqlx::query_as::<_, AbsenceRequest>(&sql(&format!(
            r#"
            SELECT {}
            FROM
                absence_requests
            WHERE
                status = ?
                AND current_stage <> ?
                AND current_stage <> ?
                AND last_action_at < ?
            ORDER BY
                last_action_at ASC
            "#,
            REQUEST_COLUMNS
        )))
        .bind(RequestStatus::Pending)
        .bind(ApprovalStage::Completed)
        .bind(ApprovalStage::Declined)
        .bind(idle_before)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}

pub struct PgWorkflowTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl WorkflowTransaction for PgWorkflowTransaction {
    async fn insert_request(&mut self, request: &AbsenceRequest) -> Result<(), AppError> {
        sqlx::query(&sql(&format!(
            r#"
            INSERT INTO
                absence_requests ({})
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            REQUEST_COLUMNS
        )))
        .bind(request.id)
        .bind(request.employee_id)
        .bind(request.request_type)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.total_days)
        .bind(&request.hours_per_day)
        .bind(&request.paid_days)
        .bind(&request.unpaid_days)
        .bind(request.shift_id)
        .bind(&request.reason)
        .bind(request.status)
        .bind(request.current_stage)
        .bind(request.last_action_at)
        .bind(request.payroll_cutoff_date)
        .bind(request.late_approval_flag)
        .bind(request.excluded_from_payroll)
        .bind(request.escalation_count)
        .bind(request.is_escalated)
        .bind(request.incidence_id)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn lock_request(&mut self, id: Uuid) -> Result<Option<AbsenceRequest>, AppError> {
        let request = sqlx::query_as::<_, AbsenceRequest>(&sql(&format!(
            "SELECT {} FROM absence_requests WHERE id = ? FOR UPDATE",
            REQUEST_COLUMNS
        )))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(request)
    }

    async fn update_request(&mut self, request: &AbsenceRequest) -> Result<(), AppError> {
        let result = sqlx::query(&sql(r#"
            UPDATE
                absence_requests
            SET
                status = ?,
                current_stage = ?,
                last_action_at = ?,
                payroll_cutoff_date = ?,
                late_approval_flag = ?,
                excluded_from_payroll = ?,
                escalation_count = ?,
                is_escalated = ?,
                incidence_id = ?,
                updated_at = ?
            WHERE
                id = ?
        "#))
        .bind(request.status)
        .bind(request.current_stage)
        .bind(request.last_action_at)
        .bind(request.payroll_cutoff_date)
        .bind(request.late_approval_flag)
        .bind(request.excluded_from_payroll)
        .bind(request.escalation_count)
        .bind(request.is_escalated)
        .bind(request.incidence_id)
        .bind(request.updated_at)
        .bind(request.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Absence request {} not found",
                request.id
            )));
        }

        Ok(())
    }

    async fn delete_request(&mut self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(&sql("DELETE FROM escalation_log WHERE request_id = ?"))
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query(&sql("DELETE FROM approval_history WHERE request_id = ?"))
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query(&sql("DELETE FROM absence_requests WHERE id = ?"))
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn append_history(&mut self, entry: &ApprovalHistoryEntry) -> Result<(), AppError> {
        sqlx::query(&sql(r#"
            INSERT INTO
                approval_history (
                    id,
                    request_id,
                    approver_id,
                    stage,
                    action,
                    comments,
                    auto_approved,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
        "#))
        .bind(entry.id)
        .bind(entry.request_id)
        .bind(entry.approver_id)
        .bind(entry.stage)
        .bind(entry.action)
        .bind(&entry.comments)
        .bind(entry.auto_approved)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn append_escalation(&mut self, entry: &EscalationLogEntry) -> Result<(), AppError> {
        sqlx::query(&sql(r#"
            INSERT INTO
                escalation_log (id, request_id, from_stage, to_stage, reason, created_at)
            VALUES
                (?, ?, ?, ?, ?, ?)
        "#))
        .bind(entry.id)
        .bind(entry.request_id)
        .bind(entry.from_stage)
        .bind(entry.to_stage)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
