use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::models::{AbsenceRequest, ApprovalHistoryEntry, EscalationLogEntry};
use crate::error::AppError;

/// Storage for the rows the workflow owns: requests, approval history and escalation log.
///
/// Reads go straight through the store; every mutation happens inside a
/// [`WorkflowTransaction`] obtained from [`WorkflowStore::begin`].
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn WorkflowTransaction>, AppError>;

    async fn find_request(&self, id: Uuid) -> Result<Option<AbsenceRequest>, AppError>;

    /// Approval history for a request, oldest first
    async fn list_history(&self, request_id: Uuid) -> Result<Vec<ApprovalHistoryEntry>, AppError>;

    /// Escalation log for a request, oldest first
    async fn list_escalations(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<EscalationLogEntry>, AppError>;

    /// Pending, non-terminal requests whose last action is older than `idle_before`
    async fn find_stale_requests(
        &self,
        idle_before: DateTime<Utc>,
    ) -> Result<Vec<AbsenceRequest>, AppError>;
}

/// One all-or-nothing unit of work. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait WorkflowTransaction: Send {
    async fn insert_request(&mut self, request: &AbsenceRequest) -> Result<(), AppError>;

    /// Load a request and hold its row lock until the transaction ends
    async fn lock_request(&mut self, id: Uuid) -> Result<Option<AbsenceRequest>, AppError>;

    async fn update_request(&mut self, request: &AbsenceRequest) -> Result<(), AppError>;

    async fn delete_request(&mut self, id: Uuid) -> Result<(), AppError>;

    async fn append_history(&mut self, entry: &ApprovalHistoryEntry) -> Result<(), AppError>;

    async fn append_escalation(&mut self, entry: &EscalationLogEntry) -> Result<(), AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}
