use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::database::models::{EmployeeProfile, IncidenceDraft, Role};
use crate::error::AppError;

/// Read-only access to organization master data
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn get_employee(&self, id: Uuid) -> Result<Option<EmployeeProfile>, AppError>;

    async fn get_user_role(&self, user_id: Uuid) -> Result<Option<Role>, AppError>;

    async fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<Uuid>, AppError>;
}

/// Bell notifications and inbox messages. Callers treat every failure as non-fatal.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: Uuid, request_id: Uuid, message: &str)
    -> Result<(), AppError>;

    async fn send_message(&self, user_id: Uuid, subject: &str, body: &str)
    -> Result<(), AppError>;
}

/// Downstream payroll artifacts linked to a request
#[async_trait]
pub trait IncidenceSink: Send + Sync {
    async fn create_placeholder(&self, draft: &IncidenceDraft) -> Result<Uuid, AppError>;

    async fn finalize(
        &self,
        incidence_id: Uuid,
        amount: &BigDecimal,
        late_approval: bool,
        excluded_from_payroll: bool,
    ) -> Result<(), AppError>;

    async fn update_flags(
        &self,
        incidence_id: Uuid,
        late_approval: bool,
        excluded_from_payroll: bool,
    ) -> Result<(), AppError>;

    async fn discard(&self, incidence_id: Uuid) -> Result<(), AppError>;
}

/// Per-day shift overrides produced by approved shift changes
#[async_trait]
pub trait ShiftExceptionSink: Send + Sync {
    /// Create the exception for `employee_id` on `date`, or update the existing one in place
    async fn upsert(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
        shift_id: Uuid,
        created_by: Uuid,
    ) -> Result<(), AppError>;
}
