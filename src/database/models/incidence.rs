use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::absence::{AbsenceRequest, RequestType};
use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum IncidenceStatus {
        Pending => "pending",
        Finalized => "finalized",
    }
}

/// Data needed to open a placeholder incidence for a fresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidenceDraft {
    pub request_id: Uuid,
    pub employee_id: Uuid,
    pub payroll_id: String,
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: BigDecimal,
    pub paid_days: Option<BigDecimal>,
    pub unpaid_days: Option<BigDecimal>,
}

impl IncidenceDraft {
    pub fn for_request(request: &AbsenceRequest, payroll_id: &str) -> Self {
        Self {
            request_id: request.id,
            employee_id: request.employee_id,
            payroll_id: payroll_id.to_string(),
            request_type: request.request_type,
            start_date: request.start_date,
            end_date: request.end_date,
            total_days: request.total_days.clone(),
            paid_days: request.paid_days.clone(),
            unpaid_days: request.unpaid_days.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PayrollIncidence {
    pub id: Uuid,
    pub request_id: Uuid,
    pub employee_id: Uuid,
    pub payroll_id: String,
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: BigDecimal,
    pub amount: Option<BigDecimal>,
    pub status: IncidenceStatus,
    pub late_approval: bool,
    pub excluded_from_payroll: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShiftException {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub shift_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
