use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: BigDecimal,
    pub hours_per_day: Option<BigDecimal>,
    pub paid_days: Option<BigDecimal>,
    pub unpaid_days: Option<BigDecimal>,
    pub shift_id: Option<Uuid>, // target shift for shift-change requests
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub current_stage: ApprovalStage,
    pub last_action_at: DateTime<Utc>,
    pub payroll_cutoff_date: Option<DateTime<Utc>>,
    pub late_approval_flag: bool,
    pub excluded_from_payroll: bool,
    pub escalation_count: i32,
    pub is_escalated: bool,
    pub incidence_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AbsenceRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Every calendar day covered by the request, inclusive
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= self.end_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAbsenceRequestInput {
    pub employee_id: Uuid,
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: BigDecimal,
    pub hours_per_day: Option<BigDecimal>,
    pub paid_days: Option<BigDecimal>,
    pub unpaid_days: Option<BigDecimal>,
    pub shift_id: Option<Uuid>,
    pub reason: Option<String>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestType {
        Vacation => "vacation",
        SickLeave => "sick_leave",
        PaidLeave => "paid_leave",
        UnpaidLeave => "unpaid_leave",
        LateEntry => "late_entry",
        EarlyExit => "early_exit",
        ShiftChange => "shift_change",
        TimeForTime => "time_for_time",
        Personal => "personal",
        Other => "other",
    }
}

impl RequestType {
    /// Types whose effect is measured in hours rather than whole days
    pub fn is_hourly(&self) -> bool {
        matches!(self, RequestType::LateEntry | RequestType::EarlyExit)
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestStatus {
        Pending => "pending",
        Approved => "approved",
        Declined => "declined",
        Archived => "archived",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum ApprovalStage {
        Supervisor => "supervisor",
        Manager => "manager",
        Hr => "hr",
        HrBlueGray => "hr_blue_gray",
        GeneralManager => "general_manager",
        Payroll => "payroll",
        Completed => "completed",
        Declined => "declined",
    }
}

impl ApprovalStage {
    /// Position along the fixed approval order. Both HR variants share a slot.
    pub fn rank(&self) -> u8 {
        match self {
            ApprovalStage::Supervisor => 0,
            ApprovalStage::Manager => 1,
            ApprovalStage::Hr | ApprovalStage::HrBlueGray => 2,
            ApprovalStage::GeneralManager => 3,
            ApprovalStage::Payroll => 4,
            ApprovalStage::Completed | ApprovalStage::Declined => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalStage::Completed | ApprovalStage::Declined)
    }

    pub fn is_hr(&self) -> bool {
        matches!(self, ApprovalStage::Hr | ApprovalStage::HrBlueGray)
    }
}
