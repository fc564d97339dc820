use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Employee => "employee",
        Supervisor => "supervisor",
        SupervisorGm => "supervisor_gm",
        Manager => "manager",
        Hr => "hr",
        HrPayroll => "hr_payroll",
        HrBlueGraySpecialist => "hr_blue_gray_specialist",
        Payroll => "payroll",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum WorkerCategory {
        WhiteCollar => "white_collar",
        BlueCollar => "blue_collar",
        GrayCollar => "gray_collar",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub category: WorkerCategory,
    pub union_member: bool,
}

impl Classification {
    pub fn new(category: WorkerCategory, union_member: bool) -> Self {
        Self {
            category,
            union_member,
        }
    }

    /// Blue collar, gray collar or unionized workers go through the dedicated HR desk
    pub fn is_blue_gray(&self) -> bool {
        self.union_member || self.category != WorkerCategory::WhiteCollar
    }
}

/// Read-only employee view served by the directory
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub id: Uuid,
    pub full_name: String,
    pub category: WorkerCategory,
    pub union_member: bool,
    pub supervisor_id: Option<Uuid>,
    pub general_manager_id: Option<Uuid>,
    pub payroll_id: Option<String>,
    pub daily_salary: BigDecimal,
}

impl EmployeeProfile {
    pub fn classification(&self) -> Classification {
        Classification::new(self.category, self.union_member)
    }
}
