#![allow(dead_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::America::Mexico_City;
use fake::{Fake, faker::name::en::Name};
use uuid::Uuid;

use leaveflow::database::models::{
    AbsenceRequest, ApprovalAction, ApprovalStage, CreateAbsenceRequestInput, EmployeeProfile,
    RequestType, Role, WorkerCategory,
};
use leaveflow::database::repositories::{
    InMemoryEmployeeDirectory, InMemoryIncidenceSink, InMemoryNotificationSink,
    InMemoryShiftExceptionSink, InMemoryWorkflowStore,
};
use leaveflow::{AppError, EscalationScheduler, EscalationSettings, WorkflowEngine, WorkflowPorts};

/// People holding each approver role in the test organization
#[derive(Debug, Clone, Copy)]
pub struct Org {
    pub supervisor: Uuid,
    pub general_manager: Uuid,
    pub hr: Uuid,
    pub hr_blue_gray: Uuid,
    pub hr_payroll: Uuid,
    pub payroll: Uuid,
}

/// Engine and scheduler wired to in-memory adapters the test can inspect
pub struct TestHarness {
    pub store: Arc<InMemoryWorkflowStore>,
    pub directory: Arc<InMemoryEmployeeDirectory>,
    pub notifications: Arc<InMemoryNotificationSink>,
    pub incidences: Arc<InMemoryIncidenceSink>,
    pub shift_exceptions: Arc<InMemoryShiftExceptionSink>,
    pub engine: WorkflowEngine,
    pub scheduler: EscalationScheduler,
    pub org: Org,
}

impl TestHarness {
    pub async fn new() -> Self {
        setup_test_env();

        let store = Arc::new(InMemoryWorkflowStore::new());
        let directory = Arc::new(InMemoryEmployeeDirectory::new());
        let notifications = Arc::new(InMemoryNotificationSink::new());
        let incidences = Arc::new(InMemoryIncidenceSink::new());
        let shift_exceptions = Arc::new(InMemoryShiftExceptionSink::new());

        let ports = WorkflowPorts {
            store: store.clone(),
            directory: directory.clone(),
            notifications: notifications.clone(),
            incidences: incidences.clone(),
            shift_exceptions: shift_exceptions.clone(),
        };

        let org = Org {
            supervisor: Uuid::new_v4(),
            general_manager: Uuid::new_v4(),
            hr: Uuid::new_v4(),
            hr_blue_gray: Uuid::new_v4(),
            hr_payroll: Uuid::new_v4(),
            payroll: Uuid::new_v4(),
        };
        for (user, role) in [
            (org.supervisor, Role::Supervisor),
            (org.general_manager, Role::Manager),
            (org.hr, Role::Hr),
            (org.hr_blue_gray, Role::HrBlueGraySpecialist),
            (org.hr_payroll, Role::HrPayroll),
            (org.payroll, Role::Payroll),
        ] {
            directory.set_role(user, role).await;
        }

        let engine = WorkflowEngine::new(ports.clone(), Mexico_City);
        let scheduler = EscalationScheduler::new(
            ports,
            EscalationSettings {
                interval_secs: 3600,
                idle_threshold: Duration::hours(24),
            },
        );

        Self {
            store,
            directory,
            notifications,
            incidences,
            shift_exceptions,
            engine,
            scheduler,
            org,
        }
    }

    /// Register an employee reporting to the org's supervisor and general manager
    pub async fn employee(&self, category: WorkerCategory, union_member: bool) -> EmployeeProfile {
        let employee = EmployeeProfile {
            id: Uuid::new_v4(),
            full_name: Name().fake(),
            category,
            union_member,
            supervisor_id: Some(self.org.supervisor),
            general_manager_id: Some(self.org.general_manager),
            payroll_id: Some(format!("PR-{}", (1000..9999).fake::<u32>())),
            daily_salary: dec("500"),
        };
        self.directory.add_employee(employee.clone()).await;
        employee
    }

    pub async fn white_collar(&self) -> EmployeeProfile {
        self.employee(WorkerCategory::WhiteCollar, false).await
    }

    pub async fn blue_collar(&self) -> EmployeeProfile {
        self.employee(WorkerCategory::BlueCollar, false).await
    }

    pub async fn submit(&self, employee: &EmployeeProfile) -> AbsenceRequest {
        self.engine
            .create(vacation(employee.id, 3))
            .await
            .expect("Failed to create absence request")
    }

    pub async fn approve_as(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        stage: ApprovalStage,
    ) -> Result<AbsenceRequest, AppError> {
        self.engine
            .approve(request_id, approver_id, stage, ApprovalAction::Approved, None)
            .await
    }

    /// Approve every remaining stage with the matching org member until the request completes
    pub async fn approve_through(&self, request_id: Uuid) -> Vec<ApprovalStage> {
        let mut visited = Vec::new();
        loop {
            let request = self.stored(request_id).await;
            let stage = request.current_stage;
            if stage.is_terminal() {
                return visited;
            }
            visited.push(stage);
            self.approve_as(request_id, self.approver_for(stage), stage)
                .await
                .unwrap_or_else(|e| panic!("Approval at {} failed: {}", stage, e));
        }
    }

    pub fn approver_for(&self, stage: ApprovalStage) -> Uuid {
        match stage {
            ApprovalStage::Supervisor => self.org.supervisor,
            ApprovalStage::Manager | ApprovalStage::GeneralManager => self.org.general_manager,
            ApprovalStage::Hr => self.org.hr,
            ApprovalStage::HrBlueGray => self.org.hr_blue_gray,
            ApprovalStage::Payroll => self.org.payroll,
            ApprovalStage::Completed | ApprovalStage::Declined => {
                panic!("No approver for terminal stage {}", stage)
            }
        }
    }

    pub async fn stored(&self, request_id: Uuid) -> AbsenceRequest {
        self.store
            .request(request_id)
            .await
            .expect("Request should be stored")
    }

    /// Move a stored request's last action `hours` into the past
    pub async fn idle_for(&self, request_id: Uuid, hours: i64) -> AbsenceRequest {
        let mut request = self.stored(request_id).await;
        request.last_action_at = Utc::now() - Duration::hours(hours);
        self.store.put_request(request.clone()).await;
        request
    }
}

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("valid decimal")
}

pub fn vacation(employee_id: Uuid, days: i64) -> CreateAbsenceRequestInput {
    let start_date = Utc::now().date_naive() + Duration::days(14);
    CreateAbsenceRequestInput {
        employee_id,
        request_type: RequestType::Vacation,
        start_date,
        end_date: start_date + Duration::days(days - 1),
        total_days: BigDecimal::from(days),
        hours_per_day: None,
        paid_days: None,
        unpaid_days: None,
        shift_id: None,
        reason: Some("Family trip".to_string()),
    }
}

pub fn shift_change(employee_id: Uuid, start_date: NaiveDate, shift_id: Uuid) -> CreateAbsenceRequestInput {
    CreateAbsenceRequestInput {
        request_type: RequestType::ShiftChange,
        start_date,
        end_date: start_date + Duration::days(2),
        total_days: BigDecimal::from(3),
        shift_id: Some(shift_id),
        reason: Some("Swap to night shift".to_string()),
        ..vacation(employee_id, 3)
    }
}

pub fn setup_test_env() {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    let _ = env_logger::builder().is_test(true).try_init();
}
