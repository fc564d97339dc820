//! In-process adapters for every workflow port.
//!
//! Used by the integration tests and for running the engine without a
//! database. Transactions take an exclusive lock on the whole store and work
//! on a copy, so an uncommitted transaction never leaks writes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::database::{
    models::{
        AbsenceRequest, ApprovalHistoryEntry, EmployeeProfile, EscalationLogEntry, IncidenceDraft,
        IncidenceStatus, PayrollIncidence, Role, ShiftException,
    },
    store::{WorkflowStore, WorkflowTransaction},
};
use crate::error::AppError;
use crate::services::ports::{
    EmployeeDirectory, IncidenceSink, NotificationSink, ShiftExceptionSink,
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    requests: HashMap<Uuid, AbsenceRequest>,
    history: Vec<ApprovalHistoryEntry>,
    escalations: Vec<EscalationLogEntry>,
}

#[derive(Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<Mutex<StoreState>>,
    failing_updates: Arc<std::sync::Mutex<HashSet<Uuid>>>,
    failing_inserts: Arc<AtomicBool>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a stored request outside of any transaction
    pub async fn put_request(&self, request: AbsenceRequest) {
        self.state.lock().await.requests.insert(request.id, request);
    }

    pub async fn request(&self, id: Uuid) -> Option<AbsenceRequest> {
        self.state.lock().await.requests.get(&id).cloned()
    }

    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    /// Make every `update_request` for `id` fail until cleared
    pub fn fail_updates_for(&self, id: Uuid) {
        if let Ok(mut failing) = self.failing_updates.lock() {
            failing.insert(id);
        }
    }

    /// Make every `insert_request` fail until cleared
    pub fn set_fail_inserts(&self, failing: bool) {
        self.failing_inserts.store(failing, Ordering::SeqCst);
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing_updates.lock() {
            failing.clear();
        }
        self.failing_inserts.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn begin(&self) -> Result<Box<dyn WorkflowTransaction>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();

        Ok(Box::new(InMemoryTransaction {
            guard,
            working,
            failing_updates: self.failing_updates.clone(),
            failing_inserts: self.failing_inserts.clone(),
        }))
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<AbsenceRequest>, AppError> {
        Ok(self.request(id).await)
    }

    async fn list_history(&self, request_id: Uuid) -> Result<Vec<ApprovalHistoryEntry>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .filter(|entry| entry.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn list_escalations(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<EscalationLogEntry>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .escalations
            .iter()
            .filter(|entry| entry.request_id == request_id)
            .cloned()
            .collect())
    }

    async fn find_stale_requests(
        &self,
        idle_before: DateTime<Utc>,
    ) -> Result<Vec<AbsenceRequest>, AppError> {
        let state = self.state.lock().await;
        let mut stale: Vec<AbsenceRequest> = state
            .requests
            .values()
            .filter(|r| {
                r.is_pending() && !r.current_stage.is_terminal() && r.last_action_at < idle_before
            })
            .cloned()
            .collect();
        stale.sort_by_key(|r| r.last_action_at);

        Ok(stale)
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
    failing_updates: Arc<std::sync::Mutex<HashSet<Uuid>>>,
    failing_inserts: Arc<AtomicBool>,
}

#[async_trait]
impl WorkflowTransaction for InMemoryTransaction {
    async fn insert_request(&mut self, request: &AbsenceRequest) -> Result<(), AppError> {
        if self.failing_inserts.load(Ordering::SeqCst) {
            return Err(AppError::internal_server_error_message(format!(
                "Injected insert failure for request {}",
                request.id
            )));
        }
        if self.working.requests.contains_key(&request.id) {
            return Err(AppError::internal_server_error_message(format!(
                "Duplicate absence request id {}",
                request.id
            )));
        }
        self.working.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn lock_request(&mut self, id: Uuid) -> Result<Option<AbsenceRequest>, AppError> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn update_request(&mut self, request: &AbsenceRequest) -> Result<(), AppError> {
        let failing = self
            .failing_updates
            .lock()
            .map(|ids| ids.contains(&request.id))
            .unwrap_or(false);
        if failing {
            return Err(AppError::internal_server_error_message(format!(
                "Injected update failure for request {}",
                request.id
            )));
        }

        match self.working.requests.get_mut(&request.id) {
            Some(stored) => {
                *stored = request.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Absence request {} not found",
                request.id
            ))),
        }
    }

    async fn delete_request(&mut self, id: Uuid) -> Result<(), AppError> {
        self.working.requests.remove(&id);
        self.working.history.retain(|entry| entry.request_id != id);
        self.working.escalations.retain(|entry| entry.request_id != id);
        Ok(())
    }

    async fn append_history(&mut self, entry: &ApprovalHistoryEntry) -> Result<(), AppError> {
        self.working.history.push(entry.clone());
        Ok(())
    }

    async fn append_escalation(&mut self, entry: &EscalationLogEntry) -> Result<(), AppError> {
        self.working.escalations.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let InMemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeDirectory {
    employees: RwLock<HashMap<Uuid, EmployeeProfile>>,
    roles: RwLock<HashMap<Uuid, Role>>,
}

impl InMemoryEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_employee(&self, employee: EmployeeProfile) {
        self.employees.write().await.insert(employee.id, employee);
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) {
        self.roles.write().await.insert(user_id, role);
    }

    pub async fn remove_role(&self, user_id: Uuid) {
        self.roles.write().await.remove(&user_id);
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn get_employee(&self, id: Uuid) -> Result<Option<EmployeeProfile>, AppError> {
        Ok(self.employees.read().await.get(&id).cloned())
    }

    async fn get_user_role(&self, user_id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(self.roles.read().await.get(&user_id).copied())
    }

    async fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<Uuid>, AppError> {
        let mut users: Vec<Uuid> = self
            .roles
            .read()
            .await
            .iter()
            .filter(|(_, role)| roles.contains(role))
            .map(|(user_id, _)| *user_id)
            .collect();
        users.sort();

        Ok(users)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BellNotification {
    pub user_id: Uuid,
    pub request_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxMessage {
    pub user_id: Uuid,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct InMemoryNotificationSink {
    bells: RwLock<Vec<BellNotification>>,
    inbox: RwLock<Vec<InboxMessage>>,
    failing: AtomicBool,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn bells(&self) -> Vec<BellNotification> {
        self.bells.read().await.clone()
    }

    pub async fn inbox(&self) -> Vec<InboxMessage> {
        self.inbox.read().await.clone()
    }

    pub async fn bells_for(&self, user_id: Uuid) -> Vec<BellNotification> {
        self.bells
            .read()
            .await
            .iter()
            .filter(|bell| bell.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn inbox_for(&self, user_id: Uuid) -> Vec<InboxMessage> {
        self.inbox
            .read()
            .await
            .iter()
            .filter(|message| message.user_id == user_id)
            .cloned()
            .collect()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService(
                "Notification service unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        message: &str,
    ) -> Result<(), AppError> {
        self.check()?;
        self.bells.write().await.push(BellNotification {
            user_id,
            request_id,
            message: message.to_string(),
        });
        Ok(())
    }

    async fn send_message(
        &self,
        user_id: Uuid,
        subject: &str,
        body: &str,
    ) -> Result<(), AppError> {
        self.check()?;
        self.inbox.write().await.push(InboxMessage {
            user_id,
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryIncidenceSink {
    incidences: RwLock<HashMap<Uuid, PayrollIncidence>>,
    fail_create: AtomicBool,
    fail_finalize: AtomicBool,
}

impl InMemoryIncidenceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_create(&self, failing: bool) {
        self.fail_create.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_finalize(&self, failing: bool) {
        self.fail_finalize.store(failing, Ordering::SeqCst);
    }

    pub async fn get(&self, incidence_id: Uuid) -> Option<PayrollIncidence> {
        self.incidences.read().await.get(&incidence_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.incidences.read().await.len()
    }
}

#[async_trait]
impl IncidenceSink for InMemoryIncidenceSink {
    async fn create_placeholder(&self, draft: &IncidenceDraft) -> Result<Uuid, AppError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService(
                "Payroll service rejected the incidence".to_string(),
            ));
        }

        let now = Utc::now();
        let incidence = PayrollIncidence {
            id: Uuid::new_v4(),
            request_id: draft.request_id,
            employee_id: draft.employee_id,
            payroll_id: draft.payroll_id.clone(),
            request_type: draft.request_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            total_days: draft.total_days.clone(),
            amount: None,
            status: IncidenceStatus::Pending,
            late_approval: false,
            excluded_from_payroll: false,
            created_at: now,
            updated_at: now,
        };
        let id = incidence.id;
        self.incidences.write().await.insert(id, incidence);

        Ok(id)
    }

    async fn finalize(
        &self,
        incidence_id: Uuid,
        amount: &BigDecimal,
        late_approval: bool,
        excluded_from_payroll: bool,
    ) -> Result<(), AppError> {
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService(
                "Payroll service unavailable".to_string(),
            ));
        }

        let mut incidences = self.incidences.write().await;
        let incidence = incidences.get_mut(&incidence_id).ok_or_else(|| {
            AppError::ExternalService(format!("Incidence {} does not exist", incidence_id))
        })?;
        incidence.amount = Some(amount.clone());
        incidence.status = IncidenceStatus::Finalized;
        incidence.late_approval = late_approval;
        incidence.excluded_from_payroll = excluded_from_payroll;
        incidence.updated_at = Utc::now();

        Ok(())
    }

    async fn update_flags(
        &self,
        incidence_id: Uuid,
        late_approval: bool,
        excluded_from_payroll: bool,
    ) -> Result<(), AppError> {
        if let Some(incidence) = self.incidences.write().await.get_mut(&incidence_id) {
            incidence.late_approval = late_approval;
            incidence.excluded_from_payroll = excluded_from_payroll;
            incidence.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn discard(&self, incidence_id: Uuid) -> Result<(), AppError> {
        self.incidences.write().await.remove(&incidence_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryShiftExceptionSink {
    exceptions: RwLock<HashMap<(Uuid, NaiveDate), ShiftException>>,
}

impl InMemoryShiftExceptionSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All exceptions ordered by date
    pub async fn all(&self) -> Vec<ShiftException> {
        let mut exceptions: Vec<ShiftException> =
            self.exceptions.read().await.values().cloned().collect();
        exceptions.sort_by_key(|e| (e.date, e.employee_id));
        exceptions
    }
}

#[async_trait]
impl ShiftExceptionSink for InMemoryShiftExceptionSink {
    async fn upsert(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
        shift_id: Uuid,
        created_by: Uuid,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let mut exceptions = self.exceptions.write().await;

        match exceptions.get_mut(&(employee_id, date)) {
            Some(existing) => {
                existing.shift_id = shift_id;
                existing.updated_at = now;
            }
            None => {
                exceptions.insert(
                    (employee_id, date),
                    ShiftException {
                        id: Uuid::new_v4(),
                        employee_id,
                        date,
                        shift_id,
                        created_by,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ApprovalStage, RequestStatus, RequestType};

    fn pending_request() -> AbsenceRequest {
        let now = Utc::now();
        AbsenceRequest {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            request_type: RequestType::Vacation,
            start_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            total_days: BigDecimal::from(2),
            hours_per_day: None,
            paid_days: None,
            unpaid_days: None,
            shift_id: None,
            reason: None,
            status: RequestStatus::Pending,
            current_stage: ApprovalStage::Supervisor,
            last_action_at: now,
            payroll_cutoff_date: None,
            late_approval_flag: false,
            excluded_from_payroll: false,
            escalation_count: 0,
            is_escalated: false,
            incidence_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = InMemoryWorkflowStore::new();
        let request = pending_request();

        let mut tx = store.begin().await.unwrap();
        tx.insert_request(&request).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(store.request(request.id).await.is_none());

        let mut tx = store.begin().await.unwrap();
        tx.insert_request(&request).await.unwrap();
        drop(tx);
        assert!(store.request(request.id).await.is_none());

        let mut tx = store.begin().await.unwrap();
        tx.insert_request(&request).await.unwrap();
        tx.commit().await.unwrap();
        assert!(store.request(request.id).await.is_some());
    }

    #[tokio::test]
    async fn test_shift_exception_upsert_updates_in_place() {
        let sink = InMemoryShiftExceptionSink::new();
        let employee = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

        sink.upsert(employee, day, first, Uuid::new_v4()).await.unwrap();
        sink.upsert(employee, day, second, Uuid::new_v4()).await.unwrap();

        let all = sink.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].shift_id, second);
    }
}
