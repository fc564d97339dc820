//! The absence approval workflow: creation, stage-by-stage approval, decline,
//! and the archive/delete lifecycle of finished requests.
//!
//! Every state change runs inside one store transaction together with its
//! history append. Downstream effects (incidence updates, shift exceptions,
//! notifications) run after commit and only ever log on failure.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::{
    models::{
        AbsenceRequest, ApprovalAction, ApprovalHistoryEntry, ApprovalStage,
        CreateAbsenceRequestInput, EmployeeProfile, IncidenceDraft, RequestStatus, RequestTimeline,
        RequestType, Role,
    },
    store::{WorkflowStore, WorkflowTransaction},
    transaction::DatabaseTransaction,
};
use crate::error::AppError;
use crate::services::{
    amount::incidence_amount,
    cutoff::{is_late, payroll_cutoff},
    notifier::{ApprovalNotifier, Channel},
    ports::{EmployeeDirectory, IncidenceSink, NotificationSink, ShiftExceptionSink},
    routing::{initial_stage, is_authorized, next_stage},
};

/// Collaborators shared by the workflow engine and the escalation scheduler
#[derive(Clone)]
pub struct WorkflowPorts {
    pub store: Arc<dyn WorkflowStore>,
    pub directory: Arc<dyn EmployeeDirectory>,
    pub notifications: Arc<dyn NotificationSink>,
    pub incidences: Arc<dyn IncidenceSink>,
    pub shift_exceptions: Arc<dyn ShiftExceptionSink>,
}

impl WorkflowPorts {
    pub fn notifier(&self) -> ApprovalNotifier {
        ApprovalNotifier::new(self.notifications.clone(), self.directory.clone())
    }

    /// Load an employee or fail with a not-found error
    pub async fn employee(&self, employee_id: Uuid) -> Result<EmployeeProfile, AppError> {
        self.directory
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", employee_id)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Advanced(ApprovalStage),
    Completed,
    Declined,
}

#[derive(Debug, Clone)]
struct Transition {
    request: AbsenceRequest,
    outcome: TransitionOutcome,
}

#[derive(Clone)]
pub struct WorkflowEngine {
    ports: WorkflowPorts,
    notifier: ApprovalNotifier,
    payroll_timezone: Tz,
}

impl WorkflowEngine {
    pub fn new(ports: WorkflowPorts, payroll_timezone: Tz) -> Self {
        let notifier = ports.notifier();
        Self {
            ports,
            notifier,
            payroll_timezone,
        }
    }

    /// Submit a new absence request
    pub async fn create(&self, input: CreateAbsenceRequestInput) -> Result<AbsenceRequest, AppError> {
        validate_input(&input)?;

        let employee = self.ports.employee(input.employee_id).await?;
        let supervisor_id = employee.supervisor_id.ok_or_else(|| {
            AppError::Configuration(format!(
                "Employee {} has no supervisor assigned",
                employee.id
            ))
        })?;
        let general_manager_id = employee.general_manager_id.ok_or_else(|| {
            AppError::Configuration(format!(
                "Employee {} has no general manager assigned",
                employee.id
            ))
        })?;
        let supervisor_role =
            resolve_role(self.ports.directory.as_ref(), supervisor_id, "Supervisor").await?;
        resolve_role(
            self.ports.directory.as_ref(),
            general_manager_id,
            "General manager",
        )
        .await?;
        let payroll_id = employee.payroll_id.clone().ok_or_else(|| {
            AppError::Configuration(format!(
                "Employee {} has no payroll identity to link an incidence to",
                employee.id
            ))
        })?;

        let classification = employee.classification();
        let now = Utc::now();
        let mut request = new_request(input, now);
        request.current_stage = initial_stage(&classification);
        request.payroll_cutoff_date = Some(payroll_cutoff(
            now,
            &classification,
            self.payroll_timezone,
        ));

        // A supervisor who is also the general manager approves both line
        // stages at once, whatever stage the classification starts at.
        let auto_approved = supervisor_role == Role::SupervisorGm;
        let mut history = Vec::new();
        if auto_approved {
            for stage in [ApprovalStage::Supervisor, ApprovalStage::Manager] {
                history.push(ApprovalHistoryEntry::auto_approval(
                    request.id,
                    supervisor_id,
                    stage,
                    now,
                ));
            }
            request.current_stage = ApprovalStage::Hr;
        }

        // The placeholder lives outside the store, so it is opened first and
        // discarded again if the request never commits.
        let incidence_id = self
            .ports
            .incidences
            .create_placeholder(&IncidenceDraft::for_request(&request, &payroll_id))
            .await?;
        request.incidence_id = Some(incidence_id);

        let created = DatabaseTransaction::run(self.ports.store.as_ref(), move |tx| {
            Box::pin(async move {
                tx.insert_request(&request).await?;
                for entry in &history {
                    tx.append_history(entry).await?;
                }
                Ok(request)
            })
        })
        .await;
        let request = match created {
            Ok(request) => request,
            Err(err) => {
                self.discard_incidence(incidence_id).await;
                return Err(err);
            }
        };

        log::info!(
            "Absence request {} created for employee {} at stage {}",
            request.id,
            employee.id,
            request.current_stage
        );

        if auto_approved {
            let recipients = self.notifier.stage_recipients(ApprovalStage::Hr, &employee).await;
            let body = format!(
                "{} requested {} from {} to {}. Supervisor and manager stages were auto-approved because the supervisor also holds the general manager role; the request awaits HR review.",
                employee.full_name, request.request_type, request.start_date, request.end_date
            );
            self.notifier
                .send(
                    &recipients,
                    request.id,
                    Channel::BellOnly,
                    "Absence request auto-approved to HR",
                    &body,
                )
                .await;
        } else {
            let mut recipients = vec![supervisor_id];
            if general_manager_id != supervisor_id {
                recipients.push(general_manager_id);
            }
            let body = format!(
                "{} submitted a {} request from {} to {} ({} days).",
                employee.full_name,
                request.request_type,
                request.start_date,
                request.end_date,
                request.total_days
            );
            self.notifier
                .send(
                    &recipients,
                    request.id,
                    Channel::BellAndInbox,
                    "New absence request",
                    &body,
                )
                .await;

            if request.current_stage != ApprovalStage::Supervisor {
                self.notifier.announce_stage(&request, &employee).await;
            }
        }

        Ok(request)
    }

    /// Record an approver's decision for the stage the request is currently at
    pub async fn approve(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        stage: ApprovalStage,
        action: ApprovalAction,
        comments: Option<String>,
    ) -> Result<AbsenceRequest, AppError> {
        let existing = self.get(request_id).await?;
        let employee = self.ports.employee(existing.employee_id).await?;
        let classification = employee.classification();
        let timezone = self.payroll_timezone;
        let now = Utc::now();
        let directory = self.ports.directory.clone();

        let transition = DatabaseTransaction::run(self.ports.store.as_ref(), move |tx| {
            Box::pin(async move {
                let mut request = lock_actionable(tx, request_id).await?;

                if request.current_stage != stage {
                    return Err(AppError::StageMismatch {
                        expected: stage,
                        actual: request.current_stage,
                    });
                }
                let role = resolve_role(directory.as_ref(), approver_id, "Approver").await?;
                if !is_authorized(role, stage) {
                    return Err(AppError::PermissionDenied(format!(
                        "Role {} cannot act on the {} stage",
                        role, stage
                    )));
                }

                tx.append_history(&ApprovalHistoryEntry::new(
                    request_id,
                    approver_id,
                    stage,
                    action,
                    comments,
                    now,
                ))
                .await?;

                let cutoff = *request
                    .payroll_cutoff_date
                    .get_or_insert_with(|| payroll_cutoff(now, &classification, timezone));
                request.last_action_at = now;
                request.updated_at = now;

                let outcome = match action {
                    ApprovalAction::Declined => {
                        request.status = RequestStatus::Declined;
                        request.current_stage = ApprovalStage::Completed;
                        if stage.is_hr() || stage == ApprovalStage::GeneralManager {
                            request.excluded_from_payroll = true;
                        }
                        TransitionOutcome::Declined
                    }
                    ApprovalAction::Approved => {
                        if is_late(now, cutoff) {
                            request.late_approval_flag = true;
                        }
                        match next_stage(stage, &classification) {
                            Some(next) => {
                                request.current_stage = next;
                                TransitionOutcome::Advanced(next)
                            }
                            None => {
                                request.status = RequestStatus::Approved;
                                request.current_stage = ApprovalStage::Completed;
                                TransitionOutcome::Completed
                            }
                        }
                    }
                };

                tx.update_request(&request).await?;

                Ok(Transition { request, outcome })
            })
        })
        .await?;

        log::info!(
            "Request {} {} at stage {} by {} ({:?})",
            request_id,
            action,
            stage,
            approver_id,
            transition.outcome
        );

        self.apply_downstream(&transition, &employee, approver_id)
            .await;

        Ok(transition.request)
    }

    pub async fn decline(
        &self,
        request_id: Uuid,
        approver_id: Uuid,
        stage: ApprovalStage,
        comments: Option<String>,
    ) -> Result<AbsenceRequest, AppError> {
        self.approve(
            request_id,
            approver_id,
            stage,
            ApprovalAction::Declined,
            comments,
        )
        .await
    }

    /// Soft-archive a request that reached a final outcome
    pub async fn archive(&self, request_id: Uuid) -> Result<AbsenceRequest, AppError> {
        let now = Utc::now();
        DatabaseTransaction::run(self.ports.store.as_ref(), move |tx| {
            Box::pin(async move {
                let mut request = lock_existing(tx, request_id).await?;
                if !matches!(
                    request.status,
                    RequestStatus::Approved | RequestStatus::Declined
                ) {
                    return Err(AppError::InvalidState(format!(
                        "Request {} is {} and cannot be archived",
                        request_id, request.status
                    )));
                }

                request.status = RequestStatus::Archived;
                request.updated_at = now;
                tx.update_request(&request).await?;
                Ok(request)
            })
        })
        .await
    }

    /// Hard-delete a request that is still pending or was declined
    pub async fn delete(&self, request_id: Uuid) -> Result<(), AppError> {
        let removed = DatabaseTransaction::run(self.ports.store.as_ref(), move |tx| {
            Box::pin(async move {
                let request = lock_existing(tx, request_id).await?;
                if !matches!(
                    request.status,
                    RequestStatus::Pending | RequestStatus::Declined
                ) {
                    return Err(AppError::InvalidState(format!(
                        "Request {} is {} and cannot be deleted",
                        request_id, request.status
                    )));
                }

                tx.delete_request(request_id).await?;
                Ok(request)
            })
        })
        .await?;

        log::info!("Absence request {} deleted", request_id);

        if removed.status == RequestStatus::Pending {
            if let Some(incidence_id) = removed.incidence_id {
                self.discard_incidence(incidence_id).await;
            }
        }

        Ok(())
    }

    pub async fn get(&self, request_id: Uuid) -> Result<AbsenceRequest, AppError> {
        self.ports
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Absence request {} not found", request_id)))
    }

    /// Approval history and escalation log of a request
    pub async fn timeline(&self, request_id: Uuid) -> Result<RequestTimeline, AppError> {
        self.get(request_id).await?;

        Ok(RequestTimeline {
            approvals: self.ports.store.list_history(request_id).await?,
            escalations: self.ports.store.list_escalations(request_id).await?,
        })
    }

    async fn apply_downstream(
        &self,
        transition: &Transition,
        employee: &EmployeeProfile,
        approver_id: Uuid,
    ) {
        let request = &transition.request;

        match transition.outcome {
            TransitionOutcome::Declined => {
                if request.excluded_from_payroll {
                    self.propagate_flags(request).await;
                }
                let body = format!(
                    "Your {} request from {} to {} was declined.",
                    request.request_type, request.start_date, request.end_date
                );
                self.notifier
                    .notify_employee(request, "Absence request declined", &body)
                    .await;
            }
            TransitionOutcome::Advanced(_) => {
                self.propagate_flags(request).await;
                self.notifier.announce_stage(request, employee).await;
            }
            TransitionOutcome::Completed => {
                self.propagate_flags(request).await;
                self.finalize_incidence(request, employee).await;
                if request.request_type == RequestType::ShiftChange {
                    self.apply_shift_exceptions(request, approver_id).await;
                }

                let body = format!(
                    "Your {} request from {} to {} was approved.",
                    request.request_type, request.start_date, request.end_date
                );
                self.notifier
                    .notify_employee(request, "Absence request approved", &body)
                    .await;

                let payroll = self
                    .notifier
                    .group_members(&[Role::Payroll, Role::HrPayroll])
                    .await;
                let body = format!(
                    "{}'s {} request from {} to {} is fully approved and ready for payroll.",
                    employee.full_name, request.request_type, request.start_date, request.end_date
                );
                self.notifier
                    .send(
                        &payroll,
                        request.id,
                        Channel::BellOnly,
                        "Absence request approved",
                        &body,
                    )
                    .await;
            }
        }
    }

    async fn propagate_flags(&self, request: &AbsenceRequest) {
        let Some(incidence_id) = request.incidence_id else {
            return;
        };

        if let Err(e) = self
            .ports
            .incidences
            .update_flags(
                incidence_id,
                request.late_approval_flag,
                request.excluded_from_payroll,
            )
            .await
        {
            log::warn!(
                "Failed to propagate flags to incidence {} for request {}: {}",
                incidence_id,
                request.id,
                e
            );
        }
    }

    async fn finalize_incidence(&self, request: &AbsenceRequest, employee: &EmployeeProfile) {
        let incidence_id = match request.incidence_id {
            Some(id) => id,
            None => match self.open_missing_incidence(request, employee).await {
                Some(id) => id,
                None => return,
            },
        };

        let amount: BigDecimal = incidence_amount(request, &employee.daily_salary);
        if let Err(e) = self
            .ports
            .incidences
            .finalize(
                incidence_id,
                &amount,
                request.late_approval_flag,
                request.excluded_from_payroll,
            )
            .await
        {
            log::warn!(
                "Failed to finalize incidence {} for request {}: {}",
                incidence_id,
                request.id,
                e
            );
        }
    }

    async fn open_missing_incidence(
        &self,
        request: &AbsenceRequest,
        employee: &EmployeeProfile,
    ) -> Option<Uuid> {
        let Some(payroll_id) = employee.payroll_id.as_deref() else {
            log::warn!(
                "Request {} has no incidence and employee {} has no payroll identity",
                request.id,
                employee.id
            );
            return None;
        };

        match self
            .ports
            .incidences
            .create_placeholder(&IncidenceDraft::for_request(request, payroll_id))
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Failed to create incidence for request {}: {}", request.id, e);
                None
            }
        }
    }

    async fn apply_shift_exceptions(&self, request: &AbsenceRequest, approver_id: Uuid) {
        let Some(shift_id) = request.shift_id else {
            log::warn!("Shift change request {} has no target shift", request.id);
            return;
        };

        for day in request.days() {
            if let Err(e) = self
                .ports
                .shift_exceptions
                .upsert(request.employee_id, day, shift_id, approver_id)
                .await
            {
                log::warn!(
                    "Failed to upsert shift exception for employee {} on {}: {}",
                    request.employee_id,
                    day,
                    e
                );
            }
        }
    }

    async fn discard_incidence(&self, incidence_id: Uuid) {
        if let Err(e) = self.ports.incidences.discard(incidence_id).await {
            log::warn!("Failed to discard incidence {}: {}", incidence_id, e);
        }
    }
}

async fn resolve_role(
    directory: &dyn EmployeeDirectory,
    user_id: Uuid,
    label: &str,
) -> Result<Role, AppError> {
    directory
        .get_user_role(user_id)
        .await?
        .ok_or_else(|| AppError::Configuration(format!("{} {} cannot be resolved", label, user_id)))
}

/// Lock a request inside `tx`, failing if it does not exist
pub(crate) async fn lock_existing(
    tx: &mut dyn WorkflowTransaction,
    request_id: Uuid,
) -> Result<AbsenceRequest, AppError> {
    tx.lock_request(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Absence request {} not found", request_id)))
}

/// Lock a request that can still change stage
pub(crate) async fn lock_actionable(
    tx: &mut dyn WorkflowTransaction,
    request_id: Uuid,
) -> Result<AbsenceRequest, AppError> {
    let request = lock_existing(tx, request_id).await?;
    if !request.is_pending() || request.current_stage.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Request {} is {} at stage {} and admits no further actions",
            request_id, request.status, request.current_stage
        )));
    }
    Ok(request)
}

fn validate_input(input: &CreateAbsenceRequestInput) -> Result<(), AppError> {
    let zero = BigDecimal::from(0);

    if input.end_date < input.start_date {
        return Err(AppError::BadRequest(
            "End date cannot be before start date".to_string(),
        ));
    }
    if input.total_days <= zero {
        return Err(AppError::BadRequest(
            "Total days must be greater than zero".to_string(),
        ));
    }
    for (label, value) in [
        ("Hours per day", &input.hours_per_day),
        ("Paid days", &input.paid_days),
        ("Unpaid days", &input.unpaid_days),
    ] {
        if value.as_ref().is_some_and(|v| *v < zero) {
            return Err(AppError::BadRequest(format!("{} cannot be negative", label)));
        }
    }
    if input.request_type == RequestType::ShiftChange && input.shift_id.is_none() {
        return Err(AppError::BadRequest(
            "Shift change requests need a target shift".to_string(),
        ));
    }

    Ok(())
}

fn new_request(input: CreateAbsenceRequestInput, now: DateTime<Utc>) -> AbsenceRequest {
    AbsenceRequest {
        id: Uuid::new_v4(),
        employee_id: input.employee_id,
        request_type: input.request_type,
        start_date: input.start_date,
        end_date: input.end_date,
        total_days: input.total_days,
        hours_per_day: input.hours_per_day,
        paid_days: input.paid_days,
        unpaid_days: input.unpaid_days,
        shift_id: input.shift_id,
        reason: input.reason,
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
