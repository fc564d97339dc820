use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{AbsenceRequest, ApprovalStage, EmployeeProfile, Role};
use crate::services::ports::{EmployeeDirectory, NotificationSink};
use crate::services::routing::approver_group;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    BellOnly,
    BellAndInbox,
}

impl Channel {
    /// Line managers get an inbox message as well; desk roles only get the bell
    pub fn for_stage(stage: ApprovalStage) -> Self {
        match stage {
            ApprovalStage::Manager | ApprovalStage::GeneralManager => Channel::BellAndInbox,
            _ => Channel::BellOnly,
        }
    }
}

/// Fire-and-forget delivery of workflow notifications.
///
/// Every failure is logged and swallowed; nothing here can fail the caller.
#[derive(Clone)]
pub struct ApprovalNotifier {
    sink: Arc<dyn NotificationSink>,
    directory: Arc<dyn EmployeeDirectory>,
}

impl ApprovalNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>, directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { sink, directory }
    }

    pub async fn send(
        &self,
        recipients: &[Uuid],
        request_id: Uuid,
        channel: Channel,
        subject: &str,
        body: &str,
    ) {
        for recipient in recipients {
            if let Err(e) = self.sink.notify(*recipient, request_id, body).await {
                log::warn!(
                    "Failed to notify user {} about request {}: {}",
                    recipient,
                    request_id,
                    e
                );
            }

            if channel == Channel::BellAndInbox {
                if let Err(e) = self.sink.send_message(*recipient, subject, body).await {
                    log::warn!(
                        "Failed to send inbox message to user {} about request {}: {}",
                        recipient,
                        request_id,
                        e
                    );
                }
            }
        }
    }

    /// Users expected to act on a request sitting at `stage`
    pub async fn stage_recipients(
        &self,
        stage: ApprovalStage,
        employee: &EmployeeProfile,
    ) -> Vec<Uuid> {
        match stage {
            ApprovalStage::Supervisor => employee.supervisor_id.into_iter().collect(),
            ApprovalStage::Manager | ApprovalStage::GeneralManager => {
                employee.general_manager_id.into_iter().collect()
            }
            _ => self.group_members(approver_group(stage)).await,
        }
    }

    pub async fn group_members(&self, roles: &[Role]) -> Vec<Uuid> {
        if roles.is_empty() {
            return Vec::new();
        }

        match self.directory.users_with_roles(roles).await {
            Ok(users) => users,
            Err(e) => {
                log::warn!("Failed to resolve approver group {:?}: {}", roles, e);
                Vec::new()
            }
        }
    }

    /// Tell the approvers of the request's current stage that it awaits them
    pub async fn announce_stage(&self, request: &AbsenceRequest, employee: &EmployeeProfile) {
        let stage = request.current_stage;
        let recipients = self.stage_recipients(stage, employee).await;
        if recipients.is_empty() {
            log::warn!(
                "No approvers found for request {} at stage {}",
                request.id,
                stage
            );
            return;
        }

        let subject = format!("Absence request awaiting {} approval", stage);
        let body = format!(
            "{} requested {} from {} to {} ({} days). The request is waiting for your approval at the {} stage.",
            employee.full_name,
            request.request_type,
            request.start_date,
            request.end_date,
            request.total_days,
            stage
        );

        self.send(
            &recipients,
            request.id,
            Channel::for_stage(stage),
            &subject,
            &body,
        )
        .await;
    }

    /// Outcome notice for the requesting employee
    pub async fn notify_employee(&self, request: &AbsenceRequest, subject: &str, body: &str) {
        self.send(
            &[request.employee_id],
            request.id,
            Channel::BellAndInbox,
            subject,
            body,
        )
        .await;
    }
}
