use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::absence::ApprovalStage;
use super::macros::string_enum;

pub const ESCALATION_REASON: &str = "idle past threshold";

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "snake_case")]
    pub enum ApprovalAction {
        Approved => "approved",
        Declined => "declined",
    }
}

/// One human (or synthesized) decision on a request. Rows are never updated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalHistoryEntry {
    pub id: Uuid,
    pub request_id: Uuid,
    pub approver_id: Uuid,
    pub stage: ApprovalStage,
    pub action: ApprovalAction,
    pub comments: Option<String>,
    pub auto_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl ApprovalHistoryEntry {
    pub fn new(
        request_id: Uuid,
        approver_id: Uuid,
        stage: ApprovalStage,
        action: ApprovalAction,
        comments: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            approver_id,
            stage,
            action,
            comments,
            auto_approved: false,
            created_at: at,
        }
    }

    /// Approval recorded by the system on behalf of `approver_id`
    pub fn auto_approval(
        request_id: Uuid,
        approver_id: Uuid,
        stage: ApprovalStage,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            comments: Some(format!(
                "Auto-approved: supervisor also holds the general manager role ({})",
                stage
            )),
            auto_approved: true,
            ..Self::new(
                request_id,
                approver_id,
                stage,
                ApprovalAction::Approved,
                None,
                at,
            )
        }
    }
}

/// A system-initiated forced stage transition. Rows are never updated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EscalationLogEntry {
    pub id: Uuid,
    pub request_id: Uuid,
    pub from_stage: ApprovalStage,
    pub to_stage: ApprovalStage,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl EscalationLogEntry {
    pub fn idle(
        request_id: Uuid,
        from_stage: ApprovalStage,
        to_stage: ApprovalStage,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            from_stage,
            to_stage,
            reason: ESCALATION_REASON.to_string(),
            created_at: at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTimeline {
    pub approvals: Vec<ApprovalHistoryEntry>,
    pub escalations: Vec<EscalationLogEntry>,
}
