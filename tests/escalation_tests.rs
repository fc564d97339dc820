use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use leaveflow::AppError;
use leaveflow::database::models::{ApprovalStage, ESCALATION_REASON, RequestStatus};
use leaveflow::services::SweepReport;

mod common;

use common::TestHarness;

#[tokio::test]
async fn test_idle_request_escalates_to_next_stage() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;
    h.idle_for(request.id, 30).await;

    let report = h.scheduler.run_once().await;
    assert_eq!(
        report,
        SweepReport {
            escalated: 1,
            skipped: 0,
            failed: 0
        }
    );

    let escalated = h.stored(request.id).await;
    assert_eq!(escalated.current_stage, ApprovalStage::Manager);
    assert_eq!(escalated.status, RequestStatus::Pending);
    assert_eq!(escalated.escalation_count, 1);
    assert!(escalated.is_escalated);
    assert!(Utc::now() - escalated.last_action_at < Duration::minutes(1));

    let timeline = h.engine.timeline(request.id).await.unwrap();
    assert_eq!(timeline.escalations.len(), 1);
    let entry = &timeline.escalations[0];
    assert_eq!(entry.from_stage, ApprovalStage::Supervisor);
    assert_eq!(entry.to_stage, ApprovalStage::Manager);
    assert_eq!(entry.reason, ESCALATION_REASON);
    // Escalations are not approvals
    assert!(timeline.approvals.is_empty());

    // Creation notice plus the escalation notice, both with an inbox message
    assert_eq!(h.notifications.inbox_for(h.org.general_manager).await.len(), 2);
}

#[tokio::test]
async fn test_recent_requests_are_left_alone() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;
    h.idle_for(request.id, 10).await;

    let report = h.scheduler.run_once().await;
    assert_eq!(report, SweepReport::default());
    assert_eq!(h.stored(request.id).await.current_stage, ApprovalStage::Supervisor);
}

#[tokio::test]
async fn test_repeated_idleness_keeps_counting() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;

    h.idle_for(request.id, 30).await;
    h.scheduler.run_once().await;
    h.idle_for(request.id, 30).await;
    h.scheduler.run_once().await;

    let escalated = h.stored(request.id).await;
    assert_eq!(escalated.current_stage, ApprovalStage::Hr);
    assert_eq!(escalated.escalation_count, 2);

    let stages: Vec<(ApprovalStage, ApprovalStage)> = h
        .engine
        .timeline(request.id)
        .await
        .unwrap()
        .escalations
        .iter()
        .map(|e| (e.from_stage, e.to_stage))
        .collect();
    assert_eq!(
        stages,
        vec![
            (ApprovalStage::Supervisor, ApprovalStage::Manager),
            (ApprovalStage::Manager, ApprovalStage::Hr),
        ]
    );
}

#[tokio::test]
async fn test_blue_collar_escalation_uses_classification_routing() {
    let h = TestHarness::new().await;
    let employee = h.blue_collar().await;
    let request = h.submit(&employee).await;
    assert_eq!(request.current_stage, ApprovalStage::HrBlueGray);

    h.idle_for(request.id, 48).await;
    h.scheduler.run_once().await;

    assert_eq!(
        h.stored(request.id).await.current_stage,
        ApprovalStage::GeneralManager
    );
}

#[tokio::test]
async fn test_payroll_stage_is_never_escalated() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;

    for stage in [
        ApprovalStage::Supervisor,
        ApprovalStage::Manager,
        ApprovalStage::Hr,
        ApprovalStage::GeneralManager,
    ] {
        h.approve_as(request.id, h.approver_for(stage), stage)
            .await
            .unwrap();
    }
    h.idle_for(request.id, 72).await;

    let report = h.scheduler.run_once().await;
    assert_eq!(report.skipped, 1);
    assert_eq!(report.escalated, 0);

    let stored = h.stored(request.id).await;
    assert_eq!(stored.current_stage, ApprovalStage::Payroll);
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(stored.escalation_count, 0);
    assert!(h.engine.timeline(request.id).await.unwrap().escalations.is_empty());
}

#[tokio::test]
async fn test_terminal_requests_are_not_candidates() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;
    h.engine
        .decline(request.id, h.org.supervisor, ApprovalStage::Supervisor, None)
        .await
        .unwrap();
    h.idle_for(request.id, 100).await;

    let report = h.scheduler.run_once().await;
    assert_eq!(report, SweepReport::default());
    assert_eq!(h.stored(request.id).await.status, RequestStatus::Declined);
}

#[tokio::test]
async fn test_sweep_continues_past_failing_request() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let broken = h.submit(&employee).await;
    let healthy = h.submit(&employee).await;
    // Older first, so the failing request is processed before the healthy one
    h.idle_for(broken.id, 40).await;
    h.idle_for(healthy.id, 30).await;
    h.store.fail_updates_for(broken.id);

    let report = h.scheduler.run_once().await;
    assert_eq!(
        report,
        SweepReport {
            escalated: 1,
            skipped: 0,
            failed: 1
        }
    );
    assert_eq!(h.stored(healthy.id).await.current_stage, ApprovalStage::Manager);

    let untouched = h.stored(broken.id).await;
    assert_eq!(untouched.current_stage, ApprovalStage::Supervisor);
    assert_eq!(untouched.escalation_count, 0);
    assert!(h.engine.timeline(broken.id).await.unwrap().escalations.is_empty());

    // Picked up again on the next run
    h.store.clear_failures();
    let report = h.scheduler.run_once().await;
    assert_eq!(report.escalated, 1);
    assert_eq!(h.stored(broken.id).await.current_stage, ApprovalStage::Manager);
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_escalation() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;
    h.idle_for(request.id, 30).await;
    h.notifications.set_failing(true);

    let report = h.scheduler.run_once().await;
    assert_eq!(report.escalated, 1);
    assert_eq!(h.stored(request.id).await.escalation_count, 1);
}

#[tokio::test]
async fn test_stale_approval_after_escalation_is_rejected() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;
    h.idle_for(request.id, 30).await;
    h.scheduler.run_once().await;

    let err = h
        .approve_as(request.id, h.org.supervisor, ApprovalStage::Supervisor)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StageMismatch { .. }));

    // The escalated stage is approved normally and the count survives
    let approved = h
        .approve_as(request.id, h.org.general_manager, ApprovalStage::Manager)
        .await
        .unwrap();
    assert_eq!(approved.current_stage, ApprovalStage::Hr);
    assert_eq!(approved.escalation_count, 1);
    assert!(approved.is_escalated);
}

#[tokio::test]
async fn test_sweep_at_uses_supplied_clock() {
    let h = TestHarness::new().await;
    let employee = h.white_collar().await;
    let request = h.submit(&employee).await;

    let report = h.scheduler.sweep_at(Utc::now() + Duration::hours(25)).await;
    assert_eq!(report.escalated, 1);
    assert_eq!(h.stored(request.id).await.current_stage, ApprovalStage::Manager);
}
