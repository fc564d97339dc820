use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::database::{
    models::{AbsenceRequest, ApprovalStage, EscalationLogEntry},
    transaction::DatabaseTransaction,
};
use crate::error::AppError;
use crate::services::{notifier::ApprovalNotifier, routing::next_stage, workflow::WorkflowPorts};

#[derive(Debug, Clone, Copy)]
pub struct EscalationSettings {
    pub interval_secs: u64,
    pub idle_threshold: Duration,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            idle_threshold: Duration::hours(24),
        }
    }
}

/// Counts for one sweep over the stale requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub escalated: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Escalation {
    Moved {
        request: AbsenceRequest,
        from: ApprovalStage,
    },
    Skipped(&'static str),
}

/// Force-advances requests nobody acted on within the idle threshold
#[derive(Clone)]
pub struct EscalationScheduler {
    ports: WorkflowPorts,
    notifier: ApprovalNotifier,
    settings: EscalationSettings,
}

impl EscalationScheduler {
    pub fn new(ports: WorkflowPorts, settings: EscalationSettings) -> Self {
        let notifier = ports.notifier();
        Self {
            ports,
            notifier,
            settings,
        }
    }

    /// Spawn the periodic sweep on the tokio runtime
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    pub async fn run(self) {
        let period = std::time::Duration::from_secs(self.settings.interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        log::info!(
            "Escalation scheduler started (every {}s, idle threshold {}h)",
            period.as_secs(),
            self.settings.idle_threshold.num_hours()
        );

        loop {
            interval.tick().await;
            self.run_once().await;
        }
    }

    pub async fn run_once(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Escalate every request idle since before `now - idle_threshold`.
    ///
    /// A failing candidate is counted and left untouched so the next sweep
    /// picks it up again.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let idle_before = now - self.settings.idle_threshold;
        let mut report = SweepReport::default();

        let candidates = match self.ports.store.find_stale_requests(idle_before).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::error!("Escalation sweep could not load stale requests: {}", e);
                return report;
            }
        };

        for candidate in candidates {
            match self.escalate(&candidate, idle_before, now).await {
                Ok(true) => report.escalated += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    log::error!("Failed to escalate request {}: {}", candidate.id, e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Escalation sweep finished: {} escalated, {} skipped, {} failed",
            report.escalated,
            report.skipped,
            report.failed
        );

        report
    }

    /// Returns `Ok(false)` when the request no longer qualifies or has no
    /// stage to move to.
    async fn escalate(
        &self,
        candidate: &AbsenceRequest,
        idle_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let request_id = candidate.id;
        let employee = self.ports.employee(candidate.employee_id).await?;
        let classification = employee.classification();

        let escalation = DatabaseTransaction::run(self.ports.store.as_ref(), move |tx| {
            Box::pin(async move {
                let Some(mut request) = tx.lock_request(request_id).await? else {
                    return Ok(Escalation::Skipped("request no longer exists"));
                };

                // Another path may have acted between the scan and the lock
                if !request.is_pending()
                    || request.current_stage.is_terminal()
                    || request.last_action_at >= idle_before
                {
                    return Ok(Escalation::Skipped("request is no longer idle"));
                }

                let from = request.current_stage;
                let Some(to) = next_stage(from, &classification) else {
                    return Ok(Escalation::Skipped("no stage to escalate to"));
                };

                request.current_stage = to;
                request.escalation_count += 1;
                request.is_escalated = true;
                request.last_action_at = now;
                request.updated_at = now;

                tx.update_request(&request).await?;
                tx.append_escalation(&EscalationLogEntry::idle(request_id, from, to, now))
                    .await?;

                Ok(Escalation::Moved { request, from })
            })
        })
        .await?;

        match escalation {
            Escalation::Moved { request, from } => {
                log::info!(
                    "Escalated request {} from {} to {} (escalation #{})",
                    request.id,
                    from,
                    request.current_stage,
                    request.escalation_count
                );
                self.notifier.announce_stage(&request, &employee).await;
                Ok(true)
            }
            Escalation::Skipped(reason) => {
                log::debug!("Not escalating request {}: {}", request_id, reason);
                Ok(false)
            }
        }
    }
}
