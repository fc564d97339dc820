//! Stage routing and the stage authorization matrix.
//!
//! Both are pure lookups over closed enums so an unknown stage or role can
//! never reach the workflow at runtime.

use crate::database::models::{ApprovalStage, Classification, Role};

/// Stage a freshly created request starts at.
///
/// Blue/gray/union employees go straight to the dedicated HR desk; everybody
/// else starts with their supervisor. The combined supervisor/GM shortcut is
/// applied by the workflow engine on top of this.
pub fn initial_stage(classification: &Classification) -> ApprovalStage {
    if classification.is_blue_gray() {
        ApprovalStage::HrBlueGray
    } else {
        ApprovalStage::Supervisor
    }
}

/// Stage that follows `current` after an approval, or `None` when approving
/// `current` completes the request (Payroll) or `current` is already terminal.
pub fn next_stage(current: ApprovalStage, classification: &Classification) -> Option<ApprovalStage> {
    match current {
        ApprovalStage::Supervisor => Some(ApprovalStage::Manager),
        ApprovalStage::Manager if classification.is_blue_gray() => Some(ApprovalStage::HrBlueGray),
        ApprovalStage::Manager => Some(ApprovalStage::Hr),
        ApprovalStage::Hr | ApprovalStage::HrBlueGray => Some(ApprovalStage::GeneralManager),
        ApprovalStage::GeneralManager => Some(ApprovalStage::Payroll),
        ApprovalStage::Payroll => None,
        ApprovalStage::Completed | ApprovalStage::Declined => None,
    }
}

/// Roles allowed to approve or decline at `stage`
pub fn authorized_roles(stage: ApprovalStage) -> &'static [Role] {
    match stage {
        ApprovalStage::Supervisor => &[Role::Supervisor, Role::SupervisorGm],
        ApprovalStage::Manager | ApprovalStage::GeneralManager => {
            &[Role::Manager, Role::SupervisorGm]
        }
        ApprovalStage::Hr | ApprovalStage::HrBlueGray => {
            &[Role::Hr, Role::HrPayroll, Role::HrBlueGraySpecialist]
        }
        ApprovalStage::Payroll => &[Role::Payroll, Role::HrPayroll],
        ApprovalStage::Completed | ApprovalStage::Declined => &[],
    }
}

pub fn is_authorized(role: Role, stage: ApprovalStage) -> bool {
    authorized_roles(stage).contains(&role)
}

/// Role groups notified when a request reaches `stage`.
///
/// Empty for line-manager stages, which are routed to the specific people
/// assigned to the employee instead.
pub fn approver_group(stage: ApprovalStage) -> &'static [Role] {
    match stage {
        ApprovalStage::Hr => &[Role::Hr, Role::HrPayroll],
        ApprovalStage::HrBlueGray => &[Role::HrBlueGraySpecialist, Role::Hr, Role::HrPayroll],
        ApprovalStage::Payroll => &[Role::Payroll, Role::HrPayroll],
        ApprovalStage::Supervisor
        | ApprovalStage::Manager
        | ApprovalStage::GeneralManager
        | ApprovalStage::Completed
        | ApprovalStage::Declined => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::WorkerCategory;

    fn white() -> Classification {
        Classification::new(WorkerCategory::WhiteCollar, false)
    }

    fn blue() -> Classification {
        Classification::new(WorkerCategory::BlueCollar, false)
    }

    #[test]
    fn test_initial_stage_depends_on_classification() {
        assert_eq!(initial_stage(&white()), ApprovalStage::Supervisor);
        assert_eq!(initial_stage(&blue()), ApprovalStage::HrBlueGray);
        assert_eq!(
            initial_stage(&Classification::new(WorkerCategory::GrayCollar, false)),
            ApprovalStage::HrBlueGray
        );
        assert_eq!(
            initial_stage(&Classification::new(WorkerCategory::WhiteCollar, true)),
            ApprovalStage::HrBlueGray
        );
    }

    #[test]
    fn test_white_collar_chain() {
        let mut stage = initial_stage(&white());
        let mut visited = vec![stage];
        while let Some(next) = next_stage(stage, &white()) {
            visited.push(next);
            stage = next;
        }
        assert_eq!(
            visited,
            vec![
                ApprovalStage::Supervisor,
                ApprovalStage::Manager,
                ApprovalStage::Hr,
                ApprovalStage::GeneralManager,
                ApprovalStage::Payroll,
            ]
        );
    }

    #[test]
    fn test_manager_routes_blue_gray_to_dedicated_hr() {
        assert_eq!(
            next_stage(ApprovalStage::Manager, &blue()),
            Some(ApprovalStage::HrBlueGray)
        );
        assert_eq!(
            next_stage(ApprovalStage::HrBlueGray, &blue()),
            Some(ApprovalStage::GeneralManager)
        );
    }

    #[test]
    fn test_routing_only_moves_forward() {
        for classification in [white(), blue()] {
            for stage in ApprovalStage::ALL {
                if let Some(next) = next_stage(*stage, &classification) {
                    assert!(next.rank() > stage.rank(), "{} -> {}", stage, next);
                }
            }
        }
    }

    #[test]
    fn test_terminal_stages_have_no_successor_or_approvers() {
        for stage in [ApprovalStage::Completed, ApprovalStage::Declined] {
            assert_eq!(next_stage(stage, &white()), None);
            assert!(authorized_roles(stage).is_empty());
        }
        assert_eq!(next_stage(ApprovalStage::Payroll, &white()), None);
    }

    #[test]
    fn test_authorization_matrix() {
        assert!(is_authorized(Role::Supervisor, ApprovalStage::Supervisor));
        assert!(is_authorized(Role::SupervisorGm, ApprovalStage::Supervisor));
        assert!(!is_authorized(Role::Manager, ApprovalStage::Supervisor));

        assert!(is_authorized(Role::Manager, ApprovalStage::GeneralManager));
        assert!(is_authorized(Role::SupervisorGm, ApprovalStage::Manager));
        assert!(!is_authorized(Role::Hr, ApprovalStage::Manager));

        assert!(is_authorized(Role::HrBlueGraySpecialist, ApprovalStage::Hr));
        assert!(is_authorized(Role::HrPayroll, ApprovalStage::HrBlueGray));
        assert!(!is_authorized(Role::Payroll, ApprovalStage::Hr));

        assert!(is_authorized(Role::Payroll, ApprovalStage::Payroll));
        assert!(is_authorized(Role::HrPayroll, ApprovalStage::Payroll));
        assert!(!is_authorized(Role::Employee, ApprovalStage::Payroll));
    }

    #[test]
    fn test_group_approvers_are_authorized_for_their_stage() {
        for stage in ApprovalStage::ALL {
            for role in approver_group(*stage) {
                assert!(is_authorized(*role, *stage), "{} at {}", role, stage);
            }
        }
    }
}
