pub mod amount;
pub mod cutoff;
pub mod escalation;
pub mod notifier;
pub mod ports;
pub mod routing;
pub mod workflow;

pub use escalation::{EscalationScheduler, EscalationSettings, SweepReport};
pub use notifier::ApprovalNotifier;
pub use workflow::{TransitionOutcome, WorkflowEngine, WorkflowPorts};
