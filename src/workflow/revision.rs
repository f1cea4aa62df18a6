//! Proof-round overlay on top of the status catalog.
//!
//! Every admin proof upload bumps [`Order::revision_round`] and parks the
//! order in the waiting-approval status for that round. Once proof cycling
//! passes the escalation threshold the order carries an [`Escalation`] flag
//! until an admin acts on it through [`EscalationAction`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::catalog::Transition;
use super::order::{Escalation, Order};
use super::status::Status;
use crate::error::WorkflowError;

/// A design proof an admin attaches to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofUpload {
    /// File-store reference for the proof artifact.
    pub artifact: String,
    pub comments: Option<String>,
}

/// Admin responses to an outstanding escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationAction {
    Resolve,
    ContactCustomer,
    EscalateToManager,
}

impl EscalationAction {
    pub fn requires_notes(&self) -> bool {
        matches!(self, EscalationAction::ContactCustomer)
    }

    /// Flag state after the action is recorded.
    pub fn outcome(&self) -> Escalation {
        match self {
            EscalationAction::Resolve | EscalationAction::ContactCustomer => Escalation::None,
            EscalationAction::EscalateToManager => Escalation::ForwardedToManager,
        }
    }
}

impl fmt::Display for EscalationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationAction::Resolve => write!(f, "RESOLVE"),
            EscalationAction::ContactCustomer => write!(f, "CONTACT_CUSTOMER"),
            EscalationAction::EscalateToManager => write!(f, "ESCALATE_TO_MANAGER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown escalation action: {0}")]
pub struct ParseEscalationActionError(pub String);

impl FromStr for EscalationAction {
    type Err = ParseEscalationActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "RESOLVE" => Ok(EscalationAction::Resolve),
            "CONTACT_CUSTOMER" => Ok(EscalationAction::ContactCustomer),
            "ESCALATE_TO_MANAGER" | "ESCALATE" => Ok(EscalationAction::EscalateToManager),
            _ => Err(ParseEscalationActionError(s.to_string())),
        }
    }
}

/// Result of planning a proof upload against the current order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofPlan {
    pub round: u32,
    pub status: Status,
    pub flag_escalation: bool,
}

/// Thresholds driving the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionPolicy {
    /// Round at which further cycling needs an admin to step in.
    pub escalation_threshold: u32,
    /// Rounds with their own waiting-approval status.
    pub max_proof_rounds: u32,
}

impl Default for RevisionPolicy {
    fn default() -> Self {
        Self {
            escalation_threshold: 3,
            max_proof_rounds: 4,
        }
    }
}

impl RevisionPolicy {
    /// Decides where an upload takes the order, or why it cannot happen.
    pub fn plan_upload(&self, order: &Order) -> Result<ProofPlan, WorkflowError> {
        if !order.status.accepts_proof() {
            return Err(WorkflowError::ProofNotAccepted {
                status: order.status,
            });
        }
        if order.needs_escalation() && order.revision_round >= self.max_proof_rounds {
            return Err(WorkflowError::RevisionLimitReached {
                rounds: order.revision_round,
            });
        }

        let round = order.revision_round.saturating_add(1);
        let status = Status::for_revision_round(round).unwrap_or(Status::WaitingApproval);
        Ok(ProofPlan {
            round,
            status,
            flag_escalation: order.revision_round >= self.escalation_threshold,
        })
    }

    /// A customer asking for yet another round past the threshold.
    pub fn flags_change_request(&self, order: &Order, transition: &Transition) -> bool {
        transition.is_change_request() && order.revision_round >= self.escalation_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::catalog::TransitionCatalog;

    fn order_at(status: Status, round: u32) -> Order {
        let mut order = Order::new("p".into(), "c".into(), "Flu shot reminder".into());
        order.status = status;
        order.revision_round = round;
        order
    }

    #[test]
    fn first_upload_waits_for_approval() {
        let plan = RevisionPolicy::default()
            .plan_upload(&order_at(Status::InReview, 0))
            .unwrap();
        assert_eq!(
            plan,
            ProofPlan {
                round: 1,
                status: Status::WaitingApproval,
                flag_escalation: false,
            }
        );
    }

    #[test]
    fn later_uploads_map_to_revision_statuses() {
        let policy = RevisionPolicy::default();
        let plan = policy.plan_upload(&order_at(Status::ChangesRequested, 1)).unwrap();
        assert_eq!((plan.round, plan.status), (2, Status::WaitingApprovalRev1));
        let plan = policy.plan_upload(&order_at(Status::WaitingApprovalRev1, 2)).unwrap();
        assert_eq!((plan.round, plan.status), (3, Status::WaitingApprovalRev2));
        assert!(!plan.flag_escalation);
    }

    #[test]
    fn fourth_upload_flags_escalation() {
        let plan = RevisionPolicy::default()
            .plan_upload(&order_at(Status::ChangesRequested, 3))
            .unwrap();
        assert_eq!(plan.round, 4);
        assert_eq!(plan.status, Status::WaitingApprovalRev3);
        assert!(plan.flag_escalation);
    }

    #[test]
    fn upload_rejected_outside_proofing() {
        let err = RevisionPolicy::default()
            .plan_upload(&order_at(Status::Approved, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::ProofNotAccepted {
                status: Status::Approved
            }
        ));
    }

    #[test]
    fn upload_blocked_at_limit_while_escalated() {
        let policy = RevisionPolicy::default();
        let mut order = order_at(Status::ChangesRequested, 4);
        order.escalation = Escalation::Required;
        assert!(matches!(
            policy.plan_upload(&order),
            Err(WorkflowError::RevisionLimitReached { rounds: 4 })
        ));

        order.escalation = Escalation::None;
        let plan = policy.plan_upload(&order).unwrap();
        assert_eq!(plan.round, 5);
        assert_eq!(plan.status, Status::WaitingApprovalRev3);
    }

    #[test]
    fn change_requests_past_threshold_flag() {
        let policy = RevisionPolicy::default();
        let catalog = TransitionCatalog::global();
        let request = catalog
            .get(Status::WaitingApprovalRev2, Status::ChangesRequested)
            .unwrap();
        let approve = catalog
            .get(Status::WaitingApprovalRev2, Status::Approved)
            .unwrap();

        assert!(!policy.flags_change_request(&order_at(Status::WaitingApprovalRev2, 2), request));
        assert!(policy.flags_change_request(&order_at(Status::WaitingApprovalRev2, 3), request));
        assert!(!policy.flags_change_request(&order_at(Status::WaitingApprovalRev2, 3), approve));
    }

    #[test]
    fn escalation_action_outcomes() {
        assert_eq!(EscalationAction::Resolve.outcome(), Escalation::None);
        assert_eq!(EscalationAction::ContactCustomer.outcome(), Escalation::None);
        assert_eq!(
            EscalationAction::EscalateToManager.outcome(),
            Escalation::ForwardedToManager
        );
        assert!(EscalationAction::ContactCustomer.requires_notes());
        assert!(!EscalationAction::Resolve.requires_notes());
    }

    #[test]
    fn escalation_action_parsing() {
        assert_eq!(
            "contact-customer".parse::<EscalationAction>().unwrap(),
            EscalationAction::ContactCustomer
        );
        assert_eq!(
            "ESCALATE_TO_MANAGER".parse::<EscalationAction>().unwrap(),
            EscalationAction::EscalateToManager
        );
        assert!("ignore".parse::<EscalationAction>().is_err());
        assert_eq!(
            serde_json::to_string(&EscalationAction::ContactCustomer).unwrap(),
            "\"CONTACT_CUSTOMER\""
        );
    }
}
