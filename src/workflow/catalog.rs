use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::status::{Role, Status};

const ADMIN: &[Role] = &[Role::Admin];
const USER: &[Role] = &[Role::User];
const ANYONE: &[Role] = &[Role::Admin, Role::User];

/// One legal edge of the order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Status,
    pub to: Status,
    pub allowed_roles: &'static [Role],
    pub requires_comment: bool,
    pub auto_notify: bool,
    pub description: &'static str,
}

impl Transition {
    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }

    /// A customer pushing a proof back for another round.
    pub fn is_change_request(&self) -> bool {
        self.from.is_awaiting_approval()
            && (self.to == Status::ChangesRequested || self.to.is_awaiting_approval())
    }
}

const fn edge(
    from: Status,
    to: Status,
    allowed_roles: &'static [Role],
    requires_comment: bool,
    auto_notify: bool,
    description: &'static str,
) -> Transition {
    Transition {
        from,
        to,
        allowed_roles,
        requires_comment,
        auto_notify,
        description,
    }
}

use Status::*;

/// The lifecycle table. Order is the order edges are offered to callers.
static TRANSITIONS: &[Transition] = &[
    edge(Draft, Submitted, ANYONE, false, true, "Submit order for review"),
    edge(Draft, Cancelled, ANYONE, false, false, "Discard draft order"),
    edge(Submitted, InReview, ADMIN, false, true, "Start design review"),
    edge(Submitted, OnHold, ADMIN, true, true, "Put order on hold"),
    edge(Submitted, Cancelled, ANYONE, true, true, "Cancel order"),
    edge(InReview, WaitingApproval, ADMIN, false, true, "Send proof for customer approval"),
    edge(InReview, OnHold, ADMIN, true, true, "Put order on hold"),
    edge(InReview, Cancelled, ADMIN, true, true, "Cancel order"),
    edge(WaitingApproval, Approved, USER, false, true, "Approve proof"),
    edge(WaitingApproval, WaitingApprovalRev1, USER, true, true, "Request revision 1"),
    edge(WaitingApproval, ChangesRequested, USER, true, true, "Request changes to proof"),
    edge(WaitingApprovalRev1, Approved, USER, false, true, "Approve revised proof"),
    edge(WaitingApprovalRev1, WaitingApprovalRev2, USER, true, true, "Request revision 2"),
    edge(WaitingApprovalRev1, ChangesRequested, USER, true, true, "Request changes to proof"),
    edge(WaitingApprovalRev2, Approved, USER, false, true, "Approve revised proof"),
    edge(WaitingApprovalRev2, WaitingApprovalRev3, USER, true, true, "Request revision 3"),
    edge(WaitingApprovalRev2, ChangesRequested, USER, true, true, "Request changes to proof"),
    edge(WaitingApprovalRev3, Approved, USER, false, true, "Approve final revision"),
    edge(WaitingApprovalRev3, ChangesRequested, USER, true, true, "Request further changes"),
    edge(ChangesRequested, InReview, ADMIN, false, false, "Resume design work"),
    edge(ChangesRequested, Cancelled, ADMIN, true, true, "Cancel order"),
    edge(Approved, InProduction, ADMIN, false, true, "Start production"),
    edge(Approved, OnHold, ADMIN, true, true, "Put order on hold"),
    edge(InProduction, ProductionComplete, ADMIN, false, false, "Mark production complete"),
    edge(InProduction, OnHold, ADMIN, true, true, "Put order on hold"),
    edge(ProductionComplete, Shipped, ADMIN, false, true, "Hand letters to carrier"),
    edge(Shipped, Delivered, ADMIN, false, true, "Confirm delivery"),
    edge(Delivered, Completed, ANYONE, false, false, "Close order"),
    edge(OnHold, InReview, ADMIN, true, true, "Release hold and resume review"),
    edge(OnHold, InProduction, ADMIN, true, true, "Release hold and resume production"),
    edge(OnHold, Cancelled, ADMIN, true, true, "Cancel held order"),
];

/// Why a requested transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// No catalog edge exists for the pair.
    NoSuchTransition,
    /// The edge exists but the role may not take it.
    RoleNotAuthorized,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoSuchTransition => write!(f, "no such transition defined for this pair"),
            Rejection::RoleNotAuthorized => write!(f, "role not authorized for this transition"),
        }
    }
}

/// Lookup structure over the transition table, built once per process.
pub struct TransitionCatalog {
    entries: &'static [Transition],
    by_pair: HashMap<(Status, Status), usize>,
}

static CATALOG: LazyLock<TransitionCatalog> = LazyLock::new(|| TransitionCatalog::new(TRANSITIONS));

impl TransitionCatalog {
    fn new(entries: &'static [Transition]) -> Self {
        let by_pair = entries
            .iter()
            .enumerate()
            .map(|(idx, t)| ((t.from, t.to), idx))
            .collect();
        Self { entries, by_pair }
    }

    /// The process-wide catalog.
    pub fn global() -> &'static TransitionCatalog {
        &CATALOG
    }

    pub fn entries(&self) -> &'static [Transition] {
        self.entries
    }

    pub fn get(&self, from: Status, to: Status) -> Option<&'static Transition> {
        let entries = self.entries;
        self.by_pair.get(&(from, to)).map(|&idx| &entries[idx])
    }

    /// Checks a requested move against the catalog. Pure; no side effects.
    pub fn validate_transition(
        &self,
        from: Status,
        to: Status,
        role: Role,
    ) -> Result<&'static Transition, Rejection> {
        let transition = self.get(from, to).ok_or(Rejection::NoSuchTransition)?;
        if !transition.allows(role) {
            return Err(Rejection::RoleNotAuthorized);
        }
        Ok(transition)
    }

    /// Edges leaving `current` that `role` may take, in catalog order.
    pub fn available_transitions(&self, current: Status, role: Role) -> Vec<&'static Transition> {
        self.entries
            .iter()
            .filter(|t| t.from == current && t.allows(role))
            .collect()
    }
}
