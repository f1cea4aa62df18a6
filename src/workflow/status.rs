use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every status an order can be in.
///
/// Wire names are kebab-case (`waiting-approval-rev1`) so they line up with
/// what the dashboard and stored history already use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Draft,
    Submitted,
    InReview,
    WaitingApproval,
    WaitingApprovalRev1,
    WaitingApprovalRev2,
    WaitingApprovalRev3,
    Approved,
    InProduction,
    ProductionComplete,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    OnHold,
    ChangesRequested,
}

impl Status {
    pub const ALL: [Status; 16] = [
        Status::Draft,
        Status::Submitted,
        Status::InReview,
        Status::WaitingApproval,
        Status::WaitingApprovalRev1,
        Status::WaitingApprovalRev2,
        Status::WaitingApprovalRev3,
        Status::Approved,
        Status::InProduction,
        Status::ProductionComplete,
        Status::Shipped,
        Status::Delivered,
        Status::Completed,
        Status::Cancelled,
        Status::OnHold,
        Status::ChangesRequested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Submitted => "submitted",
            Status::InReview => "in-review",
            Status::WaitingApproval => "waiting-approval",
            Status::WaitingApprovalRev1 => "waiting-approval-rev1",
            Status::WaitingApprovalRev2 => "waiting-approval-rev2",
            Status::WaitingApprovalRev3 => "waiting-approval-rev3",
            Status::Approved => "approved",
            Status::InProduction => "in-production",
            Status::ProductionComplete => "production-complete",
            Status::Shipped => "shipped",
            Status::Delivered => "delivered",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
            Status::OnHold => "on-hold",
            Status::ChangesRequested => "changes-requested",
        }
    }

    /// `completed` and `cancelled` end an order's life.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }

    /// True for `waiting-approval` and its three revision variants.
    pub fn is_awaiting_approval(&self) -> bool {
        self.approval_round().is_some()
    }

    /// Which proof round a waiting-approval status represents (1-based).
    pub fn approval_round(&self) -> Option<u32> {
        match self {
            Status::WaitingApproval => Some(1),
            Status::WaitingApprovalRev1 => Some(2),
            Status::WaitingApprovalRev2 => Some(3),
            Status::WaitingApprovalRev3 => Some(4),
            _ => None,
        }
    }

    /// Statuses from which an admin may upload a new design proof.
    pub fn accepts_proof(&self) -> bool {
        matches!(self, Status::InReview | Status::ChangesRequested) || self.is_awaiting_approval()
    }

    /// Maps a proof round to the status the order waits in afterwards.
    ///
    /// Round 0 has no proof and therefore no waiting status. Rounds past the
    /// last revision status stay on `waiting-approval-rev3`.
    pub fn for_revision_round(round: u32) -> Option<Status> {
        match round {
            0 => None,
            1 => Some(Status::WaitingApproval),
            2 => Some(Status::WaitingApprovalRev1),
            3 => Some(Status::WaitingApprovalRev2),
            _ => Some(Status::WaitingApprovalRev3),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Role of the principal acting on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
