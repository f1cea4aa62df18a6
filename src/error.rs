use thiserror::Error;

use crate::workflow::{EscalationAction, Rejection, Role, Status};

/// Typed rejections returned by the workflow engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot move order from {from} to {to}: {reason}")]
    InvalidTransition {
        from: Status,
        to: Status,
        reason: Rejection,
    },

    #[error("A comment is required to move an order from {from} to {to}")]
    MissingRequiredComment { from: Status, to: Status },

    #[error("Notes are required for {action}")]
    MissingEscalationNotes { action: EscalationAction },

    #[error("{role} users may not {action}")]
    Unauthorized { role: Role, action: &'static str },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order has no outstanding escalation")]
    NoPendingEscalation,

    #[error("Proofs cannot be uploaded while the order is {status}")]
    ProofNotAccepted { status: Status },

    #[error("Order has used {rounds} proof rounds; resolve the escalation before uploading another")]
    RevisionLimitReached { rounds: u32 },

    #[error("Proof round {round} must be sent for approval with a proof upload")]
    ProofUploadRequired { round: u32 },

    #[error("Persistence error: {0}")]
    Persistence(#[source] StoreError),
}

impl WorkflowError {
    /// Stable identifier exposed to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::InvalidTransition { .. } => "InvalidTransition",
            WorkflowError::MissingRequiredComment { .. }
            | WorkflowError::MissingEscalationNotes { .. } => "MissingRequiredComment",
            WorkflowError::Unauthorized { .. } => "Unauthorized",
            WorkflowError::OrderNotFound(_) => "OrderNotFound",
            WorkflowError::NoPendingEscalation => "NoPendingEscalation",
            WorkflowError::ProofNotAccepted { .. } => "ProofNotAccepted",
            WorkflowError::RevisionLimitReached { .. } => "RevisionLimitReached",
            WorkflowError::ProofUploadRequired { .. } => "ProofUploadRequired",
            WorkflowError::Persistence(_) => "PersistenceFailure",
        }
    }

    /// Text safe to show an end user. Storage details never leak.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Persistence(_) => {
                "The order could not be saved. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WorkflowError::OrderNotFound(id),
            other => WorkflowError::Persistence(other),
        }
    }
}

/// Failures reported by an order store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order {id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict { id: String, expected: u64, found: u64 },

    #[error("Order already exists: {0}")]
    Duplicate(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
