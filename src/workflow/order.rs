use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::revision::EscalationAction;
use super::status::{Role, Status};

/// Escalation flag carried alongside the order status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Escalation {
    #[default]
    None,
    /// Proof cycling passed the threshold; an admin has to step in.
    Required,
    /// Handed to a manager; still outstanding.
    ForwardedToManager,
}

impl Escalation {
    pub fn is_pending(&self) -> bool {
        !matches!(self, Escalation::None)
    }
}

/// A patient-letter order moving through the proofing workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub practice_id: String,
    pub customer_id: String,
    pub title: String,
    pub status: Status,
    /// Number of proofs uploaded so far. Never decreases.
    #[serde(default)]
    pub revision_round: u32,
    #[serde(default)]
    pub escalation: Escalation,
    /// Optimistic concurrency token, bumped by the store on every save.
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(practice_id: String, customer_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            practice_id,
            customer_id,
            title,
            status: Status::Draft,
            revision_round: 0,
            escalation: Escalation::None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn needs_escalation(&self) -> bool {
        self.escalation.is_pending()
    }
}

/// The principal requesting a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Admin,
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
        }
    }
}

/// What produced a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum HistoryEvent {
    /// A catalog transition.
    StatusChange {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        escalation_flagged: bool,
    },
    /// An admin uploaded a design proof.
    ProofUploaded {
        round: u32,
        artifact: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        escalation_flagged: bool,
    },
    /// An admin acted on an outstanding escalation.
    Escalation { action: EscalationAction },
}

/// Immutable audit record of one realized change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: String,
    pub order_id: String,
    pub from_status: Status,
    pub to_status: Status,
    pub changed_by: String,
    pub changed_by_role: Role,
    pub comments: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub revision_round: u32,
    pub metadata: HistoryEvent,
}

impl StatusHistoryEntry {
    pub fn record(
        order: &Order,
        from_status: Status,
        actor: &Actor,
        comments: Option<String>,
        metadata: HistoryEvent,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            from_status,
            to_status: order.status,
            changed_by: actor.id.clone(),
            changed_by_role: actor.role,
            comments,
            timestamp: order.updated_at,
            revision_round: order.revision_round,
            metadata,
        }
    }
}
