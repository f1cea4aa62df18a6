//! Request and response shapes for the dashboard and status-management UI.
//!
//! Handlers here translate between caller payloads and the engine. Every
//! engine failure becomes a `{ "ok": false, "errorKind", "message" }` body;
//! storage details never reach the caller.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::notify::Notifier;
use crate::store::OrderStore;
use crate::workflow::{
    Actor, Applied, EscalationAction, Order, ProofUpload, Role, Status, StatusHistoryEntry,
    StatusWorkflowEngine,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub order_id: String,
    pub new_status: Status,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub order_id: String,
    pub artifact: String,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRequest {
    pub order_id: String,
    pub action: EscalationAction,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedBody {
    pub ok: bool,
    pub order: Order,
    pub history_entry: StatusHistoryEntry,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedBody {
    pub ok: bool,
    pub error_kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TransitionResponse {
    Applied(AppliedBody),
    Rejected(RejectedBody),
}

impl TransitionResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, TransitionResponse::Applied(_))
    }
}

impl From<Result<Applied, WorkflowError>> for TransitionResponse {
    fn from(result: Result<Applied, WorkflowError>) -> Self {
        match result {
            // The notification task keeps running detached.
            Ok(applied) => TransitionResponse::Applied(AppliedBody {
                ok: true,
                order: applied.order,
                history_entry: applied.entry,
            }),
            Err(err) => TransitionResponse::Rejected(RejectedBody {
                ok: false,
                error_kind: err.kind(),
                message: err.user_message(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransition {
    pub to: Status,
    pub requires_comment: bool,
    pub description: &'static str,
}

/// What the dashboard renders for one order and viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub order_id: String,
    pub current_status: Status,
    pub revision_round: u32,
    pub needs_escalation: bool,
    pub available_transitions: Vec<AvailableTransition>,
    /// Newest first.
    pub history: Vec<StatusHistoryEntry>,
}

pub async fn handle_transition<S: OrderStore, N: Notifier>(
    engine: &StatusWorkflowEngine<S, N>,
    actor: &Actor,
    request: &TransitionRequest,
) -> TransitionResponse {
    engine
        .apply_transition(
            &request.order_id,
            request.new_status,
            actor,
            request.comments.as_deref(),
        )
        .await
        .into()
}

pub async fn handle_proof_upload<S: OrderStore, N: Notifier>(
    engine: &StatusWorkflowEngine<S, N>,
    actor: &Actor,
    request: &ProofRequest,
) -> TransitionResponse {
    let upload = ProofUpload {
        artifact: request.artifact.clone(),
        comments: request.comments.clone(),
    };
    engine
        .upload_proof(&request.order_id, actor, upload)
        .await
        .into()
}

pub async fn handle_escalation<S: OrderStore, N: Notifier>(
    engine: &StatusWorkflowEngine<S, N>,
    actor: &Actor,
    request: &EscalationRequest,
) -> TransitionResponse {
    engine
        .resolve_escalation(
            &request.order_id,
            actor,
            request.action,
            request.notes.as_deref(),
        )
        .await
        .into()
}

pub async fn status_view<S: OrderStore, N: Notifier>(
    engine: &StatusWorkflowEngine<S, N>,
    order_id: &str,
    role: Role,
) -> Result<StatusView, WorkflowError> {
    let order = engine.get_order(order_id).await?;
    let mut history = engine.history(order_id).await?;
    history.reverse();

    let available_transitions = engine
        .list_available_transitions(order.status, role)
        .into_iter()
        .map(|t| AvailableTransition {
            to: t.to,
            requires_comment: t.requires_comment,
            description: t.description,
        })
        .collect();

    Ok(StatusView {
        order_id: order.id.clone(),
        current_status: order.status,
        revision_round: order.revision_round,
        needs_escalation: order.needs_escalation(),
        available_transitions,
        history,
    })
}
