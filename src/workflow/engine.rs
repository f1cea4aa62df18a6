use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::catalog::{Rejection, Transition, TransitionCatalog};
use super::order::{Actor, Escalation, HistoryEvent, Order, StatusHistoryEntry};
use super::revision::{EscalationAction, ProofUpload, RevisionPolicy};
use super::status::{Role, Status};
use crate::config::RetryConfig;
use crate::error::{StoreError, WorkflowError};
use crate::notify::{Notification, Notifier, NotifyError, Recipient};
use crate::store::OrderStore;

/// Tunables for [`StatusWorkflowEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub retry: RetryConfig,
    pub revision: RevisionPolicy,
    pub notify_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            revision: RevisionPolicy::default(),
            notify_timeout_ms: 5000,
        }
    }
}

/// A committed change.
#[derive(Debug)]
pub struct Applied {
    pub order: Order,
    pub entry: StatusHistoryEntry,
    /// Background notification task, if the change notifies anyone.
    /// Its outcome never affects the change itself.
    pub notification: Option<JoinHandle<()>>,
}

/// What a change will write, computed against a freshly read order.
struct Planned {
    next: Order,
    entry: StatusHistoryEntry,
    notification: Option<Notification>,
}

/// Decides and realizes order status changes.
///
/// Validation is pure and runs against the process-wide
/// [`TransitionCatalog`]. Realizing a change commits the new order state and
/// its history entry as one unit through the [`OrderStore`], then hands any
/// notification to the [`Notifier`] on a background task.
pub struct StatusWorkflowEngine<S, N> {
    store: S,
    notifier: Arc<N>,
    catalog: &'static TransitionCatalog,
    settings: EngineSettings,
}

/// Blank comments count as no comment at all.
fn normalize_comment(comments: Option<&str>) -> Option<String> {
    comments
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

impl<S: OrderStore, N: Notifier> StatusWorkflowEngine<S, N> {
    pub fn new(store: S, notifier: N, settings: EngineSettings) -> Self {
        Self {
            store,
            notifier: Arc::new(notifier),
            catalog: TransitionCatalog::global(),
            settings,
        }
    }

    pub fn validate_transition(
        &self,
        from: Status,
        to: Status,
        role: Role,
    ) -> Result<&'static Transition, Rejection> {
        self.catalog.validate_transition(from, to, role)
    }

    pub fn list_available_transitions(&self, current: Status, role: Role) -> Vec<&'static Transition> {
        self.catalog.available_transitions(current, role)
    }

    /// Opens a new order in `draft` with no proof rounds and no escalation.
    pub async fn create_order(
        &self,
        practice_id: impl Into<String>,
        customer_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Order, WorkflowError> {
        let order = Order::new(practice_id.into(), customer_id.into(), title.into());
        self.store.insert_order(&order).await?;
        info!(order_id = %order.id, practice_id = %order.practice_id, "order created");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, WorkflowError> {
        Ok(self.store.get_order(order_id).await?)
    }

    /// History in the order it was recorded.
    pub async fn history(&self, order_id: &str) -> Result<Vec<StatusHistoryEntry>, WorkflowError> {
        Ok(self.store.get_history(order_id).await?)
    }

    /// Moves an order along one catalog edge.
    ///
    /// An admin edge into a waiting-approval status sends a proof, so it
    /// counts as a proof round. It is only accepted when it lands on that
    /// round's status; later rounds go through [`Self::upload_proof`].
    pub async fn apply_transition(
        &self,
        order_id: &str,
        to: Status,
        actor: &Actor,
        comments: Option<&str>,
    ) -> Result<Applied, WorkflowError> {
        let comments = normalize_comment(comments);
        let applied = self
            .commit_planned(order_id, |current| {
                let transition = self
                    .catalog
                    .validate_transition(current.status, to, actor.role)
                    .map_err(|reason| {
                        debug!(order_id, from = %current.status, %to, role = %actor.role, %reason, "transition rejected");
                        WorkflowError::InvalidTransition {
                            from: current.status,
                            to,
                            reason,
                        }
                    })?;
                if transition.requires_comment && comments.is_none() {
                    return Err(WorkflowError::MissingRequiredComment {
                        from: current.status,
                        to,
                    });
                }

                let proof = if to.is_awaiting_approval() && !transition.is_change_request() {
                    let plan = self.settings.revision.plan_upload(current)?;
                    if plan.status != to {
                        debug!(order_id, %to, round = plan.round, "proof round needs an upload");
                        return Err(WorkflowError::ProofUploadRequired { round: plan.round });
                    }
                    Some(plan)
                } else {
                    None
                };
                let escalation_flagged = !current.needs_escalation()
                    && (proof.is_some_and(|plan| plan.flag_escalation)
                        || self.settings.revision.flags_change_request(current, transition));

                let mut next = current.clone();
                next.status = to;
                next.updated_at = Utc::now();
                if let Some(plan) = proof {
                    next.revision_round = plan.round;
                }
                if escalation_flagged {
                    next.escalation = Escalation::Required;
                }

                let entry = StatusHistoryEntry::record(
                    &next,
                    current.status,
                    actor,
                    comments.clone(),
                    HistoryEvent::StatusChange { escalation_flagged },
                );
                let notification = transition.auto_notify.then(|| {
                    Notification::about(
                        Recipient::counterpart_of(actor.role),
                        &next,
                        current.status,
                        transition.description,
                        comments.clone(),
                    )
                });
                Ok(Planned {
                    next,
                    entry,
                    notification,
                })
            })
            .await?;

        info!(
            order_id,
            from = %applied.entry.from_status,
            to = %applied.entry.to_status,
            actor = %actor.id,
            role = %actor.role,
            "order status changed"
        );
        if let HistoryEvent::StatusChange {
            escalation_flagged: true,
        } = applied.entry.metadata
        {
            warn!(order_id, round = applied.order.revision_round, "order needs escalation");
        }
        Ok(applied)
    }

    /// Records a new design proof and parks the order awaiting approval.
    pub async fn upload_proof(
        &self,
        order_id: &str,
        actor: &Actor,
        upload: ProofUpload,
    ) -> Result<Applied, WorkflowError> {
        if actor.role != Role::Admin {
            return Err(WorkflowError::Unauthorized {
                role: actor.role,
                action: "upload proofs",
            });
        }
        let comments = normalize_comment(upload.comments.as_deref());

        let applied = self
            .commit_planned(order_id, |current| {
                let plan = self.settings.revision.plan_upload(current)?;
                let escalation_flagged = plan.flag_escalation && !current.needs_escalation();

                let mut next = current.clone();
                next.status = plan.status;
                next.revision_round = plan.round;
                next.updated_at = Utc::now();
                if escalation_flagged {
                    next.escalation = Escalation::Required;
                }

                let entry = StatusHistoryEntry::record(
                    &next,
                    current.status,
                    actor,
                    comments.clone(),
                    HistoryEvent::ProofUploaded {
                        round: plan.round,
                        artifact: upload.artifact.clone(),
                        escalation_flagged,
                    },
                );
                let notification = Notification::about(
                    Recipient::Customer,
                    &next,
                    current.status,
                    format!("Proof {} is ready for review", plan.round),
                    comments.clone(),
                );
                Ok(Planned {
                    next,
                    entry,
                    notification: Some(notification),
                })
            })
            .await?;

        info!(
            order_id,
            round = applied.order.revision_round,
            status = %applied.order.status,
            artifact = %upload.artifact,
            "proof uploaded"
        );
        if applied.order.needs_escalation() {
            warn!(order_id, round = applied.order.revision_round, "order needs escalation");
        }
        Ok(applied)
    }

    /// Admin response to an outstanding escalation. Status is unchanged.
    pub async fn resolve_escalation(
        &self,
        order_id: &str,
        actor: &Actor,
        action: EscalationAction,
        notes: Option<&str>,
    ) -> Result<Applied, WorkflowError> {
        if actor.role != Role::Admin {
            return Err(WorkflowError::Unauthorized {
                role: actor.role,
                action: "resolve escalations",
            });
        }
        let notes = normalize_comment(notes);
        if notes.is_none() && !action.requires_notes() {
            debug!(order_id, %action, "escalation action recorded without notes");
        }

        let applied = self
            .commit_planned(order_id, |current| {
                if !current.needs_escalation() {
                    return Err(WorkflowError::NoPendingEscalation);
                }
                if action.requires_notes() && notes.is_none() {
                    return Err(WorkflowError::MissingEscalationNotes { action });
                }

                let mut next = current.clone();
                next.escalation = action.outcome();
                next.updated_at = Utc::now();

                let entry = StatusHistoryEntry::record(
                    &next,
                    current.status,
                    actor,
                    notes.clone(),
                    HistoryEvent::Escalation { action },
                );
                let notification = match action {
                    EscalationAction::Resolve => None,
                    EscalationAction::ContactCustomer => Some(Notification::about(
                        Recipient::Customer,
                        &next,
                        current.status,
                        "Our team would like to discuss your proof revisions",
                        notes.clone(),
                    )),
                    EscalationAction::EscalateToManager => Some(Notification::about(
                        Recipient::Manager,
                        &next,
                        current.status,
                        format!("Order escalated after {} proof rounds", next.revision_round),
                        notes.clone(),
                    )),
                };
                Ok(Planned {
                    next,
                    entry,
                    notification,
                })
            })
            .await?;

        info!(order_id, %action, actor = %actor.id, escalation = ?applied.order.escalation, "escalation handled");
        Ok(applied)
    }

    /// Reads the order, plans the change and commits it. A lost optimistic
    /// concurrency race re-reads and re-plans, so the change is always
    /// validated against the status it is applied to.
    async fn commit_planned<F>(&self, order_id: &str, plan: F) -> Result<Applied, WorkflowError>
    where
        F: Fn(&Order) -> Result<Planned, WorkflowError> + Send + Sync,
    {
        let retry = self.settings.retry;
        let mut attempt = 0;
        loop {
            let current = self.store.get_order(order_id).await?;
            let planned = plan(&current)?;

            match self
                .store
                .commit_transition(&current, &planned.next, &planned.entry)
                .await
            {
                Ok(order) => {
                    let notification = planned.notification.map(|n| self.dispatch(n));
                    return Ok(Applied {
                        order,
                        entry: planned.entry,
                        notification,
                    });
                }
                Err(StoreError::Conflict { expected, found, .. }) if attempt < retry.max_retries => {
                    attempt += 1;
                    let delay_ms = retry.delay_for_attempt(attempt);
                    warn!(
                        order_id,
                        expected,
                        found,
                        attempt,
                        max = retry.max_retries,
                        delay_ms,
                        "order changed underneath us, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout_ms = self.settings.notify_timeout_ms;
        tokio::spawn(async move {
            let result = match timeout(Duration::from_millis(timeout_ms), notifier.notify(&notification)).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout { timeout_ms }),
            };
            if let Err(err) = result {
                warn!(
                    order_id = %notification.order_id,
                    recipient = ?notification.recipient,
                    error = %err,
                    "notification failed; change remains committed"
                );
            }
        })
    }
}
