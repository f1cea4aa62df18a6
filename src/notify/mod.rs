//! Notification collaborator.
//!
//! The engine hands a [`Notification`] to a [`Notifier`] after a change has
//! been committed. Delivery, retries and templating belong to the notifier;
//! the engine only logs failures.

pub mod error;
pub mod webhook;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::NotifyError;
pub use webhook::WebhookNotifier;

use crate::workflow::{Order, Role, Status};

/// Who should hear about a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recipient {
    /// The practice user who owns the order.
    Customer,
    /// The production/ops team.
    Operations,
    /// Management, for forwarded escalations.
    Manager,
}

impl Recipient {
    /// The party opposite the actor.
    pub fn counterpart_of(role: Role) -> Self {
        match role {
            Role::Admin => Recipient::Customer,
            Role::User => Recipient::Operations,
        }
    }
}

/// Payload describing one committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: Recipient,
    pub order_id: String,
    pub practice_id: String,
    pub customer_id: String,
    pub order_title: String,
    pub from_status: Status,
    pub to_status: Status,
    pub summary: String,
    pub comments: Option<String>,
    pub revision_round: u32,
    pub occurred_at: DateTime<Utc>,
}

impl Notification {
    pub fn about(
        recipient: Recipient,
        order: &Order,
        from_status: Status,
        summary: impl Into<String>,
        comments: Option<String>,
    ) -> Self {
        Self {
            recipient,
            order_id: order.id.clone(),
            practice_id: order.practice_id.clone(),
            customer_id: order.customer_id.clone(),
            order_title: order.title.clone(),
            from_status,
            to_status: order.status,
            summary: summary.into(),
            comments,
            revision_round: order.revision_round,
            occurred_at: order.updated_at,
        }
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            recipient = ?notification.recipient,
            order_id = %notification.order_id,
            from = %notification.from_status,
            to = %notification.to_status,
            "{}",
            notification.summary
        );
        Ok(())
    }
}

/// Notifier chosen at startup from configuration.
#[derive(Debug)]
pub enum AnyNotifier {
    Log(LogNotifier),
    Webhook(WebhookNotifier),
}

impl AnyNotifier {
    pub fn from_webhook_url(url: Option<&str>, timeout_ms: u64) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => {
                AnyNotifier::Webhook(WebhookNotifier::new(url.to_string(), timeout_ms))
            }
            _ => AnyNotifier::Log(LogNotifier),
        }
    }
}

impl Notifier for AnyNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        match self {
            AnyNotifier::Log(n) => n.notify(notification).await,
            AnyNotifier::Webhook(n) => n.notify(notification).await,
        }
    }
}
