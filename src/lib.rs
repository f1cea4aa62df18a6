//! Order status and proofing workflow for patient letter mailings.
//!
//! [`workflow::StatusWorkflowEngine`] validates status changes against the
//! transition catalog, tracks proof rounds and escalation, and commits each
//! change together with its audit history entry. Persistence and
//! notification are collaborators behind the [`store::OrderStore`] and
//! [`notify::Notifier`] traits.

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod store;
pub mod telemetry;
pub mod workflow;
