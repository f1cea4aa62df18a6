mod catalog;
mod engine;
mod order;
mod revision;
mod status;

pub use catalog::{Rejection, Transition, TransitionCatalog};
pub use engine::{Applied, EngineSettings, StatusWorkflowEngine};
pub use order::{Actor, Escalation, HistoryEvent, Order, StatusHistoryEntry};
pub use revision::{EscalationAction, ProofPlan, ProofUpload, RevisionPolicy};
pub use status::{ParseStatusError, Role, Status};
