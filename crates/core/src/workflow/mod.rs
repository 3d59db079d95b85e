//! Document approval workflow management.
//!
//! A workflow walks a document through a fixed, linear sequence of
//! role-gated steps. Each step is taken by an actor holding exactly the
//! step's role; a rejection at any step ends the workflow.
//!
//! # Modules
//!
//! - `types` - Roles, approval paths, workflows and actions
//! - `error` - Workflow-specific error types
//! - `service` - Pure state transition rules
//! - `engine` - Repository-backed advance with compare-and-swap commits

pub mod engine;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use engine::{TransitionCommit, WorkflowEngine, WorkflowRepository};
pub use error::WorkflowError;
pub use service::{Transition, TransitionOutcome, WorkflowService};
pub use types::{
    Actor, AdvanceRequest, ApprovalPath, Role, Workflow, WorkflowAction, WorkflowActionKind,
    WorkflowState,
};
