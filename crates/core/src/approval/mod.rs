//! Role-based approval workflow.
//!
//! This module implements the gate in front of privileged rental
//! mutations:
//! - Staff roles and their privilege ordering
//! - Change requests carrying the full deferred mutation payload
//! - Pending approvals and their resolution states
//! - The decision engine for apply-now versus defer

pub mod error;
pub mod gate;
pub mod types;

#[cfg(test)]
mod gate_props;

pub use error::ApprovalError;
pub use gate::ApprovalGate;
pub use types::{
    Actor, ApprovalStatus, ChangeRequest, GateDecision, PendingApproval, StaffRole,
};
