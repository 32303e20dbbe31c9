//! Role-based approval gate.
//!
//! Privileged mutations either apply immediately or are deferred into a
//! pending approval, depending on the actor's role and, for discounts,
//! the amount relative to the rental subtotal.

use rust_decimal::Decimal;

use super::types::{ChangeRequest, GateDecision, StaffRole};

/// Stateless decision engine for privileged mutations.
pub struct ApprovalGate;

impl ApprovalGate {
    /// Decides whether an actor's requested mutation applies immediately
    /// or waits for approval.
    ///
    /// Admin-or-above actors always apply directly. Below that, only
    /// discounts inside the auto-approve threshold pass; everything else
    /// is deferred.
    #[must_use]
    pub fn evaluate(
        actor_role: StaffRole,
        request: &ChangeRequest,
        subtotal: Decimal,
        auto_approve_percent: Decimal,
    ) -> GateDecision {
        if actor_role.is_admin() {
            return GateDecision::Apply;
        }
        match request {
            ChangeRequest::Discount { amount, .. } => {
                if Self::within_auto_approve(*amount, subtotal, auto_approve_percent) {
                    GateDecision::Apply
                } else {
                    GateDecision::Defer
                }
            }
            ChangeRequest::StatusChange { .. }
            | ChangeRequest::RentalTypeChange { .. }
            | ChangeRequest::Extension { .. }
            | ChangeRequest::ServiceAddition { .. } => GateDecision::Defer,
        }
    }

    /// Whether a discount falls inside the auto-approve threshold,
    /// expressed as a percentage of the rental subtotal.
    #[must_use]
    pub fn within_auto_approve(amount: Decimal, subtotal: Decimal, percent: Decimal) -> bool {
        if subtotal <= Decimal::ZERO {
            return false;
        }
        amount * Decimal::ONE_HUNDRED <= subtotal * percent
    }

    /// Whether a role may approve or reject pending requests.
    #[must_use]
    pub fn can_resolve(role: StaffRole) -> bool {
        role.is_admin()
    }
}
