//! Approval workflow domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentara_shared::types::{ItemId, UserId};

use crate::pricing::RentalType;
use crate::rental::RentalStatus;

/// Staff role within a tenant.
///
/// Roles are ordered from lowest to highest privilege.
/// Higher roles can perform all actions of lower roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    /// Front-desk staff, can request changes.
    Staff = 0,
    /// Operations staff, can request changes and receives approval requests.
    Operator = 1,
    /// Can apply privileged mutations directly and resolve requests.
    Admin = 2,
    /// Full access, including tenant settings.
    Owner = 3,
}

impl StaffRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "staff" => Some(Self::Staff),
            "operator" => Some(Self::Operator),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Operator => "operator",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Returns true for roles with admin-or-above privilege.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        *self >= Self::Admin
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The user performing an operation, with their resolved role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user.
    pub user_id: UserId,
    /// The user's role within the tenant.
    pub role: StaffRole,
}

/// Resolution state of a pending approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting resolution.
    Pending,
    /// Approved; the requested mutation was applied.
    Approved,
    /// Rejected; nothing was applied.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mutation a change request asks for.
///
/// Carries the full payload so an approved request can be applied later
/// through the same code path as a direct mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeRequest {
    /// Move the rental to another lifecycle status.
    StatusChange {
        /// The requested status.
        target: RentalStatus,
    },
    /// Apply a discount to the rental total.
    Discount {
        /// Discount amount.
        amount: Decimal,
        /// Why the discount was given.
        reason: String,
    },
    /// Switch one line to another rate tier.
    RentalTypeChange {
        /// The line's item.
        item_id: ItemId,
        /// The new tier.
        rental_type: RentalType,
    },
    /// Push the scheduled return date out.
    Extension {
        /// The new scheduled return.
        new_return: DateTime<Utc>,
    },
    /// Add a service line to the rental.
    ServiceAddition {
        /// Service name.
        name: String,
        /// Service price.
        price: Decimal,
    },
}

impl ChangeRequest {
    /// Returns the request kind as recorded in logs and notifications.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatusChange { .. } => "status_change",
            Self::Discount { .. } => "discount",
            Self::RentalTypeChange { .. } => "rental_type_change",
            Self::Extension { .. } => "extension",
            Self::ServiceAddition { .. } => "service_addition",
        }
    }
}

/// A deferred mutation awaiting admin resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    /// The requested mutation.
    pub request: ChangeRequest,
    /// Resolution state.
    pub status: ApprovalStatus,
    /// Who asked for the change.
    pub requested_by: UserId,
    /// When the change was requested.
    pub requested_at: DateTime<Utc>,
    /// Who resolved the request, once resolved.
    pub resolved_by: Option<UserId>,
    /// When the request was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PendingApproval {
    /// Creates a new pending request.
    #[must_use]
    pub fn new(request: ChangeRequest, requested_by: UserId, requested_at: DateTime<Utc>) -> Self {
        Self {
            request,
            status: ApprovalStatus::Pending,
            requested_by,
            requested_at,
            resolved_by: None,
            resolved_at: None,
        }
    }

    /// Returns true once the request has been approved or rejected.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status != ApprovalStatus::Pending
    }
}

/// Outcome of gating a requested mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The mutation applies immediately.
    Apply,
    /// The mutation is queued as a pending approval.
    Defer,
}
