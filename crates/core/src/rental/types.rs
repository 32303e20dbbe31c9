//! Rental contract domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentara_shared::types::{CustomerId, ItemId, RentalId, TenantId, UserId};

use crate::approval::{ChangeRequest, PendingApproval};
use crate::pricing::{round_money, RentalType};

/// Lifecycle status of a rental contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// Stock is held, pickup has not happened.
    Reserved,
    /// Equipment is out with the customer.
    Active,
    /// The scheduled return has elapsed without a return.
    Overdue,
    /// Equipment returned and the bill settled. Terminal.
    Completed,
    /// Reservation released without pickup. Terminal.
    Cancelled,
}

impl RentalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Active => "active",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reserved" => Some(Self::Reserved),
            "active" => Some(Self::Active),
            "overdue" => Some(Self::Overdue),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for statuses no transition leaves.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One equipment line on a rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalItem {
    /// The rented item.
    pub item_id: ItemId,
    /// The specific unit serial, for unit-tracked items.
    pub unit_id: Option<String>,
    /// Units on the line (1 for unit-tracked lines).
    pub quantity: u32,
    /// Contracted price per billing period, per unit.
    pub unit_price: Decimal,
    /// Tier the line is billed on.
    pub rental_type: RentalType,
    /// Contracted line cost over the scheduled span.
    pub subtotal: Decimal,
}

/// A service add-on such as delivery or an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLine {
    /// Service name.
    pub name: String,
    /// Flat price.
    pub price: Decimal,
}

/// Date anchors of a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalDates {
    /// When the reservation was made.
    pub reserved_at: DateTime<Utc>,
    /// Agreed pickup.
    pub pickup_scheduled: DateTime<Utc>,
    /// Actual pickup, stamped on activation.
    pub pickup_actual: Option<DateTime<Utc>>,
    /// Agreed return.
    pub return_scheduled: DateTime<Utc>,
    /// Actual return, stamped on completion.
    pub return_actual: Option<DateTime<Utc>>,
    /// Billing anchor, set to the actual pickup on activation.
    pub billing_cycle: Option<DateTime<Utc>>,
}

/// Money breakdown of a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPricing {
    /// Current equipment cost; overwritten by settlement proration.
    pub equipment_subtotal: Decimal,
    /// Equipment cost as contracted, preserved across settlement.
    pub original_equipment_subtotal: Decimal,
    /// Sum of service add-on prices.
    pub services_subtotal: Decimal,
    /// Scheduled span in charge days.
    pub contracted_days: i64,
    /// Equipment plus services.
    pub subtotal: Decimal,
    /// Deposit charged up front.
    pub deposit: Decimal,
    /// Discount applied to the total.
    pub discount: Decimal,
    /// Late fee, set at settlement when the return is late.
    pub late_fee: Decimal,
    /// Days actually used, set at settlement.
    pub used_days: i64,
    /// Amount due: subtotal + deposit - discount + late fee.
    pub total: Decimal,
}

impl RentalPricing {
    /// Recomputes the derived `subtotal` and `total` from the parts.
    pub fn recompute(&mut self) {
        self.subtotal = round_money(self.equipment_subtotal + self.services_subtotal);
        self.total = round_money(self.subtotal + self.deposit - self.discount + self.late_fee);
    }
}

/// A change applied through the approval workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// The mutation that was applied.
    pub request: ChangeRequest,
    /// Who originally asked for it.
    pub requested_by: UserId,
    /// Who approved it.
    pub approved_by: UserId,
    /// When it was approved and applied.
    pub approved_at: DateTime<Utc>,
}

/// A rental contract.
///
/// Exclusively owns its dates, pricing, history, and pending approvals.
/// Items and units are referenced by identity only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    /// Unique identifier.
    pub id: RentalId,
    /// Tenant the rental belongs to.
    pub tenant_id: TenantId,
    /// Human-facing sequential number, unique per tenant.
    pub rental_number: String,
    /// The renting customer.
    pub customer_id: CustomerId,
    /// Lifecycle status.
    pub status: RentalStatus,
    /// Equipment lines.
    pub items: Vec<RentalItem>,
    /// Service add-ons.
    pub services: Vec<ServiceLine>,
    /// Date anchors.
    pub dates: RentalDates,
    /// Money breakdown.
    pub pricing: RentalPricing,
    /// Changes applied through the approval workflow.
    pub change_history: Vec<ChangeRecord>,
    /// Deferred mutations awaiting resolution. Append-only; entries are
    /// marked resolved in place, never removed.
    pub pending_approvals: Vec<PendingApproval>,
    /// Who created the rental.
    pub created_by: UserId,
    /// When the rental was created.
    pub created_at: DateTime<Utc>,
    /// When the rental was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    /// Looks up the line for an item.
    #[must_use]
    pub fn line(&self, item_id: ItemId) -> Option<&RentalItem> {
        self.items.iter().find(|line| line.item_id == item_id)
    }

    /// Looks up the line for an item, mutably.
    pub fn line_mut(&mut self, item_id: ItemId) -> Option<&mut RentalItem> {
        self.items.iter_mut().find(|line| line.item_id == item_id)
    }

    /// Returns true once the rental reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One requested equipment line at creation.
#[derive(Debug, Clone)]
pub struct CreateRentalItem {
    /// The item to rent.
    pub item_id: ItemId,
    /// The specific unit serial, for unit-tracked items.
    pub unit_id: Option<String>,
    /// Units requested.
    pub quantity: u32,
    /// Tier to bill the line on.
    pub rental_type: RentalType,
}

/// Input for creating a rental.
#[derive(Debug, Clone)]
pub struct CreateRentalInput {
    /// Tenant the rental belongs to.
    pub tenant_id: TenantId,
    /// The renting customer.
    pub customer_id: CustomerId,
    /// Equipment lines.
    pub items: Vec<CreateRentalItem>,
    /// Service add-ons.
    pub services: Vec<ServiceLine>,
    /// Agreed pickup.
    pub pickup_scheduled: DateTime<Utc>,
    /// Agreed return.
    pub return_scheduled: DateTime<Utc>,
    /// Deposit charged up front.
    pub deposit: Decimal,
    /// The creating user.
    pub created_by: UserId,
}

/// Result of a gated mutation: either applied, or queued for approval.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    /// The mutation applied immediately.
    Applied(Rental),
    /// The mutation was queued; the rental itself is untouched apart
    /// from the new pending entry.
    Pending {
        /// The rental carrying the queued request.
        rental: Rental,
        /// Index of the request in `pending_approvals`.
        approval_index: usize,
    },
}

impl MutationOutcome {
    /// Returns true if the mutation is waiting for approval.
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// The rental state after the operation.
    #[must_use]
    pub fn rental(&self) -> &Rental {
        match self {
            Self::Applied(rental) | Self::Pending { rental, .. } => rental,
        }
    }

    /// Consumes the outcome, returning the rental.
    #[must_use]
    pub fn into_rental(self) -> Rental {
        match self {
            Self::Applied(rental) | Self::Pending { rental, .. } => rental,
        }
    }
}
