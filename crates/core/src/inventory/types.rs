//! Inventory domain types for allocation tracking.
//!
//! Items are tracked one of two ways:
//! - **Unit-tracked**: every physical instance carries a serial and its own
//!   status; the quantity record is always recomputed from unit statuses.
//! - **Quantity-tracked**: only aggregate counters exist; they are the source
//!   of truth and must never go negative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentara_shared::types::{CustomerId, ItemId, MovementId, RentalId, TenantId, UserId};

use crate::pricing::RentalType;

/// How an item's stock is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingType {
    /// Individual serialized units.
    Unit,
    /// Aggregate counters only.
    Quantity,
}

impl TrackingType {
    /// Returns the string representation of the tracking type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Quantity => "quantity",
        }
    }

    /// Parses a tracking type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unit" => Some(Self::Unit),
            "quantity" => Some(Self::Quantity),
            _ => None,
        }
    }
}

/// Status of a serialized unit (or, for quantity-tracked items, the
/// counter pool a quantity sits in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// In stock and free to reserve.
    Available,
    /// Held for a rental that has not been picked up yet.
    Reserved,
    /// Out with a customer.
    Rented,
    /// Pulled for maintenance.
    Maintenance,
    /// Damaged and out of circulation.
    Damaged,
}

impl UnitStatus {
    /// All statuses, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Available,
        Self::Reserved,
        Self::Rented,
        Self::Maintenance,
        Self::Damaged,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Rented => "rented",
            Self::Maintenance => "maintenance",
            Self::Damaged => "damaged",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(Self::Available),
            "reserved" => Some(Self::Reserved),
            "rented" => Some(Self::Rented),
            "maintenance" => Some(Self::Maintenance),
            "damaged" => Some(Self::Damaged),
            _ => None,
        }
    }

    /// Returns true if the status belongs to an active rental allocation.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        matches!(self, Self::Reserved | Self::Rented)
    }

    /// Returns true if the status is a valid stock-care transfer endpoint.
    #[must_use]
    pub fn is_care_state(&self) -> bool {
        matches!(self, Self::Available | Self::Maintenance | Self::Damaged)
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A serialized physical unit of a unit-tracked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Serial identifier, unique within the item.
    pub unit_id: String,
    /// Current status.
    pub status: UnitStatus,
    /// Rental currently holding this unit, if any.
    pub rental_id: Option<RentalId>,
    /// Customer currently holding this unit, if any.
    pub customer_id: Option<CustomerId>,
}

impl Unit {
    /// Creates an available unit with the given serial.
    #[must_use]
    pub fn available(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            status: UnitStatus::Available,
            rental_id: None,
            customer_id: None,
        }
    }
}

/// Aggregate stock counters for an item.
///
/// Invariant: `total` always equals the sum of the five pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRecord {
    /// Total owned stock.
    pub total: u32,
    /// Free to reserve.
    pub available: u32,
    /// Held for rentals not yet picked up.
    pub reserved: u32,
    /// Out with customers.
    pub rented: u32,
    /// Pulled for maintenance.
    pub maintenance: u32,
    /// Out of circulation.
    pub damaged: u32,
}

impl QuantityRecord {
    /// An empty record.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            total: 0,
            available: 0,
            reserved: 0,
            rented: 0,
            maintenance: 0,
            damaged: 0,
        }
    }

    /// A record with the full quantity available.
    #[must_use]
    pub const fn with_available(total: u32) -> Self {
        Self {
            total,
            available: total,
            reserved: 0,
            rented: 0,
            maintenance: 0,
            damaged: 0,
        }
    }

    /// Recomputes a record by counting unit statuses.
    ///
    /// This is the source of truth for unit-tracked items.
    #[must_use]
    pub fn tally(units: &[Unit]) -> Self {
        let mut record = Self::zero();
        for unit in units {
            *record.pool_mut(unit.status) += 1;
        }
        record.total = u32::try_from(units.len()).unwrap_or(u32::MAX);
        record
    }

    /// Returns the counter for the given pool.
    #[must_use]
    pub fn pool(&self, status: UnitStatus) -> u32 {
        match status {
            UnitStatus::Available => self.available,
            UnitStatus::Reserved => self.reserved,
            UnitStatus::Rented => self.rented,
            UnitStatus::Maintenance => self.maintenance,
            UnitStatus::Damaged => self.damaged,
        }
    }

    /// Returns a mutable reference to the counter for the given pool.
    pub fn pool_mut(&mut self, status: UnitStatus) -> &mut u32 {
        match status {
            UnitStatus::Available => &mut self.available,
            UnitStatus::Reserved => &mut self.reserved,
            UnitStatus::Rented => &mut self.rented,
            UnitStatus::Maintenance => &mut self.maintenance,
            UnitStatus::Damaged => &mut self.damaged,
        }
    }

    /// Returns true if `total` equals the sum of the five pools.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total
            == self.available + self.reserved + self.rented + self.maintenance + self.damaged
    }
}

/// Rate tiers for an item. The daily rate is mandatory, the longer
/// tiers are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCard {
    /// Price per day.
    pub daily: Decimal,
    /// Price per 7-day week, if offered.
    pub weekly: Option<Decimal>,
    /// Price per 15-day period, if offered.
    pub biweekly: Option<Decimal>,
    /// Price per 30-day month, if offered.
    pub monthly: Option<Decimal>,
}

impl RateCard {
    /// A rate card offering only a daily rate.
    #[must_use]
    pub const fn daily_only(daily: Decimal) -> Self {
        Self {
            daily,
            weekly: None,
            biweekly: None,
            monthly: None,
        }
    }

    /// Returns the configured rate for the given rental type, if any.
    #[must_use]
    pub fn rate_for(&self, rental_type: RentalType) -> Option<Decimal> {
        match rental_type {
            RentalType::Daily => Some(self.daily),
            RentalType::Weekly => self.weekly,
            RentalType::Biweekly => self.biweekly,
            RentalType::Monthly => self.monthly,
        }
    }
}

/// A rentable asset definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Tenant this item belongs to.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// How stock is tracked.
    pub tracking: TrackingType,
    /// Rate tiers.
    pub rates: RateCard,
    /// Aggregate stock counters.
    pub quantities: QuantityRecord,
    /// Serialized units (empty for quantity-tracked items).
    #[serde(default)]
    pub units: Vec<Unit>,
    /// When the item was registered.
    pub created_at: DateTime<Utc>,
    /// When the item was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Looks up a unit by serial.
    #[must_use]
    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.unit_id == unit_id)
    }

    /// Returns true if the item tracks serialized units.
    #[must_use]
    pub fn is_unit_tracked(&self) -> bool {
        self.tracking == TrackingType::Unit
    }
}

/// Initial stock for item registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialStock {
    /// Serialized units, one per serial string.
    Units(Vec<String>),
    /// A fungible quantity pool.
    Quantity(u32),
}

/// Input for registering a new item.
#[derive(Debug, Clone)]
pub struct RegisterItemInput {
    /// Tenant the item belongs to.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Rate tiers.
    pub rates: RateCard,
    /// Initial stock; also determines the tracking type.
    pub stock: InitialStock,
}

/// Allocation state changes driven by the rental lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationAction {
    /// Hold stock for a new reservation.
    Reserve,
    /// Convert a hold into an active rental at pickup.
    Activate,
    /// Take stock back at return.
    Return,
    /// Release a hold that was never picked up.
    Cancel,
}

impl AllocationAction {
    /// Returns the `(from, to)` status endpoints of the action.
    #[must_use]
    pub fn endpoints(&self) -> (UnitStatus, UnitStatus) {
        match self {
            Self::Reserve => (UnitStatus::Available, UnitStatus::Reserved),
            Self::Activate => (UnitStatus::Reserved, UnitStatus::Rented),
            Self::Return => (UnitStatus::Rented, UnitStatus::Available),
            Self::Cancel => (UnitStatus::Reserved, UnitStatus::Available),
        }
    }

    /// Returns the movement kind recorded for this action.
    #[must_use]
    pub fn movement_kind(&self) -> MovementKind {
        match self {
            Self::Reserve => MovementKind::Reserve,
            Self::Activate => MovementKind::Activate,
            Self::Return => MovementKind::Return,
            Self::Cancel => MovementKind::Cancel,
        }
    }

    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Activate => "activate",
            Self::Return => "return",
            Self::Cancel => "cancel",
        }
    }
}

/// Kind of an inventory movement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock held for a reservation.
    Reserve,
    /// Hold converted to an active rental.
    Activate,
    /// Stock returned from a rental.
    Return,
    /// Hold released without pickup.
    Cancel,
    /// Stock-care transfer between available, maintenance, and damaged.
    Transfer,
    /// Compensating inverse of an earlier movement.
    Reversal,
}

impl MovementKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Activate => "activate",
            Self::Return => "return",
            Self::Cancel => "cancel",
            Self::Transfer => "transfer",
            Self::Reversal => "reversal",
        }
    }
}

/// An immutable audit record of an inventory state change.
///
/// Movements are append-only; the `before` and `after` snapshots carry the
/// full counter detail, `delta` is the signed change to the available pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Unique identifier.
    pub id: MovementId,
    /// Tenant the item belongs to.
    pub tenant_id: TenantId,
    /// The affected item.
    pub item_id: ItemId,
    /// The rental that caused the change, if any.
    pub rental_id: Option<RentalId>,
    /// What kind of change this was.
    pub kind: MovementKind,
    /// Signed change to the available pool.
    pub delta: i64,
    /// The affected unit serial, if the item is unit-tracked.
    pub unit_id: Option<String>,
    /// Counters before the change.
    pub before: QuantityRecord,
    /// Counters after the change.
    pub after: QuantityRecord,
    /// Who performed the change.
    pub recorded_by: UserId,
    /// When the change happened.
    pub recorded_at: DateTime<Utc>,
}

/// Context for an allocation applied on behalf of a rental.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext {
    /// The rental driving the allocation.
    pub rental_id: RentalId,
    /// The customer on the rental.
    pub customer_id: Option<CustomerId>,
    /// The acting user.
    pub recorded_by: UserId,
    /// When the allocation happened.
    pub occurred_at: DateTime<Utc>,
}

/// Input for a stock-care transfer.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Source pool.
    pub from: UnitStatus,
    /// Destination pool.
    pub to: UnitStatus,
    /// Unit serial (required for unit-tracked items).
    pub unit_id: Option<String>,
    /// Quantity to move (must be 1 for unit-tracked items).
    pub quantity: u32,
    /// The acting user.
    pub moved_by: UserId,
}
