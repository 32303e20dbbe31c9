//! Inventory error types.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::UnitStatus;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Requested more stock than the source pool holds.
    #[error("Requested {requested} but only {available} {pool}")]
    InsufficientQuantity {
        /// How many were requested.
        requested: u32,
        /// How many the source pool held.
        available: u32,
        /// Which pool was drawn from.
        pool: UnitStatus,
    },

    /// A unit exists but is not in the status the operation expects.
    #[error("Unit {unit_id} is {status}, expected {expected}")]
    UnitNotAvailable {
        /// The unit serial.
        unit_id: String,
        /// The unit's actual status.
        status: UnitStatus,
        /// The status the operation required.
        expected: UnitStatus,
    },

    /// No unit with the given serial exists on the item.
    #[error("Unit not found: {unit_id}")]
    UnitNotFound {
        /// The unknown serial.
        unit_id: String,
    },

    /// A unit-tracked operation was attempted without a unit serial.
    #[error("A unit id is required for unit-tracked items")]
    UnitRequired,

    /// A unit-tracked operation must move exactly one unit per call.
    #[error("Unit-tracked operations move one unit at a time, got {quantity}")]
    UnitQuantityInvalid {
        /// The rejected quantity.
        quantity: u32,
    },

    /// A quantity operation was given zero.
    #[error("Quantity must be greater than zero")]
    ZeroQuantity,

    /// A stock-care transfer between the given pools is not allowed.
    #[error("Cannot transfer stock from {from} to {to}")]
    TransferNotAllowed {
        /// Source pool.
        from: UnitStatus,
        /// Destination pool.
        to: UnitStatus,
    },

    /// Two units with the same serial were registered.
    #[error("Duplicate unit id: {unit_id}")]
    DuplicateUnit {
        /// The repeated serial.
        unit_id: String,
    },

    /// A rate card rate was zero or negative.
    #[error("Rate must be positive, got {rate}")]
    NonPositiveRate {
        /// The rejected rate.
        rate: Decimal,
    },

    /// An item was registered without a name.
    #[error("Item name is required")]
    ItemNameRequired,
}

impl InventoryError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InsufficientQuantity { .. } | Self::UnitNotAvailable { .. } => 409,
            Self::UnitNotFound { .. } => 404,
            Self::UnitRequired
            | Self::UnitQuantityInvalid { .. }
            | Self::ZeroQuantity
            | Self::TransferNotAllowed { .. }
            | Self::DuplicateUnit { .. }
            | Self::NonPositiveRate { .. }
            | Self::ItemNameRequired => 400,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientQuantity { .. } => "INSUFFICIENT_QUANTITY",
            Self::UnitNotAvailable { .. } => "UNIT_NOT_AVAILABLE",
            Self::UnitNotFound { .. } => "UNIT_NOT_FOUND",
            Self::UnitRequired => "UNIT_REQUIRED",
            Self::UnitQuantityInvalid { .. } => "UNIT_QUANTITY_INVALID",
            Self::ZeroQuantity => "ZERO_QUANTITY",
            Self::TransferNotAllowed { .. } => "TRANSFER_NOT_ALLOWED",
            Self::DuplicateUnit { .. } => "DUPLICATE_UNIT",
            Self::NonPositiveRate { .. } => "NON_POSITIVE_RATE",
            Self::ItemNameRequired => "ITEM_NAME_REQUIRED",
        }
    }
}
