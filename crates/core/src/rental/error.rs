//! Rental error types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use rentara_shared::types::ItemId;

use crate::pricing::PricingError;

use super::types::RentalStatus;

/// Errors that can occur during rental lifecycle operations.
#[derive(Debug, Error)]
pub enum RentalError {
    /// The requested status change is not permitted from the current status.
    #[error("Cannot transition rental from {from} to {to}")]
    InvalidTransition {
        /// The rental's current status.
        from: RentalStatus,
        /// The requested status.
        to: RentalStatus,
    },

    /// The operation is not permitted in the rental's current status.
    #[error("Operation not permitted while rental is {status}")]
    InvalidState {
        /// The rental's current status.
        status: RentalStatus,
    },

    /// A rental must carry at least one equipment line.
    #[error("A rental requires at least one item")]
    EmptyRental,

    /// The scheduled return does not come after the scheduled pickup.
    #[error("Scheduled return {return_scheduled} must come after pickup {pickup_scheduled}")]
    InvalidDates {
        /// Agreed pickup.
        pickup_scheduled: DateTime<Utc>,
        /// Agreed return.
        return_scheduled: DateTime<Utc>,
    },

    /// An extension must push the scheduled return out, not in.
    #[error("New return {requested} must come after the current return {current}")]
    ExtensionTooEarly {
        /// The current scheduled return.
        current: DateTime<Utc>,
        /// The requested return.
        requested: DateTime<Utc>,
    },

    /// No line for the given item exists on the rental.
    #[error("Rental has no line for item {item_id}")]
    LineNotFound {
        /// The item without a line.
        item_id: ItemId,
    },

    /// The item's rates could not be resolved for a line.
    #[error("Rates unavailable for item {item_id}")]
    RateUnavailable {
        /// The item whose rates are missing.
        item_id: ItemId,
    },

    /// Discounts cannot be negative.
    #[error("Discount cannot be negative")]
    NegativeDiscount,

    /// A discount larger than the subtotal would make the bill negative.
    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal {
        /// The rejected discount.
        discount: Decimal,
        /// The rental subtotal.
        subtotal: Decimal,
    },

    /// Deposits cannot be negative.
    #[error("Deposit cannot be negative")]
    NegativeDeposit,

    /// A service line needs a name.
    #[error("Service name is required")]
    ServiceNameRequired,

    /// Service prices cannot be negative.
    #[error("Service price cannot be negative")]
    NegativeServicePrice,

    /// A price computation failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl RentalError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::InvalidState { .. }
            | Self::EmptyRental
            | Self::InvalidDates { .. }
            | Self::ExtensionTooEarly { .. }
            | Self::RateUnavailable { .. }
            | Self::NegativeDiscount
            | Self::NegativeDeposit
            | Self::ServiceNameRequired
            | Self::NegativeServicePrice => 400,
            Self::LineNotFound { .. } => 404,
            Self::DiscountExceedsSubtotal { .. } => 422,
            Self::Pricing(err) => err.status_code(),
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::EmptyRental => "EMPTY_RENTAL",
            Self::InvalidDates { .. } => "INVALID_DATES",
            Self::ExtensionTooEarly { .. } => "EXTENSION_TOO_EARLY",
            Self::LineNotFound { .. } => "LINE_NOT_FOUND",
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::NegativeDiscount => "NEGATIVE_DISCOUNT",
            Self::DiscountExceedsSubtotal { .. } => "DISCOUNT_EXCEEDS_SUBTOTAL",
            Self::NegativeDeposit => "NEGATIVE_DEPOSIT",
            Self::ServiceNameRequired => "SERVICE_NAME_REQUIRED",
            Self::NegativeServicePrice => "NEGATIVE_SERVICE_PRICE",
            Self::Pricing(err) => err.error_code(),
        }
    }
}
