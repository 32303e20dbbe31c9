//! Pricing error types.

use thiserror::Error;

use super::types::RentalType;

/// Errors that can occur during price computation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The item's rate card has no rate for the requested tier.
    #[error("No {rental_type} rate configured for this item")]
    RateNotConfigured {
        /// The tier that was requested.
        rental_type: RentalType,
    },
}

impl PricingError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateNotConfigured { .. } => 400,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RateNotConfigured { .. } => "RATE_NOT_CONFIGURED",
        }
    }
}
