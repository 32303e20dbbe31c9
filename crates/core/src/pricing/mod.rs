//! Rental price computation.
//!
//! This module implements the money side of the rental lifecycle:
//! - Rate tiers and billed-period decomposition
//! - Per-line prices with ceiling day and period rules
//! - Final-settlement proration over days actually used
//! - Late fees
//!
//! Pure computation, no side effects.

pub mod calculator;
pub mod error;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::{billing_period, late_fee, rental_days, rental_price, round_money, settle};
pub use error::PricingError;
pub use types::{BillingPeriod, LineUsage, RentalType, Settlement, SettlementInput};
