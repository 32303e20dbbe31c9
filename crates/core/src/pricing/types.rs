//! Pricing domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rate tier a rental line is billed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalType {
    /// Billed per day.
    Daily,
    /// Billed per 7-day period.
    Weekly,
    /// Billed per 15-day period.
    Biweekly,
    /// Billed per 30-day period.
    Monthly,
}

impl RentalType {
    /// Length of one billing period in days.
    #[must_use]
    pub fn period_days(&self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Biweekly => 15,
            Self::Monthly => 30,
        }
    }

    /// Returns the string representation of the rental type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses a rental type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "biweekly" => Some(Self::Biweekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for RentalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decomposition of an elapsed span into billed periods.
///
/// Partial periods always round up to a full billed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// Charge days elapsed (any partial day counts as a full day).
    pub days_passed: i64,
    /// Whole periods fully elapsed.
    pub periods_completed: i64,
    /// Days beyond the last whole period.
    pub extra_days: i64,
    /// Whether the trailing partial period is charged.
    pub charge_extra_period: bool,
    /// Periods actually billed.
    pub total_periods: i64,
}

/// Per-line usage detail feeding a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineUsage {
    /// Contracted price per billing period, per unit.
    pub unit_price: Decimal,
    /// Tier the line is billed on.
    pub rental_type: RentalType,
    /// Units on the line.
    pub quantity: u32,
    /// The item's daily rate, used for late fees.
    pub daily_rate: Decimal,
}

/// Input for a final settlement computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementInput {
    /// Equipment lines with their usage detail.
    pub lines: Vec<LineUsage>,
    /// Sum of service add-on prices.
    pub services_subtotal: Decimal,
    /// Deposit charged on the rental.
    pub deposit: Decimal,
    /// Discount applied to the rental.
    pub discount: Decimal,
    /// Actual days of use, pickup to return.
    pub used_days: i64,
    /// Days past the scheduled return, zero when on time.
    pub days_late: i64,
    /// Late fee multiplier applied on top of the daily rate.
    pub late_fee_multiplier: Decimal,
}

/// Result of a final settlement computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Prorated equipment cost over the days actually used.
    pub equipment_subtotal: Decimal,
    /// Late fee across all lines.
    pub late_fee: Decimal,
    /// Equipment plus services.
    pub subtotal: Decimal,
    /// Amount due: subtotal + deposit - discount + late fee.
    pub total: Decimal,
}
