//! Rental price computation.
//!
//! CRITICAL: charging rules for rental spans:
//! - Any partial day counts as a full charge day
//! - Tiered rentals charge whole periods; a trailing partial period is
//!   billed as a full period, never prorated down
//! - Final settlement prorates over days actually used
//! - Money rounds to 2 decimal places with banker's rounding

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::inventory::RateCard;

use super::error::PricingError;
use super::types::{BillingPeriod, RentalType, Settlement, SettlementInput};

const SECONDS_PER_DAY: i64 = 86_400;

/// Rounds an amount to 2 decimal places using banker's rounding
/// (round half to even) to minimize cumulative errors.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Charge days between two instants. Any partial day rounds up to a
/// full day; empty or inverted spans yield zero.
#[must_use]
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        0
    } else {
        // seconds is positive here; i64::div_ceil is unstable, so divide as u64
        (seconds as u64).div_ceil(SECONDS_PER_DAY as u64) as i64
    }
}

/// Price for renting one unit over a span on the given tier.
///
/// Daily rentals charge per day. Tiered rentals charge whole periods,
/// rounding a trailing partial period up; the tier must be configured
/// on the rate card.
pub fn rental_price(
    rates: &RateCard,
    rental_type: RentalType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Decimal, PricingError> {
    let days = rental_days(start, end);
    if days == 0 {
        return Ok(Decimal::ZERO);
    }
    match rental_type {
        RentalType::Daily => Ok(rates.daily * Decimal::from(days)),
        RentalType::Weekly | RentalType::Biweekly | RentalType::Monthly => {
            let rate = rates
                .rate_for(rental_type)
                .ok_or(PricingError::RateNotConfigured { rental_type })?;
            // days and period_days are positive; i64::div_ceil is unstable
            let periods = ((days as u64).div_ceil(rental_type.period_days() as u64)) as i64;
            Ok(rate * Decimal::from(periods))
        }
    }
}

/// Decomposes the span from pickup to return into billed periods.
#[must_use]
pub fn billing_period(
    pickup: DateTime<Utc>,
    returned: DateTime<Utc>,
    rental_type: RentalType,
) -> BillingPeriod {
    let period_days = rental_type.period_days();
    let days_passed = rental_days(pickup, returned);
    let periods_completed = days_passed / period_days;
    let extra_days = days_passed % period_days;
    let charge_extra_period = extra_days > 0;
    BillingPeriod {
        days_passed,
        periods_completed,
        extra_days,
        charge_extra_period,
        total_periods: periods_completed + i64::from(charge_extra_period),
    }
}

/// Late fee for one line: days late times the daily rate times the
/// configured multiplier, per unit.
#[must_use]
pub fn late_fee(days_late: i64, daily_rate: Decimal, multiplier: Decimal, quantity: u32) -> Decimal {
    if days_late <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(days_late) * daily_rate * multiplier * Decimal::from(quantity)
}

/// Final settlement at completion.
///
/// Each line's equipment charge is prorated over the days actually used:
/// `(unit_price / period_days) * used_days * quantity`. The total is
/// `equipment + services + deposit - discount + late fee`, with money
/// rounded to 2 decimal places.
#[must_use]
pub fn settle(input: &SettlementInput) -> Settlement {
    let used_days = Decimal::from(input.used_days.max(0));
    let mut equipment = Decimal::ZERO;
    let mut fees = Decimal::ZERO;
    for line in &input.lines {
        let period_days = Decimal::from(line.rental_type.period_days());
        equipment += line.unit_price / period_days * used_days * Decimal::from(line.quantity);
        fees += late_fee(
            input.days_late,
            line.daily_rate,
            input.late_fee_multiplier,
            line.quantity,
        );
    }

    let equipment_subtotal = round_money(equipment);
    let late_fee = round_money(fees);
    let subtotal = round_money(equipment_subtotal + input.services_subtotal);
    let total = round_money(subtotal + input.deposit - input.discount + late_fee);
    Settlement {
        equipment_subtotal,
        late_fee,
        subtotal,
        total,
    }
}
