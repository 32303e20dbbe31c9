//! Property-based tests for the pricing calculator.
//!
//! - Property: charge days are never negative and round partial days up
//! - Property: tiered prices always cover the span
//! - Property: billing-period decomposition reconstructs the elapsed days
//! - Property: settlements compose from their rounded parts

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::inventory::RateCard;

use super::calculator::{billing_period, late_fee, rental_days, rental_price, round_money, settle};
use super::types::{LineUsage, RentalType, SettlementInput};

/// Strategy to generate positive money amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a rental type.
fn arb_rental_type() -> impl Strategy<Value = RentalType> {
    prop_oneof![
        Just(RentalType::Daily),
        Just(RentalType::Weekly),
        Just(RentalType::Biweekly),
        Just(RentalType::Monthly),
    ]
}

/// Helper to build a timestamp at a day/hour offset from a fixed base.
fn at(days: i64, hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        + Duration::days(days)
        + Duration::hours(hours)
}

/// Helper to build a rate card with every tier configured.
fn full_rates(daily: Decimal) -> RateCard {
    RateCard {
        daily,
        weekly: Some(daily * Decimal::from(6)),
        biweekly: Some(daily * Decimal::from(12)),
        monthly: Some(daily * Decimal::from(22)),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* pair of instants, charge days are non-negative, zero for
    /// inverted spans, and cover the span when it is positive.
    #[test]
    fn prop_rental_days_covers_span(
        start_day in 0i64..90,
        end_day in 0i64..90,
        hours in 0i64..24,
    ) {
        let start = at(start_day, 0);
        let end = at(end_day, hours);
        let days = rental_days(start, end);

        prop_assert!(days >= 0);
        if end <= start {
            prop_assert_eq!(days, 0);
        } else {
            let seconds = (end - start).num_seconds();
            prop_assert!(days * 86_400 >= seconds);
            prop_assert!((days - 1) * 86_400 < seconds);
        }
    }

    /// *For any* daily rental, the price is exactly days times the rate.
    #[test]
    fn prop_daily_price_is_linear(
        rate in positive_amount(),
        days in 1i64..120,
    ) {
        let price = rental_price(
            &RateCard::daily_only(rate),
            RentalType::Daily,
            at(0, 0),
            at(days, 0),
        );
        prop_assert_eq!(price.unwrap(), rate * Decimal::from(days));
    }

    /// *For any* configured tier, the billed periods cover the span: the
    /// price equals whole periods times the tier rate and never undercharges.
    #[test]
    fn prop_tiered_price_covers_span(
        daily in positive_amount(),
        rental_type in arb_rental_type(),
        days in 1i64..120,
    ) {
        let rates = full_rates(daily);
        let rate = rates.rate_for(rental_type).unwrap();
        let price = rental_price(&rates, rental_type, at(0, 0), at(days, 0)).unwrap();

        let period_days = rental_type.period_days();
        // days and period_days are positive; i64::div_ceil is unstable
        let periods = ((days as u64).div_ceil(period_days as u64)) as i64;
        prop_assert_eq!(price, rate * Decimal::from(periods));
        prop_assert!(periods * period_days >= days);
    }

    /// *For any* span, the billing-period decomposition reconstructs the
    /// elapsed days and charges a trailing partial period in full.
    #[test]
    fn prop_billing_period_reconstructs_days(
        rental_type in arb_rental_type(),
        days in 0i64..120,
        hours in 0i64..24,
    ) {
        let period = billing_period(at(0, 0), at(days, hours), rental_type);
        let period_days = rental_type.period_days();

        prop_assert_eq!(
            period.periods_completed * period_days + period.extra_days,
            period.days_passed
        );
        prop_assert_eq!(period.charge_extra_period, period.extra_days > 0);
        prop_assert_eq!(
            period.total_periods,
            period.periods_completed + i64::from(period.charge_extra_period)
        );
        prop_assert!(period.total_periods * period_days >= period.days_passed);
    }

    /// *For any* line, a late fee exists exactly when the return is late,
    /// and scales with days late, the daily rate, and quantity.
    #[test]
    fn prop_late_fee_iff_late(
        daily_rate in positive_amount(),
        days_late in -10i64..30,
        quantity in 1u32..10,
    ) {
        let fee = late_fee(days_late, daily_rate, Decimal::new(15, 1), quantity);
        if days_late > 0 {
            prop_assert!(fee > Decimal::ZERO);
            prop_assert_eq!(
                fee,
                Decimal::from(days_late)
                    * daily_rate
                    * Decimal::new(15, 1)
                    * Decimal::from(quantity)
            );
        } else {
            prop_assert_eq!(fee, Decimal::ZERO);
        }
    }

    /// *For any* settlement, the total composes from its rounded parts.
    #[test]
    fn prop_settlement_composes(
        unit_price in positive_amount(),
        rental_type in arb_rental_type(),
        quantity in 1u32..10,
        services in positive_amount(),
        deposit in positive_amount(),
        used_days in 0i64..60,
        days_late in 0i64..10,
    ) {
        let input = SettlementInput {
            lines: vec![LineUsage {
                unit_price,
                rental_type,
                quantity,
                daily_rate: unit_price,
            }],
            services_subtotal: services,
            deposit,
            discount: Decimal::ZERO,
            used_days,
            days_late,
            late_fee_multiplier: Decimal::new(15, 1),
        };
        let settlement = settle(&input);

        prop_assert_eq!(
            settlement.subtotal,
            round_money(settlement.equipment_subtotal + services)
        );
        prop_assert_eq!(
            settlement.total,
            round_money(settlement.subtotal + deposit + settlement.late_fee)
        );
        prop_assert!(settlement.equipment_subtotal >= Decimal::ZERO);
        prop_assert!(settlement.late_fee >= Decimal::ZERO);
    }

    /// *For any* span, extending the return date never lowers the price.
    #[test]
    fn prop_price_monotonic_in_span(
        daily in positive_amount(),
        rental_type in arb_rental_type(),
        days in 1i64..60,
        extension in 0i64..60,
    ) {
        let rates = full_rates(daily);
        let short = rental_price(&rates, rental_type, at(0, 0), at(days, 0)).unwrap();
        let long = rental_price(&rates, rental_type, at(0, 0), at(days + extension, 0)).unwrap();
        prop_assert!(long >= short);
    }
}

#[cfg(test)]
mod edge_case_tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// 31 days on a monthly tier bills two full months.
    #[test]
    fn test_month_plus_a_day_bills_two_months() {
        let period = billing_period(at(0, 0), at(31, 0), RentalType::Monthly);
        assert_eq!(period.periods_completed, 1);
        assert_eq!(period.extra_days, 1);
        assert_eq!(period.total_periods, 2);

        let rates = full_rates(dec!(100));
        let price = rental_price(&rates, RentalType::Monthly, at(0, 0), at(31, 0)).unwrap();
        assert_eq!(price, dec!(4400));
    }

    /// A settlement with no lines is all zeroes plus the fixed parts.
    #[test]
    fn test_settlement_with_no_lines() {
        let settlement = settle(&SettlementInput {
            lines: Vec::new(),
            services_subtotal: dec!(40),
            deposit: dec!(100),
            discount: dec!(10),
            used_days: 5,
            days_late: 3,
            late_fee_multiplier: dec!(1.5),
        });
        assert_eq!(settlement.equipment_subtotal, Decimal::ZERO);
        assert_eq!(settlement.late_fee, Decimal::ZERO);
        assert_eq!(settlement.subtotal, dec!(40));
        assert_eq!(settlement.total, dec!(130));
    }
}
