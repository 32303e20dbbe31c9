//! Property-based tests for the rental lifecycle machine.
//!
//! Properties verified:
//! - Created rentals satisfy the pricing identity.
//! - The transition matrix is total: every (from, target) pair either
//!   no-ops, plans, or fails, exactly as the matrix says.
//! - Applying a plan lands on the planned status.
//! - Completion settles the days actually used and charges a late fee
//!   only past the scheduled return.
//! - The sweep flips only open rentals that are past due.
//! - Extensions only ever push the scheduled return out.
//! - Discounts apply exactly when they fit within the subtotal.
//! - Reservation planning covers every line.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use rentara_shared::types::{CustomerId, ItemId, RentalId, TenantId, UserId};

use crate::inventory::{AllocationAction, RateCard};
use crate::pricing::{round_money, RentalType};
use crate::rental::error::RentalError;
use crate::rental::machine::RentalMachine;
use crate::rental::types::{CreateRentalInput, CreateRentalItem, Rental, RentalStatus};

fn base(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::days(day)
}

fn rates(daily: Decimal) -> RateCard {
    RateCard {
        daily,
        weekly: Some(daily * dec!(6)),
        biweekly: Some(daily * dec!(12)),
        monthly: Some(daily * dec!(22)),
    }
}

fn make_input(items: Vec<CreateRentalItem>, days: i64) -> CreateRentalInput {
    CreateRentalInput {
        tenant_id: TenantId::new(),
        customer_id: CustomerId::new(),
        items,
        services: Vec::new(),
        pickup_scheduled: base(0),
        return_scheduled: base(days),
        deposit: dec!(50),
        created_by: UserId::new(),
    }
}

/// Builds a single-line daily rental over `days` days.
fn build_rental(daily: Decimal, quantity: u32, days: i64) -> Rental {
    let items = vec![CreateRentalItem {
        item_id: ItemId::new(),
        unit_id: None,
        quantity,
        rental_type: RentalType::Daily,
    }];
    RentalMachine::create(
        make_input(items, days),
        RentalId::new(),
        "R-000001".to_string(),
        base(-1),
        |_| Some(rates(daily)),
    )
    .unwrap()
}

/// Strategy for any rental status.
fn arb_status() -> impl Strategy<Value = RentalStatus> {
    prop_oneof![
        Just(RentalStatus::Reserved),
        Just(RentalStatus::Active),
        Just(RentalStatus::Overdue),
        Just(RentalStatus::Completed),
        Just(RentalStatus::Cancelled),
    ]
}

/// Strategy for a (from, target) pair the matrix allows.
fn arb_valid_pair() -> impl Strategy<Value = (RentalStatus, RentalStatus)> {
    prop_oneof![
        Just((RentalStatus::Reserved, RentalStatus::Active)),
        Just((RentalStatus::Reserved, RentalStatus::Cancelled)),
        Just((RentalStatus::Active, RentalStatus::Completed)),
        Just((RentalStatus::Overdue, RentalStatus::Completed)),
    ]
}

/// Strategy for a positive money amount with two decimal places.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_created_rental_satisfies_pricing_identity(
        daily in arb_amount(),
        quantity in 1u32..=5,
        days in 1i64..=60,
    ) {
        let rental = build_rental(daily, quantity, days);
        let p = &rental.pricing;

        prop_assert_eq!(
            p.equipment_subtotal,
            round_money(daily * Decimal::from(days) * Decimal::from(quantity))
        );
        prop_assert_eq!(p.subtotal, round_money(p.equipment_subtotal + p.services_subtotal));
        prop_assert_eq!(
            p.total,
            round_money(p.subtotal + p.deposit - p.discount + p.late_fee)
        );
        prop_assert_eq!(p.contracted_days, days);
        prop_assert_eq!(rental.status, RentalStatus::Reserved);
    }

    #[test]
    fn prop_transition_matrix_is_total(
        from in arb_status(),
        target in arb_status(),
    ) {
        let mut rental = build_rental(dec!(100), 1, 10);
        rental.status = from;
        if matches!(from, RentalStatus::Active | RentalStatus::Overdue) {
            rental.dates.pickup_actual = Some(base(0));
        }

        let planned = RentalMachine::plan(&rental, target, base(5), dec!(1.5), |_| {
            Some(rates(dec!(100)))
        });
        if target == from {
            prop_assert!(matches!(planned, Ok(None)));
        } else if RentalMachine::is_valid_transition(from, target) {
            prop_assert!(matches!(planned, Ok(Some(_))));
        } else {
            prop_assert!(
                matches!(planned, Err(RentalError::InvalidTransition { .. })),
                "expected InvalidTransition error"
            );
        }
    }

    #[test]
    fn prop_apply_lands_on_planned_status(
        (from, target) in arb_valid_pair(),
        day in 1i64..=20,
    ) {
        let mut rental = build_rental(dec!(100), 1, 10);
        rental.status = from;
        if matches!(from, RentalStatus::Active | RentalStatus::Overdue) {
            rental.dates.pickup_actual = Some(base(0));
        }

        let plan = RentalMachine::plan(&rental, target, base(day), dec!(1.5), |_| {
            Some(rates(dec!(100)))
        })
        .unwrap()
        .unwrap();

        prop_assert_eq!(plan.from, from);
        prop_assert_eq!(plan.to, target);

        RentalMachine::apply(&mut rental, &plan);
        prop_assert_eq!(rental.status, target);
        prop_assert_eq!(rental.updated_at, base(day));
    }

    #[test]
    fn prop_completion_charges_late_only_past_return(
        quantity in 1u32..=4,
        return_day in 1i64..=25,
    ) {
        let mut rental = build_rental(dec!(100), quantity, 10);
        rental.status = RentalStatus::Active;
        rental.dates.pickup_actual = Some(base(0));

        let plan = RentalMachine::plan(
            &rental,
            RentalStatus::Completed,
            base(return_day),
            dec!(1.5),
            |_| Some(rates(dec!(100))),
        )
        .unwrap()
        .unwrap();
        RentalMachine::apply(&mut rental, &plan);

        prop_assert_eq!(rental.pricing.used_days, return_day);
        if return_day > 10 {
            let expected = Decimal::from(return_day - 10)
                * dec!(100)
                * dec!(1.5)
                * Decimal::from(quantity);
            prop_assert_eq!(rental.pricing.late_fee, round_money(expected));
        } else {
            prop_assert_eq!(rental.pricing.late_fee, Decimal::ZERO);
        }
    }

    #[test]
    fn prop_sweep_flips_only_open_past_due(
        status in arb_status(),
        day in 1i64..=20,
    ) {
        let mut rental = build_rental(dec!(100), 1, 10);
        rental.status = status;

        let expected = matches!(status, RentalStatus::Reserved | RentalStatus::Active)
            && day > 10;
        prop_assert_eq!(RentalMachine::sweep_due(&rental, base(day)), expected);
        prop_assert_eq!(
            RentalMachine::plan_overdue(&rental, base(day)).is_some(),
            expected
        );
    }

    #[test]
    fn prop_extension_only_pushes_out(new_day in 1i64..=40) {
        let mut rental = build_rental(dec!(100), 1, 10);
        let before = rental.pricing.contracted_days;

        let result = RentalMachine::apply_extension(&mut rental, base(new_day), base(1), |_| {
            Some(rates(dec!(100)))
        });
        if new_day > 10 {
            prop_assert!(result.is_ok());
            prop_assert_eq!(rental.dates.return_scheduled, base(new_day));
            prop_assert!(rental.pricing.contracted_days > before);
        } else {
            prop_assert!(
                matches!(result, Err(RentalError::ExtensionTooEarly { .. })),
                "expected ExtensionTooEarly error"
            );
            prop_assert_eq!(rental.dates.return_scheduled, base(10));
        }
    }

    #[test]
    fn prop_discount_applies_within_subtotal(amount in arb_amount()) {
        let mut rental = build_rental(dec!(100), 1, 10);
        let subtotal = rental.pricing.subtotal;
        let deposit = rental.pricing.deposit;

        let result = RentalMachine::apply_discount_amount(&mut rental, amount, base(1));
        if amount <= subtotal {
            prop_assert!(result.is_ok());
            prop_assert_eq!(rental.pricing.total, round_money(subtotal + deposit - amount));
        } else {
            prop_assert!(
                matches!(result, Err(RentalError::DiscountExceedsSubtotal { .. })),
                "expected DiscountExceedsSubtotal error"
            );
            prop_assert_eq!(rental.pricing.discount, Decimal::ZERO);
        }
    }

    #[test]
    fn prop_reservation_actions_cover_every_line(
        quantities in prop::collection::vec(1u32..=5, 1..4),
    ) {
        let items = quantities
            .iter()
            .map(|&quantity| CreateRentalItem {
                item_id: ItemId::new(),
                unit_id: None,
                quantity,
                rental_type: RentalType::Daily,
            })
            .collect();
        let rental = RentalMachine::create(
            make_input(items, 10),
            RentalId::new(),
            "R-000002".to_string(),
            base(-1),
            |_| Some(rates(dec!(75))),
        )
        .unwrap();

        let actions = RentalMachine::reservation_actions(&rental);
        prop_assert_eq!(actions.len(), rental.items.len());
        for (action, line) in actions.iter().zip(&rental.items) {
            prop_assert_eq!(action.action, AllocationAction::Reserve);
            prop_assert_eq!(action.item_id, line.item_id);
            prop_assert_eq!(action.quantity, line.quantity);
        }
    }
}

mod edge_case_tests {
    use super::*;

    #[test]
    fn test_on_time_return_charges_contracted_amount() {
        let mut rental = build_rental(dec!(100), 1, 10);
        rental.status = RentalStatus::Active;
        rental.dates.pickup_actual = Some(base(0));

        let plan = RentalMachine::plan(&rental, RentalStatus::Completed, base(10), dec!(1.5), |_| {
            Some(rates(dec!(100)))
        })
        .unwrap()
        .unwrap();
        RentalMachine::apply(&mut rental, &plan);

        assert_eq!(rental.pricing.equipment_subtotal, dec!(1000));
        assert_eq!(rental.pricing.late_fee, Decimal::ZERO);
        assert_eq!(rental.pricing.total, dec!(1050));
    }

    #[test]
    fn test_discount_survives_settlement() {
        let mut rental = build_rental(dec!(100), 1, 10);
        RentalMachine::apply_discount_amount(&mut rental, dec!(100), base(0)).unwrap();
        rental.status = RentalStatus::Active;
        rental.dates.pickup_actual = Some(base(0));

        let plan = RentalMachine::plan(&rental, RentalStatus::Completed, base(7), dec!(1.5), |_| {
            Some(rates(dec!(100)))
        })
        .unwrap()
        .unwrap();
        RentalMachine::apply(&mut rental, &plan);

        // 700 used + 50 deposit - 100 discount
        assert_eq!(rental.pricing.total, dec!(650));
    }
}
