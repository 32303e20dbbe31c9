//! Property-based tests for InventoryLedger.
//!
//! - Property: allocations conserve the total and keep counters consistent
//! - Property: unit-tracked counters always match the tally of unit statuses
//! - Property: failed operations leave the item untouched
//! - Property: reversals restore the prior counters

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use rentara_shared::types::{CustomerId, ItemId, RentalId, TenantId, UserId};

use super::ledger::InventoryLedger;
use super::types::{
    AllocationAction, AllocationContext, Item, QuantityRecord, RateCard, TrackingType, Unit,
    UnitStatus,
};

/// Strategy to generate counter pools with a consistent total.
fn arb_pools() -> impl Strategy<Value = QuantityRecord> {
    (0u32..20, 0u32..20, 0u32..20, 0u32..10, 0u32..10).prop_map(
        |(available, reserved, rented, maintenance, damaged)| QuantityRecord {
            total: available + reserved + rented + maintenance + damaged,
            available,
            reserved,
            rented,
            maintenance,
            damaged,
        },
    )
}

/// Strategy to generate an allocation action.
fn arb_action() -> impl Strategy<Value = AllocationAction> {
    prop_oneof![
        Just(AllocationAction::Reserve),
        Just(AllocationAction::Activate),
        Just(AllocationAction::Return),
        Just(AllocationAction::Cancel),
    ]
}

/// Strategy to generate a unit status.
fn arb_status() -> impl Strategy<Value = UnitStatus> {
    prop_oneof![
        Just(UnitStatus::Available),
        Just(UnitStatus::Reserved),
        Just(UnitStatus::Rented),
        Just(UnitStatus::Maintenance),
        Just(UnitStatus::Damaged),
    ]
}

/// Helper to build a quantity-tracked item around given pools.
fn quantity_item(pools: QuantityRecord) -> Item {
    Item {
        id: ItemId::new(),
        tenant_id: TenantId::new(),
        name: "Pallet Jack".to_string(),
        tracking: TrackingType::Quantity,
        rates: RateCard::daily_only(Decimal::new(50, 0)),
        quantities: pools,
        units: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Helper to build a unit-tracked item with the given unit statuses.
fn unit_item(statuses: &[UnitStatus]) -> Item {
    let units: Vec<Unit> = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| Unit {
            unit_id: format!("U-{i:02}"),
            status: *status,
            rental_id: status.is_allocated().then(RentalId::new),
            customer_id: None,
        })
        .collect();
    let quantities = QuantityRecord::tally(&units);
    Item {
        id: ItemId::new(),
        tenant_id: TenantId::new(),
        name: "Mini Excavator".to_string(),
        tracking: TrackingType::Unit,
        rates: RateCard::daily_only(Decimal::new(450, 0)),
        quantities,
        units,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Helper allocation context.
fn ctx() -> AllocationContext {
    AllocationContext {
        rental_id: RentalId::new(),
        customer_id: Some(CustomerId::new()),
        recorded_by: UserId::new(),
        occurred_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* quantity-tracked item, a successful allocation never changes
    /// the total, keeps the counters consistent, and the movement's after
    /// snapshot matches the item.
    #[test]
    fn prop_quantity_allocation_conserves_total(
        pools in arb_pools(),
        action in arb_action(),
        quantity in 1u32..15,
    ) {
        let mut item = quantity_item(pools);
        let total_before = item.quantities.total;

        if let Ok(movement) =
            InventoryLedger::apply_allocation(&mut item, action, None, quantity, &ctx())
        {
            prop_assert_eq!(item.quantities.total, total_before);
            prop_assert!(item.quantities.is_consistent());
            prop_assert_eq!(movement.after, item.quantities);
            prop_assert_eq!(movement.before, pools);
        }
    }

    /// *For any* failed allocation, the item is left exactly as it was.
    #[test]
    fn prop_failed_allocation_is_atomic(
        pools in arb_pools(),
        action in arb_action(),
        quantity in 0u32..40,
    ) {
        let mut item = quantity_item(pools);

        if InventoryLedger::apply_allocation(&mut item, action, None, quantity, &ctx()).is_err() {
            prop_assert_eq!(item.quantities, pools);
        }
    }

    /// *For any* successful allocation, the movement delta equals the signed
    /// change in the available pool.
    #[test]
    fn prop_delta_matches_available_change(
        pools in arb_pools(),
        action in arb_action(),
        quantity in 1u32..15,
    ) {
        let mut item = quantity_item(pools);

        if let Ok(movement) =
            InventoryLedger::apply_allocation(&mut item, action, None, quantity, &ctx())
        {
            let change =
                i64::from(movement.after.available) - i64::from(movement.before.available);
            prop_assert_eq!(movement.delta, change);
        }
    }

    /// *For any* applied allocation, reverting it restores the original
    /// counters and records a reversal rather than editing history.
    #[test]
    fn prop_revert_round_trips(
        pools in arb_pools(),
        action in arb_action(),
        quantity in 1u32..15,
    ) {
        let mut item = quantity_item(pools);
        let ctx = ctx();

        if InventoryLedger::apply_allocation(&mut item, action, None, quantity, &ctx).is_ok() {
            let reversal =
                InventoryLedger::revert_allocation(&mut item, action, None, quantity, &ctx);
            prop_assert!(reversal.is_ok());
            prop_assert_eq!(item.quantities, pools);
        }
    }

    /// *For any* unit-tracked item, the counters equal the tally of unit
    /// statuses after every operation, successful or not.
    #[test]
    fn prop_unit_counters_match_statuses(
        statuses in proptest::collection::vec(arb_status(), 1..8),
        index in 0usize..8,
        action in arb_action(),
    ) {
        let mut item = unit_item(&statuses);
        let index = index % item.units.len();
        let unit_id = item.units[index].unit_id.clone();

        let _ = InventoryLedger::apply_allocation(&mut item, action, Some(&unit_id), 1, &ctx());

        prop_assert_eq!(item.quantities, QuantityRecord::tally(&item.units));
        prop_assert!(item.quantities.is_consistent());
    }

    /// *For any* unit, an allocation succeeds exactly when the unit sits at
    /// the action's source status, and moves it to the destination status.
    #[test]
    fn prop_unit_allocation_respects_endpoints(
        statuses in proptest::collection::vec(arb_status(), 1..8),
        index in 0usize..8,
        action in arb_action(),
    ) {
        let mut item = unit_item(&statuses);
        let index = index % item.units.len();
        let unit_id = item.units[index].unit_id.clone();
        let status_before = item.units[index].status;
        let (from, to) = action.endpoints();

        let result =
            InventoryLedger::apply_allocation(&mut item, action, Some(&unit_id), 1, &ctx());

        if status_before == from {
            prop_assert!(result.is_ok());
            prop_assert_eq!(item.units[index].status, to);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(item.units[index].status, status_before);
        }
    }
}

#[cfg(test)]
mod edge_case_tests {
    use super::*;
    use crate::inventory::error::InventoryError;

    /// Reserving from an empty pool fails with the pool detail.
    #[test]
    fn test_empty_pool_rejects_reserve() {
        let mut item = quantity_item(QuantityRecord::zero());
        let result =
            InventoryLedger::apply_allocation(&mut item, AllocationAction::Reserve, None, 1, &ctx());
        assert!(matches!(
            result,
            Err(InventoryError::InsufficientQuantity {
                requested: 1,
                available: 0,
                pool: UnitStatus::Available,
            })
        ));
    }

    /// The full reserve -> activate -> return cycle is counter-neutral.
    #[test]
    fn test_full_cycle_is_counter_neutral() {
        let mut item = quantity_item(QuantityRecord::with_available(5));
        let ctx = ctx();

        for action in [
            AllocationAction::Reserve,
            AllocationAction::Activate,
            AllocationAction::Return,
        ] {
            InventoryLedger::apply_allocation(&mut item, action, None, 3, &ctx).unwrap();
        }

        assert_eq!(item.quantities, QuantityRecord::with_available(5));
    }
}
