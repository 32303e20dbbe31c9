//! Property-based tests for the approval gate.
//!
//! - Property: admin-or-above actors are never deferred
//! - Property: below admin, only in-threshold discounts apply
//! - Property: resolution privilege follows the role ordering

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use rentara_shared::types::ItemId;

use crate::pricing::RentalType;
use crate::rental::RentalStatus;

use super::gate::ApprovalGate;
use super::types::{ChangeRequest, GateDecision, StaffRole};

/// Strategy to generate positive money amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a staff role.
fn arb_role() -> impl Strategy<Value = StaffRole> {
    prop_oneof![
        Just(StaffRole::Staff),
        Just(StaffRole::Operator),
        Just(StaffRole::Admin),
        Just(StaffRole::Owner),
    ]
}

/// Strategy to generate a target rental status.
fn arb_status() -> impl Strategy<Value = RentalStatus> {
    prop_oneof![
        Just(RentalStatus::Reserved),
        Just(RentalStatus::Active),
        Just(RentalStatus::Overdue),
        Just(RentalStatus::Completed),
        Just(RentalStatus::Cancelled),
    ]
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

/// Strategy to generate any change request.
fn arb_request() -> impl Strategy<Value = ChangeRequest> {
    prop_oneof![
        arb_status().prop_map(|target| ChangeRequest::StatusChange { target }),
        (positive_amount(), "[a-z ]{1,24}")
            .prop_map(|(amount, reason)| ChangeRequest::Discount { amount, reason }),
        (any::<u128>(), arb_rental_type()).prop_map(|(n, rental_type)| {
            ChangeRequest::RentalTypeChange {
                item_id: ItemId::from_uuid(Uuid::from_u128(n)),
                rental_type,
            }
        }),
        (0i64..365).prop_map(|days| ChangeRequest::Extension {
            new_return: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + Duration::days(days),
        }),
        ("[A-Za-z ]{1,24}", positive_amount())
            .prop_map(|(name, price)| ChangeRequest::ServiceAddition { name, price }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* request, admin-or-above actors apply directly.
    #[test]
    fn prop_admin_always_applies(
        request in arb_request(),
        subtotal in positive_amount(),
        admin in prop_oneof![Just(StaffRole::Admin), Just(StaffRole::Owner)],
    ) {
        let decision = ApprovalGate::evaluate(admin, &request, subtotal, Decimal::TEN);
        prop_assert_eq!(decision, GateDecision::Apply);
    }

    /// *For any* non-discount request, actors below admin are deferred.
    #[test]
    fn prop_below_admin_defers_non_discounts(
        request in arb_request(),
        subtotal in positive_amount(),
        role in prop_oneof![Just(StaffRole::Staff), Just(StaffRole::Operator)],
    ) {
        prop_assume!(!matches!(request, ChangeRequest::Discount { .. }));
        let decision = ApprovalGate::evaluate(role, &request, subtotal, Decimal::TEN);
        prop_assert_eq!(decision, GateDecision::Defer);
    }

    /// *For any* discount from a below-admin actor, the decision agrees
    /// with the threshold check.
    #[test]
    fn prop_discount_decision_matches_threshold(
        amount in positive_amount(),
        subtotal in positive_amount(),
        percent in (1i64..50).prop_map(Decimal::from),
        role in prop_oneof![Just(StaffRole::Staff), Just(StaffRole::Operator)],
    ) {
        let request = ChangeRequest::Discount {
            amount,
            reason: "seasonal".to_string(),
        };
        let decision = ApprovalGate::evaluate(role, &request, subtotal, percent);
        let within = ApprovalGate::within_auto_approve(amount, subtotal, percent);
        prop_assert_eq!(decision == GateDecision::Apply, within);
    }

    /// *For any* role, resolution privilege is admin-or-above.
    #[test]
    fn prop_resolution_follows_role_order(role in arb_role()) {
        prop_assert_eq!(ApprovalGate::can_resolve(role), role >= StaffRole::Admin);
    }

    /// *For any* deferred decision, the actor was below admin.
    #[test]
    fn prop_only_below_admin_defers(
        request in arb_request(),
        subtotal in positive_amount(),
        role in arb_role(),
    ) {
        let decision = ApprovalGate::evaluate(role, &request, subtotal, Decimal::TEN);
        if decision == GateDecision::Defer {
            prop_assert!(!role.is_admin());
        }
    }
}
