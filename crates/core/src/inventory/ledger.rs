//! Inventory ledger service.
//!
//! All stock changes flow through here: rental-driven allocations,
//! compensating reversals, and stock-care transfers. Every successful
//! change produces a [`Movement`] with before and after counter
//! snapshots; the caller appends it to the item's movement log.
//!
//! Checks always run before the first mutation, so a returned error
//! means the item was left untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use rentara_shared::types::{CustomerId, ItemId, MovementId, RentalId, UserId};

use super::error::InventoryError;
use super::types::{
    AllocationAction, AllocationContext, InitialStock, Item, Movement, MovementKind,
    QuantityRecord, RateCard, RegisterItemInput, TrackingType, TransferInput, Unit, UnitStatus,
};

/// Outcome of a pool-to-pool shift, before it is wrapped in a movement.
struct Shifted {
    before: QuantityRecord,
    after: QuantityRecord,
    delta: i64,
    unit_id: Option<String>,
}

/// Stateless inventory ledger.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Builds a new item from registration input.
    ///
    /// Unit serials are trimmed and must be unique; quantity-tracked items
    /// start with the full quantity available.
    pub fn register(input: RegisterItemInput, now: DateTime<Utc>) -> Result<Item, InventoryError> {
        if input.name.trim().is_empty() {
            return Err(InventoryError::ItemNameRequired);
        }
        Self::validate_rates(&input.rates)?;

        let (tracking, units, quantities) = match input.stock {
            InitialStock::Units(unit_ids) => {
                let mut units: Vec<Unit> = Vec::with_capacity(unit_ids.len());
                for unit_id in unit_ids {
                    let unit_id = unit_id.trim().to_string();
                    if unit_id.is_empty() {
                        return Err(InventoryError::UnitRequired);
                    }
                    if units.iter().any(|u| u.unit_id == unit_id) {
                        return Err(InventoryError::DuplicateUnit { unit_id });
                    }
                    units.push(Unit::available(unit_id));
                }
                let quantities = QuantityRecord::tally(&units);
                (TrackingType::Unit, units, quantities)
            }
            InitialStock::Quantity(total) => (
                TrackingType::Quantity,
                Vec::new(),
                QuantityRecord::with_available(total),
            ),
        };

        Ok(Item {
            id: ItemId::new(),
            tenant_id: input.tenant_id,
            name: input.name.trim().to_string(),
            tracking,
            rates: input.rates,
            quantities,
            units,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks whether an allocation would succeed, without mutating the item.
    ///
    /// Used as a pre-pass when several items must all be allocatable before
    /// any of them is touched.
    pub fn validate_allocation(
        item: &Item,
        action: AllocationAction,
        unit_id: Option<&str>,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        let (from, _) = action.endpoints();
        match item.tracking {
            TrackingType::Unit => {
                let unit_id = unit_id.ok_or(InventoryError::UnitRequired)?;
                if quantity != 1 {
                    return Err(InventoryError::UnitQuantityInvalid { quantity });
                }
                let unit = item
                    .unit(unit_id)
                    .ok_or_else(|| InventoryError::UnitNotFound {
                        unit_id: unit_id.to_string(),
                    })?;
                if unit.status != from {
                    return Err(InventoryError::UnitNotAvailable {
                        unit_id: unit_id.to_string(),
                        status: unit.status,
                        expected: from,
                    });
                }
                Ok(())
            }
            TrackingType::Quantity => {
                if quantity == 0 {
                    return Err(InventoryError::ZeroQuantity);
                }
                let held = item.quantities.pool(from);
                if held < quantity {
                    return Err(InventoryError::InsufficientQuantity {
                        requested: quantity,
                        available: held,
                        pool: from,
                    });
                }
                Ok(())
            }
        }
    }

    /// Applies a rental-driven allocation and returns the movement record.
    pub fn apply_allocation(
        item: &mut Item,
        action: AllocationAction,
        unit_id: Option<&str>,
        quantity: u32,
        ctx: &AllocationContext,
    ) -> Result<Movement, InventoryError> {
        let (from, to) = action.endpoints();
        let shifted = Self::shift(
            item,
            from,
            to,
            unit_id,
            quantity,
            Some(ctx.rental_id),
            ctx.customer_id,
        )?;
        item.updated_at = ctx.occurred_at;
        Ok(Self::movement(
            item,
            action.movement_kind(),
            Some(ctx.rental_id),
            shifted,
            ctx.recorded_by,
            ctx.occurred_at,
        ))
    }

    /// Undoes an earlier allocation by shifting stock back along the
    /// action's endpoints in reverse. Recorded as a reversal, never by
    /// editing the original movement.
    pub fn revert_allocation(
        item: &mut Item,
        original: AllocationAction,
        unit_id: Option<&str>,
        quantity: u32,
        ctx: &AllocationContext,
    ) -> Result<Movement, InventoryError> {
        let (from, to) = original.endpoints();
        let shifted = Self::shift(
            item,
            to,
            from,
            unit_id,
            quantity,
            Some(ctx.rental_id),
            ctx.customer_id,
        )?;
        item.updated_at = ctx.occurred_at;
        Ok(Self::movement(
            item,
            MovementKind::Reversal,
            Some(ctx.rental_id),
            shifted,
            ctx.recorded_by,
            ctx.occurred_at,
        ))
    }

    /// Moves stock between the care pools: available, maintenance, damaged.
    ///
    /// Reserved and rented stock belongs to rentals and can only move
    /// through the rental lifecycle.
    pub fn transfer(
        item: &mut Item,
        input: &TransferInput,
        occurred_at: DateTime<Utc>,
    ) -> Result<Movement, InventoryError> {
        if !input.from.is_care_state() || !input.to.is_care_state() || input.from == input.to {
            return Err(InventoryError::TransferNotAllowed {
                from: input.from,
                to: input.to,
            });
        }
        let shifted = Self::shift(
            item,
            input.from,
            input.to,
            input.unit_id.as_deref(),
            input.quantity,
            None,
            None,
        )?;
        item.updated_at = occurred_at;
        Ok(Self::movement(
            item,
            MovementKind::Transfer,
            None,
            shifted,
            input.moved_by,
            occurred_at,
        ))
    }

    /// Moves stock from one pool to another.
    ///
    /// Unit-tracked: flips the unit's status, maintains its rental back
    /// references, then recomputes the counters from unit statuses.
    /// Quantity-tracked: decrements the source counter and increments the
    /// destination, erroring if the source would go negative.
    fn shift(
        item: &mut Item,
        from: UnitStatus,
        to: UnitStatus,
        unit_id: Option<&str>,
        quantity: u32,
        rental_id: Option<RentalId>,
        customer_id: Option<CustomerId>,
    ) -> Result<Shifted, InventoryError> {
        match item.tracking {
            TrackingType::Unit => {
                let unit_id = unit_id.ok_or(InventoryError::UnitRequired)?;
                if quantity != 1 {
                    return Err(InventoryError::UnitQuantityInvalid { quantity });
                }
                let unit = item
                    .units
                    .iter_mut()
                    .find(|u| u.unit_id == unit_id)
                    .ok_or_else(|| InventoryError::UnitNotFound {
                        unit_id: unit_id.to_string(),
                    })?;
                if unit.status != from {
                    return Err(InventoryError::UnitNotAvailable {
                        unit_id: unit_id.to_string(),
                        status: unit.status,
                        expected: from,
                    });
                }

                unit.status = to;
                match to {
                    UnitStatus::Available | UnitStatus::Maintenance | UnitStatus::Damaged => {
                        unit.rental_id = None;
                        unit.customer_id = None;
                    }
                    UnitStatus::Reserved | UnitStatus::Rented => {
                        // Refs attach when leaving the free pool and survive
                        // reserved <-> rented flips.
                        if from == UnitStatus::Available {
                            unit.rental_id = rental_id;
                            unit.customer_id = customer_id;
                        }
                    }
                }

                let before = item.quantities;
                let after = QuantityRecord::tally(&item.units);
                item.quantities = after;
                Ok(Shifted {
                    before,
                    after,
                    delta: available_delta(from, to, 1),
                    unit_id: Some(unit_id.to_string()),
                })
            }
            TrackingType::Quantity => {
                if quantity == 0 {
                    return Err(InventoryError::ZeroQuantity);
                }
                let before = item.quantities;
                let held = before.pool(from);
                if held < quantity {
                    return Err(InventoryError::InsufficientQuantity {
                        requested: quantity,
                        available: held,
                        pool: from,
                    });
                }
                *item.quantities.pool_mut(from) -= quantity;
                *item.quantities.pool_mut(to) += quantity;
                Ok(Shifted {
                    before,
                    after: item.quantities,
                    delta: available_delta(from, to, quantity),
                    unit_id: None,
                })
            }
        }
    }

    fn movement(
        item: &Item,
        kind: MovementKind,
        rental_id: Option<RentalId>,
        shifted: Shifted,
        recorded_by: UserId,
        recorded_at: DateTime<Utc>,
    ) -> Movement {
        Movement {
            id: MovementId::new(),
            tenant_id: item.tenant_id,
            item_id: item.id,
            rental_id,
            kind,
            delta: shifted.delta,
            unit_id: shifted.unit_id,
            before: shifted.before,
            after: shifted.after,
            recorded_by,
            recorded_at,
        }
    }

    fn validate_rates(rates: &RateCard) -> Result<(), InventoryError> {
        let tiers = [Some(rates.daily), rates.weekly, rates.biweekly, rates.monthly];
        for rate in tiers.into_iter().flatten() {
            if rate <= Decimal::ZERO {
                return Err(InventoryError::NonPositiveRate { rate });
            }
        }
        Ok(())
    }
}

/// Signed change to the available pool for a shift along `from -> to`.
fn available_delta(from: UnitStatus, to: UnitStatus, quantity: u32) -> i64 {
    let quantity = i64::from(quantity);
    match (from == UnitStatus::Available, to == UnitStatus::Available) {
        (true, false) => -quantity,
        (false, true) => quantity,
        _ => 0,
    }
}
