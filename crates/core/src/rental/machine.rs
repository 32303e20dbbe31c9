//! Rental lifecycle state machine.
//!
//! Transitions are planned first, then applied: [`RentalMachine::plan`]
//! validates a requested status change against the current state and
//! produces a [`TransitionPlan`] carrying the rental-local effect plus
//! the ledger actions each line needs. The caller drives the ledger with
//! those actions and only then calls [`RentalMachine::apply`], so a plan
//! that fails validation never touches anything.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use rentara_shared::types::{ItemId, RentalId, UserId};

use crate::approval::{ChangeRequest, PendingApproval};
use crate::inventory::{AllocationAction, RateCard};
use crate::pricing::{
    rental_days, rental_price, round_money, settle, LineUsage, PricingError, RentalType,
    Settlement, SettlementInput,
};

use super::error::RentalError;
use super::types::{
    ChangeRecord, CreateRentalInput, Rental, RentalDates, RentalItem, RentalPricing, RentalStatus,
    ServiceLine,
};

/// A ledger action planned for one rental line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    /// The line's item.
    pub item_id: ItemId,
    /// The line's unit serial, for unit-tracked items.
    pub unit_id: Option<String>,
    /// Units the action moves.
    pub quantity: u32,
    /// The allocation action to drive.
    pub action: AllocationAction,
}

/// The rental-local effect of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionEffect {
    /// Pickup: stamps the actual pickup and anchors the billing cycle.
    Activate {
        /// When the equipment was picked up.
        picked_up_at: DateTime<Utc>,
    },
    /// Return: stamps the actual return and settles the bill.
    Complete {
        /// When the equipment came back.
        returned_at: DateTime<Utc>,
        /// The settled amounts.
        settlement: Settlement,
        /// Days actually used.
        used_days: i64,
        /// Days past the scheduled return.
        days_late: i64,
    },
    /// Release: the reservation ends without pickup.
    Cancel,
    /// Past-due flip performed by the sweep.
    MarkOverdue,
}

/// A validated transition, ready to drive the ledger and then apply.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    /// Status the rental leaves.
    pub from: RentalStatus,
    /// Status the rental enters.
    pub to: RentalStatus,
    /// When the transition happens.
    pub occurred_at: DateTime<Utc>,
    /// Ledger action per rental line, in line order.
    pub item_actions: Vec<PlannedAction>,
    /// The rental-local effect.
    pub effect: TransitionEffect,
}

/// Stateless rental lifecycle engine.
pub struct RentalMachine;

impl RentalMachine {
    /// Whether a status change may be requested from `from` to `to`.
    ///
    /// Overdue is entered only by the sweep and is not a requestable
    /// target.
    #[must_use]
    pub fn is_valid_transition(from: RentalStatus, to: RentalStatus) -> bool {
        matches!(
            (from, to),
            (RentalStatus::Reserved, RentalStatus::Active)
                | (RentalStatus::Reserved, RentalStatus::Cancelled)
                | (RentalStatus::Active | RentalStatus::Overdue, RentalStatus::Completed)
        )
    }

    /// Builds a new rental in `reserved` status, pricing every line over
    /// the scheduled span.
    ///
    /// `rate_lookup` resolves an item's rate card; the line's tier must be
    /// configured on it.
    pub fn create<F>(
        input: CreateRentalInput,
        rental_id: RentalId,
        rental_number: String,
        now: DateTime<Utc>,
        rate_lookup: F,
    ) -> Result<Rental, RentalError>
    where
        F: Fn(ItemId) -> Option<RateCard>,
    {
        if input.items.is_empty() {
            return Err(RentalError::EmptyRental);
        }
        if input.return_scheduled <= input.pickup_scheduled {
            return Err(RentalError::InvalidDates {
                pickup_scheduled: input.pickup_scheduled,
                return_scheduled: input.return_scheduled,
            });
        }
        if input.deposit < Decimal::ZERO {
            return Err(RentalError::NegativeDeposit);
        }

        let mut items = Vec::with_capacity(input.items.len());
        let mut equipment = Decimal::ZERO;
        for line in input.items {
            let rates = rate_lookup(line.item_id).ok_or(RentalError::RateUnavailable {
                item_id: line.item_id,
            })?;
            let unit_price = rates
                .rate_for(line.rental_type)
                .ok_or(PricingError::RateNotConfigured {
                    rental_type: line.rental_type,
                })?;
            let per_unit = rental_price(
                &rates,
                line.rental_type,
                input.pickup_scheduled,
                input.return_scheduled,
            )?;
            let subtotal = per_unit * Decimal::from(line.quantity);
            equipment += subtotal;
            items.push(RentalItem {
                item_id: line.item_id,
                unit_id: line.unit_id,
                quantity: line.quantity,
                unit_price,
                rental_type: line.rental_type,
                subtotal,
            });
        }

        let mut services_subtotal = Decimal::ZERO;
        for service in &input.services {
            Self::validate_service(service)?;
            services_subtotal += service.price;
        }

        let equipment_subtotal = round_money(equipment);
        let mut pricing = RentalPricing {
            equipment_subtotal,
            original_equipment_subtotal: equipment_subtotal,
            services_subtotal: round_money(services_subtotal),
            contracted_days: rental_days(input.pickup_scheduled, input.return_scheduled),
            subtotal: Decimal::ZERO,
            deposit: input.deposit,
            discount: Decimal::ZERO,
            late_fee: Decimal::ZERO,
            used_days: 0,
            total: Decimal::ZERO,
        };
        pricing.recompute();

        Ok(Rental {
            id: rental_id,
            tenant_id: input.tenant_id,
            rental_number,
            customer_id: input.customer_id,
            status: RentalStatus::Reserved,
            items,
            services: input.services,
            dates: RentalDates {
                reserved_at: now,
                pickup_scheduled: input.pickup_scheduled,
                pickup_actual: None,
                return_scheduled: input.return_scheduled,
                return_actual: None,
                billing_cycle: None,
            },
            pricing,
            change_history: Vec::new(),
            pending_approvals: Vec::new(),
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Ledger actions that place the initial holds for a new rental.
    #[must_use]
    pub fn reservation_actions(rental: &Rental) -> Vec<PlannedAction> {
        Self::item_actions(rental, AllocationAction::Reserve)
    }

    /// Plans a requested status change.
    ///
    /// Requesting the current status is an idempotent no-op and returns
    /// `Ok(None)`. Anything outside the transition matrix fails with
    /// `InvalidTransition`. Completion settles the bill over the days
    /// actually used; a rental that was never picked up settles from the
    /// scheduled pickup and releases its holds instead of returning them.
    pub fn plan<F>(
        rental: &Rental,
        target: RentalStatus,
        now: DateTime<Utc>,
        late_fee_multiplier: Decimal,
        rate_lookup: F,
    ) -> Result<Option<TransitionPlan>, RentalError>
    where
        F: Fn(ItemId) -> Option<RateCard>,
    {
        if target == rental.status {
            return Ok(None);
        }
        if !Self::is_valid_transition(rental.status, target) {
            return Err(RentalError::InvalidTransition {
                from: rental.status,
                to: target,
            });
        }

        let plan = match target {
            RentalStatus::Active => TransitionPlan {
                from: rental.status,
                to: target,
                occurred_at: now,
                item_actions: Self::item_actions(rental, AllocationAction::Activate),
                effect: TransitionEffect::Activate { picked_up_at: now },
            },
            RentalStatus::Cancelled => TransitionPlan {
                from: rental.status,
                to: target,
                occurred_at: now,
                item_actions: Self::item_actions(rental, AllocationAction::Cancel),
                effect: TransitionEffect::Cancel,
            },
            RentalStatus::Completed => {
                let anchor = rental
                    .dates
                    .pickup_actual
                    .unwrap_or(rental.dates.pickup_scheduled);
                let action = if rental.dates.pickup_actual.is_some() {
                    AllocationAction::Return
                } else {
                    AllocationAction::Cancel
                };
                let used_days = rental_days(anchor, now);
                let days_late = rental_days(rental.dates.return_scheduled, now);

                let mut lines = Vec::with_capacity(rental.items.len());
                for line in &rental.items {
                    let rates = rate_lookup(line.item_id).ok_or(RentalError::RateUnavailable {
                        item_id: line.item_id,
                    })?;
                    lines.push(LineUsage {
                        unit_price: line.unit_price,
                        rental_type: line.rental_type,
                        quantity: line.quantity,
                        daily_rate: rates.daily,
                    });
                }
                let settlement = settle(&SettlementInput {
                    lines,
                    services_subtotal: rental.pricing.services_subtotal,
                    deposit: rental.pricing.deposit,
                    discount: rental.pricing.discount,
                    used_days,
                    days_late,
                    late_fee_multiplier,
                });

                TransitionPlan {
                    from: rental.status,
                    to: target,
                    occurred_at: now,
                    item_actions: Self::item_actions(rental, action),
                    effect: TransitionEffect::Complete {
                        returned_at: now,
                        settlement,
                        used_days,
                        days_late,
                    },
                }
            }
            RentalStatus::Reserved | RentalStatus::Overdue => {
                return Err(RentalError::InvalidTransition {
                    from: rental.status,
                    to: target,
                });
            }
        };
        Ok(Some(plan))
    }

    /// Whether the sweep should flip this rental to overdue.
    #[must_use]
    pub fn sweep_due(rental: &Rental, now: DateTime<Utc>) -> bool {
        matches!(
            rental.status,
            RentalStatus::Reserved | RentalStatus::Active
        ) && rental.dates.return_scheduled < now
    }

    /// Plans the sweep's past-due flip, if it applies.
    ///
    /// The flip touches no inventory: holds and rented stock stay where
    /// they are until the rental completes.
    #[must_use]
    pub fn plan_overdue(rental: &Rental, now: DateTime<Utc>) -> Option<TransitionPlan> {
        if !Self::sweep_due(rental, now) {
            return None;
        }
        Some(TransitionPlan {
            from: rental.status,
            to: RentalStatus::Overdue,
            occurred_at: now,
            item_actions: Vec::new(),
            effect: TransitionEffect::MarkOverdue,
        })
    }

    /// Applies a plan's rental-local effect.
    pub fn apply(rental: &mut Rental, plan: &TransitionPlan) {
        rental.status = plan.to;
        rental.updated_at = plan.occurred_at;
        match &plan.effect {
            TransitionEffect::Activate { picked_up_at } => {
                rental.dates.pickup_actual = Some(*picked_up_at);
                rental.dates.billing_cycle = Some(*picked_up_at);
            }
            TransitionEffect::Complete {
                returned_at,
                settlement,
                used_days,
                ..
            } => {
                rental.dates.return_actual = Some(*returned_at);
                rental.pricing.equipment_subtotal = settlement.equipment_subtotal;
                rental.pricing.late_fee = settlement.late_fee;
                rental.pricing.subtotal = settlement.subtotal;
                rental.pricing.total = settlement.total;
                rental.pricing.used_days = *used_days;
            }
            TransitionEffect::Cancel | TransitionEffect::MarkOverdue => {}
        }
    }

    /// Pushes the scheduled return out and re-prices every line over the
    /// extended span. The status does not change; an overdue rental stays
    /// overdue until the next sweep or completion.
    pub fn apply_extension<F>(
        rental: &mut Rental,
        new_return: DateTime<Utc>,
        now: DateTime<Utc>,
        rate_lookup: F,
    ) -> Result<(), RentalError>
    where
        F: Fn(ItemId) -> Option<RateCard>,
    {
        if !matches!(
            rental.status,
            RentalStatus::Reserved | RentalStatus::Active | RentalStatus::Overdue
        ) {
            return Err(RentalError::InvalidState {
                status: rental.status,
            });
        }
        if new_return <= rental.dates.return_scheduled {
            return Err(RentalError::ExtensionTooEarly {
                current: rental.dates.return_scheduled,
                requested: new_return,
            });
        }

        let start = rental.dates.pickup_scheduled;
        let mut equipment = Decimal::ZERO;
        let mut new_subtotals = Vec::with_capacity(rental.items.len());
        for line in &rental.items {
            let rates = rate_lookup(line.item_id).ok_or(RentalError::RateUnavailable {
                item_id: line.item_id,
            })?;
            let per_unit = rental_price(&rates, line.rental_type, start, new_return)?;
            let subtotal = per_unit * Decimal::from(line.quantity);
            equipment += subtotal;
            new_subtotals.push(subtotal);
        }
        for (line, subtotal) in rental.items.iter_mut().zip(new_subtotals) {
            line.subtotal = subtotal;
        }

        let equipment = round_money(equipment);
        rental.pricing.equipment_subtotal = equipment;
        rental.pricing.original_equipment_subtotal = equipment;
        rental.pricing.contracted_days = rental_days(start, new_return);
        rental.dates.return_scheduled = new_return;
        rental.pricing.recompute();
        rental.updated_at = now;
        Ok(())
    }

    /// Switches one line to another rate tier and re-prices it over the
    /// scheduled span. Switching to the line's current tier is a no-op.
    pub fn apply_rental_type_change<F>(
        rental: &mut Rental,
        item_id: ItemId,
        rental_type: RentalType,
        now: DateTime<Utc>,
        rate_lookup: F,
    ) -> Result<(), RentalError>
    where
        F: Fn(ItemId) -> Option<RateCard>,
    {
        if !matches!(rental.status, RentalStatus::Reserved | RentalStatus::Active) {
            return Err(RentalError::InvalidState {
                status: rental.status,
            });
        }
        let start = rental.dates.pickup_scheduled;
        let end = rental.dates.return_scheduled;

        let line = rental
            .line(item_id)
            .ok_or(RentalError::LineNotFound { item_id })?;
        if line.rental_type == rental_type {
            return Ok(());
        }
        let quantity = line.quantity;
        let rates = rate_lookup(item_id).ok_or(RentalError::RateUnavailable { item_id })?;
        let unit_price = rates
            .rate_for(rental_type)
            .ok_or(PricingError::RateNotConfigured { rental_type })?;
        let subtotal = rental_price(&rates, rental_type, start, end)? * Decimal::from(quantity);

        let line = rental
            .line_mut(item_id)
            .ok_or(RentalError::LineNotFound { item_id })?;
        line.rental_type = rental_type;
        line.unit_price = unit_price;
        line.subtotal = subtotal;

        let equipment = round_money(rental.items.iter().map(|l| l.subtotal).sum::<Decimal>());
        rental.pricing.equipment_subtotal = equipment;
        rental.pricing.original_equipment_subtotal = equipment;
        rental.pricing.recompute();
        rental.updated_at = now;
        Ok(())
    }

    /// Sets the rental's discount and recomputes the total.
    ///
    /// The gate decides *whether* this runs; the checks here hold
    /// regardless of who asks.
    pub fn apply_discount_amount(
        rental: &mut Rental,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), RentalError> {
        if rental.is_terminal() {
            return Err(RentalError::InvalidState {
                status: rental.status,
            });
        }
        if amount < Decimal::ZERO {
            return Err(RentalError::NegativeDiscount);
        }
        if amount > rental.pricing.subtotal {
            return Err(RentalError::DiscountExceedsSubtotal {
                discount: amount,
                subtotal: rental.pricing.subtotal,
            });
        }
        rental.pricing.discount = amount;
        rental.pricing.recompute();
        rental.updated_at = now;
        Ok(())
    }

    /// Adds a service line and folds its price into the totals.
    pub fn apply_service(
        rental: &mut Rental,
        service: ServiceLine,
        now: DateTime<Utc>,
    ) -> Result<(), RentalError> {
        if rental.is_terminal() {
            return Err(RentalError::InvalidState {
                status: rental.status,
            });
        }
        Self::validate_service(&service)?;
        rental.services.push(service);
        rental.pricing.services_subtotal =
            round_money(rental.services.iter().map(|s| s.price).sum::<Decimal>());
        rental.pricing.recompute();
        rental.updated_at = now;
        Ok(())
    }

    /// Queues a deferred mutation, returning its index in
    /// `pending_approvals`.
    pub fn queue_approval(
        rental: &mut Rental,
        request: ChangeRequest,
        requested_by: UserId,
        now: DateTime<Utc>,
    ) -> usize {
        rental
            .pending_approvals
            .push(PendingApproval::new(request, requested_by, now));
        rental.updated_at = now;
        rental.pending_approvals.len() - 1
    }

    /// Appends a change-history entry for an approval-applied mutation.
    pub fn record_change(
        rental: &mut Rental,
        request: ChangeRequest,
        requested_by: UserId,
        approved_by: UserId,
        now: DateTime<Utc>,
    ) {
        rental.change_history.push(ChangeRecord {
            request,
            requested_by,
            approved_by,
            approved_at: now,
        });
    }

    fn item_actions(rental: &Rental, action: AllocationAction) -> Vec<PlannedAction> {
        rental
            .items
            .iter()
            .map(|line| PlannedAction {
                item_id: line.item_id,
                unit_id: line.unit_id.clone(),
                quantity: line.quantity,
                action,
            })
            .collect()
    }

    fn validate_service(service: &ServiceLine) -> Result<(), RentalError> {
        if service.name.trim().is_empty() {
            return Err(RentalError::ServiceNameRequired);
        }
        if service.price < Decimal::ZERO {
            return Err(RentalError::NegativeServicePrice);
        }
        Ok(())
    }
}
