//! Rental engine: drives the lifecycle machine, inventory ledger and
//! approval gate over the async store ports.
//!
//! Rentals and items are separate consistency units. Multi-item
//! operations validate every item before touching any of them, apply
//! allocations one aggregate at a time, and compensate with ledger
//! reversals when a later step fails. Status commits re-validate the
//! source status inside the rental aggregate's exclusive update, so a
//! lost race surfaces as `InvalidTransition` instead of a double apply.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use rentara_core::approval::{
    Actor, ApprovalError, ApprovalGate, ApprovalStatus, ChangeRequest, GateDecision, StaffRole,
};
use rentara_core::inventory::{
    AllocationContext, InventoryLedger, Item, Movement, RateCard, RegisterItemInput, TransferInput,
};
use rentara_core::pricing::RentalType;
use rentara_core::rental::{
    CreateRentalInput, MutationOutcome, PlannedAction, Rental, RentalError, RentalMachine,
    RentalStatus, ServiceLine,
};
use rentara_shared::config::EngineSettings;
use rentara_shared::types::{ItemId, RentalId, TenantId, UserId};

use crate::error::EngineError;
use crate::ports::{
    InventoryStore, NotificationRelay, RentalStore, RequestRejection, StaffDirectory, StaffMember,
    StatusChangeRequest,
};

/// Orchestrates rental operations over pluggable persistence and
/// notification collaborators.
pub struct RentalEngine<R, I, N, D> {
    rentals: Arc<R>,
    items: Arc<I>,
    relay: Arc<N>,
    directory: Arc<D>,
    settings: EngineSettings,
}

impl<R, I, N, D> RentalEngine<R, I, N, D>
where
    R: RentalStore,
    I: InventoryStore,
    N: NotificationRelay,
    D: StaffDirectory,
{
    /// Wires an engine to its collaborators.
    pub fn new(
        rentals: Arc<R>,
        items: Arc<I>,
        relay: Arc<N>,
        directory: Arc<D>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            rentals,
            items,
            relay,
            directory,
            settings,
        }
    }

    /// Creates a rental in `reserved` status and places a hold on every
    /// line's stock.
    ///
    /// All lines are validated against live inventory before any hold is
    /// placed; holds already placed are reverted if a later line fails.
    pub async fn create_rental(
        &self,
        input: CreateRentalInput,
        now: DateTime<Utc>,
    ) -> Result<Rental, EngineError> {
        let tenant_id = input.tenant_id;
        if input.items.is_empty() {
            return Err(RentalError::EmptyRental.into());
        }

        let ids: Vec<ItemId> = input.items.iter().map(|line| line.item_id).collect();
        let rates = self.rate_cards_for(tenant_id, &ids).await?;

        let sequence = self.rentals.next_rental_number(tenant_id).await?;
        let number = format!("{}-{sequence:06}", self.settings.rental_number_prefix);

        let rental = RentalMachine::create(input, RentalId::new(), number, now, |item_id| {
            rates.get(&item_id).cloned()
        })?;

        let actions = RentalMachine::reservation_actions(&rental);
        for planned in &actions {
            let item = self.items.fetch_item(tenant_id, planned.item_id).await?;
            InventoryLedger::validate_allocation(
                &item,
                planned.action,
                planned.unit_id.as_deref(),
                planned.quantity,
            )?;
        }

        let ctx = AllocationContext {
            rental_id: rental.id,
            customer_id: Some(rental.customer_id),
            recorded_by: rental.created_by,
            occurred_at: now,
        };
        self.drive_allocations(tenant_id, &actions, &ctx).await?;

        if let Err(err) = self.rentals.insert_rental(rental.clone()).await {
            self.unwind_allocations(tenant_id, &actions, &ctx).await;
            return Err(err);
        }

        info!(
            tenant = %tenant_id,
            rental = %rental.id,
            number = %rental.rental_number,
            "Rental created"
        );
        Ok(rental)
    }

    /// Requests a status change.
    ///
    /// Requesting the current status is an idempotent no-op. Non-admin
    /// actors have the request recorded as a pending approval instead of
    /// applied; the transition matrix is enforced either way.
    pub async fn update_rental_status(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        target: RentalStatus,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, EngineError> {
        let rental = self.rentals.fetch_rental(tenant_id, rental_id).await?;

        if rental.status == target {
            return Ok(MutationOutcome::Applied(rental));
        }
        if !RentalMachine::is_valid_transition(rental.status, target) {
            return Err(RentalError::InvalidTransition {
                from: rental.status,
                to: target,
            }
            .into());
        }

        let request = ChangeRequest::StatusChange { target };
        let decision = ApprovalGate::evaluate(
            actor.role,
            &request,
            rental.pricing.subtotal,
            self.settings.discount_auto_approve_percent,
        );
        if decision == GateDecision::Defer {
            return self
                .defer_request(tenant_id, rental_id, request, actor, now)
                .await;
        }

        let rental = self
            .run_transition(tenant_id, rental_id, target, actor.user_id, now, None)
            .await?;
        info!(
            tenant = %tenant_id,
            rental = %rental_id,
            status = rental.status.as_str(),
            "Rental status updated"
        );
        Ok(MutationOutcome::Applied(rental))
    }

    /// Pushes the scheduled return out and re-prices the rental, or
    /// queues the extension for approval.
    pub async fn extend_rental(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        new_return: DateTime<Utc>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, EngineError> {
        let rental = self.rentals.fetch_rental(tenant_id, rental_id).await?;
        let ids: Vec<ItemId> = rental.items.iter().map(|line| line.item_id).collect();
        let rates = self.rate_cards_for(tenant_id, &ids).await?;

        let request = ChangeRequest::Extension { new_return };
        let decision = ApprovalGate::evaluate(
            actor.role,
            &request,
            rental.pricing.subtotal,
            self.settings.discount_auto_approve_percent,
        );
        if decision == GateDecision::Defer {
            // Prove the extension could apply before queueing it.
            let mut draft = rental;
            RentalMachine::apply_extension(&mut draft, new_return, now, |item_id| {
                rates.get(&item_id).cloned()
            })?;
            return self
                .defer_request(tenant_id, rental_id, request, actor, now)
                .await;
        }

        let updated = self
            .rentals
            .update_rental(tenant_id, rental_id, move |rental| {
                RentalMachine::apply_extension(rental, new_return, now, |item_id| {
                    rates.get(&item_id).cloned()
                })?;
                Ok(rental.clone())
            })
            .await?;
        info!(tenant = %tenant_id, rental = %rental_id, "Rental extended");
        Ok(MutationOutcome::Applied(updated))
    }

    /// Applies a discount, or queues it for approval when it exceeds the
    /// actor's auto-approve allowance.
    pub async fn apply_discount(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        amount: Decimal,
        reason: String,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, EngineError> {
        let rental = self.rentals.fetch_rental(tenant_id, rental_id).await?;
        let request = ChangeRequest::Discount { amount, reason };
        let decision = ApprovalGate::evaluate(
            actor.role,
            &request,
            rental.pricing.subtotal,
            self.settings.discount_auto_approve_percent,
        );
        if decision == GateDecision::Defer {
            let mut draft = rental;
            RentalMachine::apply_discount_amount(&mut draft, amount, now)?;
            return self
                .defer_request(tenant_id, rental_id, request, actor, now)
                .await;
        }

        let updated = self
            .rentals
            .update_rental(tenant_id, rental_id, move |rental| {
                RentalMachine::apply_discount_amount(rental, amount, now)?;
                Ok(rental.clone())
            })
            .await?;
        info!(
            tenant = %tenant_id,
            rental = %rental_id,
            amount = %amount,
            "Discount applied"
        );
        Ok(MutationOutcome::Applied(updated))
    }

    /// Switches one line to another rate tier, or queues the change for
    /// approval.
    pub async fn change_rental_type(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        item_id: ItemId,
        rental_type: RentalType,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, EngineError> {
        let rental = self.rentals.fetch_rental(tenant_id, rental_id).await?;
        let rates = self.rate_cards_for(tenant_id, &[item_id]).await?;

        let request = ChangeRequest::RentalTypeChange {
            item_id,
            rental_type,
        };
        let decision = ApprovalGate::evaluate(
            actor.role,
            &request,
            rental.pricing.subtotal,
            self.settings.discount_auto_approve_percent,
        );
        if decision == GateDecision::Defer {
            let mut draft = rental;
            RentalMachine::apply_rental_type_change(&mut draft, item_id, rental_type, now, |id| {
                rates.get(&id).cloned()
            })?;
            return self
                .defer_request(tenant_id, rental_id, request, actor, now)
                .await;
        }

        let updated = self
            .rentals
            .update_rental(tenant_id, rental_id, move |rental| {
                RentalMachine::apply_rental_type_change(rental, item_id, rental_type, now, |id| {
                    rates.get(&id).cloned()
                })?;
                Ok(rental.clone())
            })
            .await?;
        info!(
            tenant = %tenant_id,
            rental = %rental_id,
            item = %item_id,
            rental_type = rental_type.as_str(),
            "Rental type changed"
        );
        Ok(MutationOutcome::Applied(updated))
    }

    /// Adds a service line, or queues it for approval.
    pub async fn add_service(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        service: ServiceLine,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, EngineError> {
        let rental = self.rentals.fetch_rental(tenant_id, rental_id).await?;
        let request = ChangeRequest::ServiceAddition {
            name: service.name.clone(),
            price: service.price,
        };
        let decision = ApprovalGate::evaluate(
            actor.role,
            &request,
            rental.pricing.subtotal,
            self.settings.discount_auto_approve_percent,
        );
        if decision == GateDecision::Defer {
            let mut draft = rental;
            RentalMachine::apply_service(&mut draft, service.clone(), now)?;
            return self
                .defer_request(tenant_id, rental_id, request, actor, now)
                .await;
        }

        let updated = self
            .rentals
            .update_rental(tenant_id, rental_id, move |rental| {
                RentalMachine::apply_service(rental, service, now)?;
                Ok(rental.clone())
            })
            .await?;
        info!(tenant = %tenant_id, rental = %rental_id, "Service added");
        Ok(MutationOutcome::Applied(updated))
    }

    /// Approves a pending request and applies its mutation.
    ///
    /// The approval is marked resolved in the same exclusive update that
    /// applies the change, so a failing mutation leaves the request
    /// pending.
    pub async fn approve_request(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        approval_index: usize,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Rental, EngineError> {
        if !ApprovalGate::can_resolve(actor.role) {
            return Err(ApprovalError::Unauthorized { role: actor.role }.into());
        }

        let snapshot = self.rentals.fetch_rental(tenant_id, rental_id).await?;
        let approval = snapshot
            .pending_approvals
            .get(approval_index)
            .ok_or(EngineError::ApprovalNotFound {
                rental_id,
                index: approval_index,
            })?;
        if approval.is_resolved() {
            return Err(ApprovalError::AlreadyResolved {
                status: approval.status,
            }
            .into());
        }

        let rental = match approval.request.clone() {
            ChangeRequest::StatusChange { target } if snapshot.status == target => {
                // Someone already moved the rental there; resolve the
                // request without side effects.
                self.rentals
                    .update_rental(tenant_id, rental_id, move |rental| {
                        if rental.status != target {
                            return Err(RentalError::InvalidTransition {
                                from: rental.status,
                                to: target,
                            }
                            .into());
                        }
                        approve_fields(rental, rental_id, approval_index, actor, now)?;
                        rental.updated_at = now;
                        Ok(rental.clone())
                    })
                    .await?
            }
            ChangeRequest::StatusChange { target } => {
                self.run_transition(
                    tenant_id,
                    rental_id,
                    target,
                    actor.user_id,
                    now,
                    Some((approval_index, actor)),
                )
                .await?
            }
            ChangeRequest::Discount { amount, .. } => {
                self.rentals
                    .update_rental(tenant_id, rental_id, move |rental| {
                        let (request, requested_by) =
                            approve_fields(rental, rental_id, approval_index, actor, now)?;
                        RentalMachine::apply_discount_amount(rental, amount, now)?;
                        RentalMachine::record_change(
                            rental,
                            request,
                            requested_by,
                            actor.user_id,
                            now,
                        );
                        Ok(rental.clone())
                    })
                    .await?
            }
            ChangeRequest::Extension { new_return } => {
                let ids: Vec<ItemId> =
                    snapshot.items.iter().map(|line| line.item_id).collect();
                let rates = self.rate_cards_for(tenant_id, &ids).await?;
                self.rentals
                    .update_rental(tenant_id, rental_id, move |rental| {
                        let (request, requested_by) =
                            approve_fields(rental, rental_id, approval_index, actor, now)?;
                        RentalMachine::apply_extension(rental, new_return, now, |item_id| {
                            rates.get(&item_id).cloned()
                        })?;
                        RentalMachine::record_change(
                            rental,
                            request,
                            requested_by,
                            actor.user_id,
                            now,
                        );
                        Ok(rental.clone())
                    })
                    .await?
            }
            ChangeRequest::RentalTypeChange {
                item_id,
                rental_type,
            } => {
                let rates = self.rate_cards_for(tenant_id, &[item_id]).await?;
                self.rentals
                    .update_rental(tenant_id, rental_id, move |rental| {
                        let (request, requested_by) =
                            approve_fields(rental, rental_id, approval_index, actor, now)?;
                        RentalMachine::apply_rental_type_change(
                            rental,
                            item_id,
                            rental_type,
                            now,
                            |id| rates.get(&id).cloned(),
                        )?;
                        RentalMachine::record_change(
                            rental,
                            request,
                            requested_by,
                            actor.user_id,
                            now,
                        );
                        Ok(rental.clone())
                    })
                    .await?
            }
            ChangeRequest::ServiceAddition { name, price } => {
                self.rentals
                    .update_rental(tenant_id, rental_id, move |rental| {
                        let (request, requested_by) =
                            approve_fields(rental, rental_id, approval_index, actor, now)?;
                        RentalMachine::apply_service(rental, ServiceLine { name, price }, now)?;
                        RentalMachine::record_change(
                            rental,
                            request,
                            requested_by,
                            actor.user_id,
                            now,
                        );
                        Ok(rental.clone())
                    })
                    .await?
            }
        };

        info!(
            tenant = %tenant_id,
            rental = %rental_id,
            approval_index,
            "Approval request applied"
        );
        Ok(rental)
    }

    /// Rejects a pending request without applying it.
    pub async fn reject_request(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        approval_index: usize,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Rental, EngineError> {
        if !ApprovalGate::can_resolve(actor.role) {
            return Err(ApprovalError::Unauthorized { role: actor.role }.into());
        }

        let rental = self
            .rentals
            .update_rental(tenant_id, rental_id, move |rental| {
                let approval = rental.pending_approvals.get_mut(approval_index).ok_or(
                    EngineError::ApprovalNotFound {
                        rental_id,
                        index: approval_index,
                    },
                )?;
                if approval.is_resolved() {
                    return Err(ApprovalError::AlreadyResolved {
                        status: approval.status,
                    }
                    .into());
                }
                approval.status = ApprovalStatus::Rejected;
                approval.resolved_by = Some(actor.user_id);
                approval.resolved_at = Some(now);
                rental.updated_at = now;
                Ok(rental.clone())
            })
            .await?;

        let rejection = RequestRejection {
            tenant_id,
            rental_id,
            approval_index,
            actor,
        };
        if let Err(err) = self.relay.status_change_rejected(&rejection).await {
            warn!(
                tenant = %tenant_id,
                rental = %rental_id,
                error = %err,
                "Notification relay failed"
            );
        }

        info!(
            tenant = %tenant_id,
            rental = %rental_id,
            approval_index,
            "Approval request rejected"
        );
        Ok(rental)
    }

    /// Flips open rentals whose scheduled return has passed to `overdue`.
    ///
    /// Idempotent and safe to run concurrently with other mutations: the
    /// flip is re-checked under each rental's exclusive update and
    /// touches no inventory.
    pub async fn sweep_overdue(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        let due = self.rentals.due_for_sweep(tenant_id, now).await?;
        let mut flipped = 0usize;
        for rental_id in due {
            let did_flip = self
                .rentals
                .update_rental(tenant_id, rental_id, move |rental| {
                    match RentalMachine::plan_overdue(rental, now) {
                        Some(plan) => {
                            RentalMachine::apply(rental, &plan);
                            Ok(true)
                        }
                        None => Ok(false),
                    }
                })
                .await?;
            if did_flip {
                flipped += 1;
            }
        }
        if flipped > 0 {
            info!(tenant = %tenant_id, count = flipped, "Rentals marked overdue");
        }
        Ok(flipped)
    }

    /// Registers a new inventory item.
    pub async fn register_item(
        &self,
        input: RegisterItemInput,
        now: DateTime<Utc>,
    ) -> Result<Item, EngineError> {
        let item = InventoryLedger::register(input, now)?;
        self.items.insert_item(item.clone()).await?;
        info!(
            tenant = %item.tenant_id,
            item = %item.id,
            tracking = item.tracking.as_str(),
            "Item registered"
        );
        Ok(item)
    }

    /// Moves stock between care pools (available, maintenance, damaged).
    pub async fn transfer_stock(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
        transfer: TransferInput,
        now: DateTime<Utc>,
    ) -> Result<Item, EngineError> {
        let item = self
            .items
            .update_item(tenant_id, item_id, move |item| {
                let movement = InventoryLedger::transfer(item, &transfer, now)?;
                Ok((item.clone(), vec![movement]))
            })
            .await?;
        info!(tenant = %tenant_id, item = %item_id, "Stock transferred");
        Ok(item)
    }

    /// Reads a rental.
    pub async fn get_rental(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
    ) -> Result<Rental, EngineError> {
        self.rentals.fetch_rental(tenant_id, rental_id).await
    }

    /// Reads an item.
    pub async fn get_item(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
    ) -> Result<Item, EngineError> {
        self.items.fetch_item(tenant_id, item_id).await
    }

    /// Movement history for an item, oldest first.
    pub async fn movements(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
    ) -> Result<Vec<Movement>, EngineError> {
        self.items.movements(tenant_id, item_id).await
    }

    /// Plans a transition from live state, drives the ledger, and commits
    /// under the rental's exclusive update. Item allocations already
    /// applied are reverted if the commit fails.
    async fn run_transition(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        target: RentalStatus,
        actor_id: UserId,
        now: DateTime<Utc>,
        resolving: Option<(usize, Actor)>,
    ) -> Result<Rental, EngineError> {
        let snapshot = self.rentals.fetch_rental(tenant_id, rental_id).await?;
        let ids: Vec<ItemId> = snapshot.items.iter().map(|line| line.item_id).collect();
        let rates = self.rate_cards_for(tenant_id, &ids).await?;

        let Some(plan) = RentalMachine::plan(
            &snapshot,
            target,
            now,
            self.settings.late_fee_multiplier,
            |item_id| rates.get(&item_id).cloned(),
        )?
        else {
            return Ok(snapshot);
        };

        let ctx = AllocationContext {
            rental_id: snapshot.id,
            customer_id: Some(snapshot.customer_id),
            recorded_by: actor_id,
            occurred_at: now,
        };
        self.drive_allocations(tenant_id, &plan.item_actions, &ctx)
            .await?;

        let committed = self
            .rentals
            .update_rental(tenant_id, rental_id, {
                let plan = plan.clone();
                move |rental| {
                    if rental.status != plan.from {
                        return Err(RentalError::InvalidTransition {
                            from: rental.status,
                            to: plan.to,
                        }
                        .into());
                    }
                    if let Some((index, actor)) = resolving {
                        let (request, requested_by) =
                            approve_fields(rental, rental_id, index, actor, now)?;
                        RentalMachine::apply(rental, &plan);
                        RentalMachine::record_change(
                            rental,
                            request,
                            requested_by,
                            actor.user_id,
                            now,
                        );
                    } else {
                        RentalMachine::apply(rental, &plan);
                    }
                    Ok(rental.clone())
                }
            })
            .await;

        match committed {
            Ok(rental) => Ok(rental),
            Err(err) => {
                self.unwind_allocations(tenant_id, &plan.item_actions, &ctx)
                    .await;
                Err(err)
            }
        }
    }

    /// Queues the request as a pending approval and notifies the
    /// tenant's admins and operators.
    async fn defer_request(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        request: ChangeRequest,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, EngineError> {
        let (rental, approval_index) = self
            .rentals
            .update_rental(tenant_id, rental_id, {
                let request = request.clone();
                move |rental| {
                    if rental.is_terminal() {
                        return Err(RentalError::InvalidState {
                            status: rental.status,
                        }
                        .into());
                    }
                    let index = RentalMachine::queue_approval(rental, request, actor.user_id, now);
                    Ok((rental.clone(), index))
                }
            })
            .await?;

        self.notify_deferred(&rental, approval_index, actor).await;

        info!(
            tenant = %tenant_id,
            rental = %rental_id,
            approval_index,
            kind = request.kind(),
            "Mutation deferred for approval"
        );
        Ok(MutationOutcome::Pending {
            rental,
            approval_index,
        })
    }

    /// Best-effort notification fan-out; relay failures are logged, not
    /// surfaced.
    async fn notify_deferred(&self, rental: &Rental, approval_index: usize, actor: Actor) {
        let staff = match self.directory.staff_for(rental.tenant_id).await {
            Ok(staff) => staff,
            Err(err) => {
                warn!(
                    tenant = %rental.tenant_id,
                    error = %err,
                    "Staff lookup failed, skipping notification"
                );
                return;
            }
        };
        let recipients: Vec<StaffMember> = staff
            .into_iter()
            .filter(|member| member.role >= StaffRole::Operator && member.user_id != actor.user_id)
            .collect();

        let request = rental.pending_approvals[approval_index].request.clone();
        let event = StatusChangeRequest {
            title: format!("Approval needed: {}", request.kind()),
            message: format!(
                "Rental {} has a pending {} request awaiting review",
                rental.rental_number,
                request.kind()
            ),
            tenant_id: rental.tenant_id,
            requester: actor.user_id,
            rental_id: rental.id,
            rental_number: rental.rental_number.clone(),
            request,
            approval_index,
            recipients,
        };
        if let Err(err) = self.relay.notify_status_change_request(&event).await {
            warn!(
                tenant = %rental.tenant_id,
                rental = %rental.id,
                error = %err,
                "Notification relay failed"
            );
        }
    }

    /// Applies planned allocations one item at a time; on failure the
    /// ones already applied are reverted before the error is returned.
    async fn drive_allocations(
        &self,
        tenant_id: TenantId,
        actions: &[PlannedAction],
        ctx: &AllocationContext,
    ) -> Result<(), EngineError> {
        for (index, planned) in actions.iter().enumerate() {
            let result = self
                .items
                .update_item(tenant_id, planned.item_id, {
                    let planned = planned.clone();
                    let ctx = *ctx;
                    move |item| {
                        let movement = InventoryLedger::apply_allocation(
                            item,
                            planned.action,
                            planned.unit_id.as_deref(),
                            planned.quantity,
                            &ctx,
                        )?;
                        Ok(((), vec![movement]))
                    }
                })
                .await;

            if let Err(err) = result {
                self.unwind_allocations(tenant_id, &actions[..index], ctx)
                    .await;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Best-effort reversal of already-applied allocations, newest first.
    async fn unwind_allocations(
        &self,
        tenant_id: TenantId,
        applied: &[PlannedAction],
        ctx: &AllocationContext,
    ) {
        for planned in applied.iter().rev() {
            let outcome = self
                .items
                .update_item(tenant_id, planned.item_id, {
                    let planned = planned.clone();
                    let ctx = *ctx;
                    move |item| {
                        let movement = InventoryLedger::revert_allocation(
                            item,
                            planned.action,
                            planned.unit_id.as_deref(),
                            planned.quantity,
                            &ctx,
                        )?;
                        Ok(((), vec![movement]))
                    }
                })
                .await;
            if let Err(err) = outcome {
                warn!(
                    tenant = %tenant_id,
                    item = %planned.item_id,
                    error = %err,
                    "Failed to revert allocation during unwind"
                );
            }
        }
    }

    /// Live rate cards for a set of items; proves each item exists.
    async fn rate_cards_for(
        &self,
        tenant_id: TenantId,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, RateCard>, EngineError> {
        let mut rates = HashMap::new();
        for &item_id in item_ids {
            if rates.contains_key(&item_id) {
                continue;
            }
            let item = self.items.fetch_item(tenant_id, item_id).await?;
            rates.insert(item_id, item.rates.clone());
        }
        Ok(rates)
    }
}

/// Marks a pending approval approved, returning its request and original
/// requester. Fails if the index is absent or the request was already
/// resolved.
fn approve_fields(
    rental: &mut Rental,
    rental_id: RentalId,
    index: usize,
    actor: Actor,
    now: DateTime<Utc>,
) -> Result<(ChangeRequest, UserId), EngineError> {
    let approval =
        rental
            .pending_approvals
            .get_mut(index)
            .ok_or(EngineError::ApprovalNotFound { rental_id, index })?;
    if approval.is_resolved() {
        return Err(ApprovalError::AlreadyResolved {
            status: approval.status,
        }
        .into());
    }
    approval.status = ApprovalStatus::Approved;
    approval.resolved_by = Some(actor.user_id);
    approval.resolved_at = Some(now);
    Ok((approval.request.clone(), approval.requested_by))
}
