//! Async collaborator ports: persistence, notifications, staff lookup.
//!
//! The store ports carry the concurrency contract the engine relies on:
//! `update_rental` and `update_item` run their closure while holding
//! exclusivity over that one aggregate, and persist the result only when
//! the closure succeeds. Rentals and items are independent consistency
//! units; the engine compensates across them itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rentara_core::approval::{Actor, ChangeRequest, StaffRole};
use rentara_core::inventory::{Item, Movement};
use rentara_core::rental::Rental;
use rentara_shared::types::{ItemId, RentalId, TenantId, UserId};

use crate::error::EngineError;

/// A staff account visible to the engine.
#[derive(Debug, Clone)]
pub struct StaffMember {
    /// The staff user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Privilege level.
    pub role: StaffRole,
}

/// Event emitted when a mutation is deferred for approval.
#[derive(Debug, Clone)]
pub struct StatusChangeRequest {
    /// Short headline for the notification.
    pub title: String,
    /// Human-readable summary.
    pub message: String,
    /// Tenant the rental belongs to.
    pub tenant_id: TenantId,
    /// Who asked for the change.
    pub requester: UserId,
    /// The rental the request targets.
    pub rental_id: RentalId,
    /// Human-facing contract number.
    pub rental_number: String,
    /// The deferred change.
    pub request: ChangeRequest,
    /// Index of the queued approval on the rental.
    pub approval_index: usize,
    /// Admins and operators to notify, requester excluded.
    pub recipients: Vec<StaffMember>,
}

/// Event emitted when a pending request is rejected.
#[derive(Debug, Clone)]
pub struct RequestRejection {
    /// Tenant the rental belongs to.
    pub tenant_id: TenantId,
    /// The rental the request targeted.
    pub rental_id: RentalId,
    /// Index of the rejected approval.
    pub approval_index: usize,
    /// Who rejected it.
    pub actor: Actor,
}

/// Rental aggregate persistence.
#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Persists a new rental.
    async fn insert_rental(&self, rental: Rental) -> Result<(), EngineError>;

    /// Reads a rental snapshot.
    async fn fetch_rental(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
    ) -> Result<Rental, EngineError>;

    /// Runs `apply` while holding exclusivity over the rental aggregate.
    /// The mutation is persisted only when `apply` returns `Ok`.
    async fn update_rental<F, T>(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        apply: F,
    ) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Rental) -> Result<T, EngineError> + Send,
        T: Send;

    /// Ids of open rentals whose scheduled return has already passed.
    async fn due_for_sweep(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<RentalId>, EngineError>;

    /// Allocates the next value of the tenant's rental-number sequence.
    async fn next_rental_number(&self, tenant_id: TenantId) -> Result<u64, EngineError>;
}

/// Item aggregate persistence with an append-only movement log.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Persists a new item.
    async fn insert_item(&self, item: Item) -> Result<(), EngineError>;

    /// Reads an item snapshot.
    async fn fetch_item(&self, tenant_id: TenantId, item_id: ItemId)
    -> Result<Item, EngineError>;

    /// Runs `apply` while holding exclusivity over the item aggregate.
    /// Movements returned by `apply` are persisted atomically with the
    /// item.
    async fn update_item<F, T>(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
        apply: F,
    ) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Item) -> Result<(T, Vec<Movement>), EngineError> + Send,
        T: Send;

    /// Movement history for an item, oldest first.
    async fn movements(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
    ) -> Result<Vec<Movement>, EngineError>;
}

/// Outbound notification contract.
#[async_trait]
pub trait NotificationRelay: Send + Sync {
    /// Announces a deferred mutation awaiting approval.
    async fn notify_status_change_request(
        &self,
        event: &StatusChangeRequest,
    ) -> Result<(), EngineError>;

    /// Announces that a pending request was rejected.
    async fn status_change_rejected(
        &self,
        rejection: &RequestRejection,
    ) -> Result<(), EngineError>;
}

/// Read-only staff lookup for a tenant.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// All staff accounts of the tenant.
    async fn staff_for(&self, tenant_id: TenantId) -> Result<Vec<StaffMember>, EngineError>;
}
