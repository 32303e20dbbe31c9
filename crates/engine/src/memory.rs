//! Reference in-memory store.
//!
//! Implements both store ports with a `DashMap` of aggregates keyed by
//! (tenant, id). Exclusivity per aggregate comes from one async mutex
//! per cell; the cell is cloned, mutated, and written back only when the
//! caller's closure succeeds, so a failed mutation leaves the stored
//! aggregate untouched.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use rentara_core::inventory::{Item, Movement};
use rentara_core::rental::{Rental, RentalMachine};
use rentara_shared::types::{ItemId, RentalId, TenantId};

use crate::error::EngineError;
use crate::ports::{InventoryStore, RentalStore};

type Cell<T> = Arc<Mutex<T>>;

/// In-memory implementation of [`RentalStore`] and [`InventoryStore`].
///
/// Used by the engine's integration tests and by hosts that have not
/// wired a database yet.
#[derive(Default)]
pub struct MemoryStore {
    rentals: DashMap<(TenantId, RentalId), Cell<Rental>>,
    items: DashMap<(TenantId, ItemId), Cell<Item>>,
    movements: DashMap<(TenantId, ItemId), Vec<Movement>>,
    sequences: DashMap<TenantId, u64>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn rental_cell(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
    ) -> Result<Cell<Rental>, EngineError> {
        self.rentals
            .get(&(tenant_id, rental_id))
            .map(|cell| Arc::clone(&cell))
            .ok_or(EngineError::RentalNotFound { rental_id })
    }

    fn item_cell(&self, tenant_id: TenantId, item_id: ItemId) -> Result<Cell<Item>, EngineError> {
        self.items
            .get(&(tenant_id, item_id))
            .map(|cell| Arc::clone(&cell))
            .ok_or(EngineError::ItemNotFound { item_id })
    }
}

#[async_trait]
impl RentalStore for MemoryStore {
    async fn insert_rental(&self, rental: Rental) -> Result<(), EngineError> {
        let key = (rental.tenant_id, rental.id);
        if self.rentals.contains_key(&key) {
            return Err(EngineError::Store(format!(
                "duplicate rental {}",
                rental.id
            )));
        }
        self.rentals.insert(key, Arc::new(Mutex::new(rental)));
        Ok(())
    }

    async fn fetch_rental(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
    ) -> Result<Rental, EngineError> {
        let cell = self.rental_cell(tenant_id, rental_id)?;
        let guard = cell.lock().await;
        Ok(guard.clone())
    }

    async fn update_rental<F, T>(
        &self,
        tenant_id: TenantId,
        rental_id: RentalId,
        apply: F,
    ) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Rental) -> Result<T, EngineError> + Send,
        T: Send,
    {
        let cell = self.rental_cell(tenant_id, rental_id)?;
        let mut guard = cell.lock().await;
        let mut draft = guard.clone();
        let out = apply(&mut draft)?;
        *guard = draft;
        Ok(out)
    }

    async fn due_for_sweep(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<RentalId>, EngineError> {
        let cells: Vec<Cell<Rental>> = self
            .rentals
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut due = Vec::new();
        for cell in cells {
            let guard = cell.lock().await;
            if RentalMachine::sweep_due(&guard, now) {
                due.push(guard.id);
            }
        }
        Ok(due)
    }

    async fn next_rental_number(&self, tenant_id: TenantId) -> Result<u64, EngineError> {
        let mut sequence = self.sequences.entry(tenant_id).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn insert_item(&self, item: Item) -> Result<(), EngineError> {
        let key = (item.tenant_id, item.id);
        if self.items.contains_key(&key) {
            return Err(EngineError::Store(format!("duplicate item {}", item.id)));
        }
        self.items.insert(key, Arc::new(Mutex::new(item)));
        Ok(())
    }

    async fn fetch_item(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
    ) -> Result<Item, EngineError> {
        let cell = self.item_cell(tenant_id, item_id)?;
        let guard = cell.lock().await;
        Ok(guard.clone())
    }

    async fn update_item<F, T>(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
        apply: F,
    ) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Item) -> Result<(T, Vec<Movement>), EngineError> + Send,
        T: Send,
    {
        let cell = self.item_cell(tenant_id, item_id)?;
        let mut guard = cell.lock().await;
        let mut draft = guard.clone();
        let (out, movements) = apply(&mut draft)?;
        *guard = draft;
        // Appended while the item lock is held, so the log order matches
        // the order mutations were committed.
        self.movements
            .entry((tenant_id, item_id))
            .or_default()
            .extend(movements);
        Ok(out)
    }

    async fn movements(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
    ) -> Result<Vec<Movement>, EngineError> {
        self.item_cell(tenant_id, item_id)?;
        Ok(self
            .movements
            .get(&(tenant_id, item_id))
            .map(|log| log.clone())
            .unwrap_or_default())
    }
}
