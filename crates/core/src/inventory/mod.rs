//! Inventory tracking and allocation.
//!
//! This module implements the stock side of the rental lifecycle:
//! - Unit-tracked and quantity-tracked items
//! - Allocation state changes (reserve, activate, return, cancel)
//! - Append-only movement records with counter snapshots
//! - Stock-care transfers between available, maintenance, and damaged
//! - Error types for inventory operations

pub mod error;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use error::InventoryError;
pub use ledger::InventoryLedger;
pub use types::{
    AllocationAction, AllocationContext, InitialStock, Item, Movement, MovementKind,
    QuantityRecord, RateCard, RegisterItemInput, TrackingType, TransferInput, Unit, UnitStatus,
};
