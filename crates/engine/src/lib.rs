//! Rental lifecycle orchestration for Rentara.
//!
//! This crate drives the pure domain logic in `rentara-core` over async
//! collaborator ports:
//! - `ports` - store, notification relay, and staff directory contracts
//! - `engine` - the orchestrator implementing the operation surface
//! - `memory` - reference in-memory store, one async mutex per aggregate
//! - `error` - engine-level error type wrapping the domain errors

pub mod engine;
pub mod error;
pub mod memory;
pub mod ports;

pub use engine::RentalEngine;
pub use error::EngineError;
pub use memory::MemoryStore;
pub use ports::{
    InventoryStore, NotificationRelay, RentalStore, RequestRejection, StaffDirectory, StaffMember,
    StatusChangeRequest,
};
