//! Core rental business logic for Rentara.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `inventory` - Item allocation ledger for unit- and quantity-tracked stock
//! - `pricing` - Rate tiers, billing periods, proration, and settlement math
//! - `approval` - Staff roles and the privileged-mutation approval gate
//! - `rental` - Rental contract aggregate and lifecycle state machine

pub mod approval;
pub mod inventory;
pub mod pricing;
pub mod rental;
