//! Rental lifecycle: creation, status transitions, repricing mutations
//! and the overdue sweep.
//!
//! - [`types`]: rental aggregate, lines, dates and pricing breakdown
//! - [`machine`]: the transition planner and mutation rules
//! - [`error`]: rental domain errors

pub mod error;
pub mod machine;
pub mod types;

#[cfg(test)]
mod machine_props;

pub use error::RentalError;
pub use machine::{PlannedAction, RentalMachine, TransitionEffect, TransitionPlan};
pub use types::{
    ChangeRecord, CreateRentalInput, CreateRentalItem, MutationOutcome, Rental, RentalDates,
    RentalItem, RentalPricing, RentalStatus, ServiceLine,
};
