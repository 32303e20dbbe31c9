//! Engine-level errors.

use thiserror::Error;

use rentara_core::approval::ApprovalError;
use rentara_core::inventory::InventoryError;
use rentara_core::rental::RentalError;
use rentara_shared::types::{ItemId, RentalId};

/// Errors surfaced by engine operations.
///
/// Domain rule violations pass through transparently from the core
/// modules; this enum adds the not-found and persistence cases the core
/// cannot know about.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No rental with this id exists for the tenant.
    #[error("Rental not found: {rental_id}")]
    RentalNotFound {
        /// The missing rental.
        rental_id: RentalId,
    },

    /// No item with this id exists for the tenant.
    #[error("Item not found: {item_id}")]
    ItemNotFound {
        /// The missing item.
        item_id: ItemId,
    },

    /// The rental has no pending approval at this index.
    #[error("Approval request {index} not found on rental {rental_id}")]
    ApprovalNotFound {
        /// The rental holding the approvals.
        rental_id: RentalId,
        /// The requested index.
        index: usize,
    },

    /// Rental lifecycle rule violation.
    #[error(transparent)]
    Rental(#[from] RentalError),

    /// Inventory allocation rule violation.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Approval resolution rule violation.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// The persistence layer failed.
    #[error("Store failure: {0}")]
    Store(String),
}

impl EngineError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RentalNotFound { .. }
            | Self::ItemNotFound { .. }
            | Self::ApprovalNotFound { .. } => 404,
            Self::Rental(e) => e.status_code(),
            Self::Inventory(e) => e.status_code(),
            Self::Approval(e) => e.status_code(),
            Self::Store(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RentalNotFound { .. } => "RENTAL_NOT_FOUND",
            Self::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            Self::ApprovalNotFound { .. } => "APPROVAL_NOT_FOUND",
            Self::Rental(e) => e.error_code(),
            Self::Inventory(e) => e.error_code(),
            Self::Approval(e) => e.error_code(),
            Self::Store(_) => "STORE_FAILURE",
        }
    }
}
