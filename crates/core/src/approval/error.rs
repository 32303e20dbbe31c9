//! Approval error types.

use thiserror::Error;

use super::types::{ApprovalStatus, StaffRole};

/// Errors that can occur while resolving approval requests.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The request was already approved or rejected.
    #[error("Request already resolved as {status}")]
    AlreadyResolved {
        /// The resolution it already carries.
        status: ApprovalStatus,
    },

    /// The actor's role may not resolve approval requests.
    #[error("Role {role} cannot resolve approval requests")]
    Unauthorized {
        /// The insufficient role.
        role: StaffRole,
    },
}

impl ApprovalError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AlreadyResolved { .. } => 409,
            Self::Unauthorized { .. } => 403,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyResolved { .. } => "ALREADY_RESOLVED",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
        }
    }
}
