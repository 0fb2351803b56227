use std::fmt::{Display, Formatter};

use dirsweep_core::{AppError, GraphErrorInfo};
use dirsweep_domain::DirectoryResourceType;
use thiserror::Error;

/// Result type returned by verified delete operations.
pub type DeleteVerificationResult<T> = Result<T, DeleteVerificationError>;

/// Step of the two-phase delete that an error or log line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    /// Primary delete call against the live collection.
    SoftDelete,
    /// Polling until the object appears in deleted items.
    SoftDeleteVerification,
    /// Permanent delete call against deleted items.
    HardDelete,
    /// Polling until the object disappears from deleted items.
    HardDeleteVerification,
}

impl DeletePhase {
    /// Returns a stable label for logs and messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoftDelete => "soft delete",
            Self::SoftDeleteVerification => "soft delete verification",
            Self::HardDelete => "hard delete",
            Self::HardDeleteVerification => "hard delete verification",
        }
    }
}

impl Display for DeletePhase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Last error seen by a polling loop, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedError(pub Option<GraphErrorInfo>);

impl Display for ObservedError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(info) => write!(formatter, "{info}"),
            None => formatter.write_str("none observed"),
        }
    }
}

/// Failures of the verified delete workflow.
#[derive(Debug, Error)]
pub enum DeleteVerificationError {
    /// The primary delete call failed.
    #[error("failed to delete {resource_type} '{resource_id}': {detail}")]
    SoftDeleteFailed {
        /// Resource type tag.
        resource_type: DirectoryResourceType,
        /// Directory object identifier.
        resource_id: String,
        /// Error reported by the delete call.
        detail: GraphErrorInfo,
    },

    /// The object never became visible in deleted items.
    #[error(
        "{resource_type} '{resource_id}' was not found in deleted items after {attempts} of {max_retries} attempts (last error: {last_error})"
    )]
    SoftDeleteNotVerified {
        /// Resource type tag.
        resource_type: DirectoryResourceType,
        /// Directory object identifier.
        resource_id: String,
        /// Lookups performed.
        attempts: u32,
        /// Configured lookup budget.
        max_retries: u32,
        /// Error returned by the final lookup.
        last_error: ObservedError,
    },

    /// The permanent delete call failed with something other than not found.
    #[error("failed to permanently delete {resource_type} '{resource_id}': {detail}")]
    HardDeleteFailed {
        /// Resource type tag.
        resource_type: DirectoryResourceType,
        /// Directory object identifier.
        resource_id: String,
        /// Error reported by the permanent delete call.
        detail: GraphErrorInfo,
    },

    /// The object stayed in deleted items after the permanent delete.
    #[error(
        "{resource_type} '{resource_id}' still present in deleted items after {attempts} of {max_retries} attempts; manual cleanup may be required"
    )]
    HardDeleteNotVerified {
        /// Resource type tag.
        resource_type: DirectoryResourceType,
        /// Directory object identifier.
        resource_id: String,
        /// Lookups performed.
        attempts: u32,
        /// Configured lookup budget.
        max_retries: u32,
    },

    /// A lookup failed in an unexpected way while verifying the permanent delete.
    #[error(
        "unexpected error verifying permanent delete of {resource_type} '{resource_id}' on attempt {attempt}: {detail}"
    )]
    UnexpectedVerificationError {
        /// Resource type tag.
        resource_type: DirectoryResourceType,
        /// Directory object identifier.
        resource_id: String,
        /// Attempt that observed the error.
        attempt: u32,
        /// Error reported by the lookup.
        detail: GraphErrorInfo,
    },

    /// The caller cancelled the operation.
    #[error(
        "{phase} of {resource_type} '{resource_id}' cancelled after {completed_attempts} of {max_retries} attempts"
    )]
    Cancelled {
        /// Phase that observed the cancellation.
        phase: DeletePhase,
        /// Resource type tag.
        resource_type: DirectoryResourceType,
        /// Directory object identifier.
        resource_id: String,
        /// Attempts finished before cancellation.
        completed_attempts: u32,
        /// Configured attempt budget.
        max_retries: u32,
    },
}

impl DeleteVerificationError {
    /// Returns the phase the failure belongs to.
    #[must_use]
    pub fn phase(&self) -> DeletePhase {
        match self {
            Self::SoftDeleteFailed { .. } => DeletePhase::SoftDelete,
            Self::SoftDeleteNotVerified { .. } => DeletePhase::SoftDeleteVerification,
            Self::HardDeleteFailed { .. } => DeletePhase::HardDelete,
            Self::HardDeleteNotVerified { .. } | Self::UnexpectedVerificationError { .. } => {
                DeletePhase::HardDeleteVerification
            }
            Self::Cancelled { phase, .. } => *phase,
        }
    }

    /// Returns whether the error came from cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<DeleteVerificationError> for AppError {
    fn from(value: DeleteVerificationError) -> Self {
        if value.is_cancelled() {
            Self::Cancelled(value.to_string())
        } else {
            Self::Internal(value.to_string())
        }
    }
}
