use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dirsweep_core::AppResult;
use dirsweep_domain::{DeleteOptions, RetryPolicy, jittered};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::delete_ports::{DeletedItemsDirectory, DirectoryObjectRemover};

mod error;
mod hard_delete;
mod soft_delete;

pub use error::{DeletePhase, DeleteVerificationError, DeleteVerificationResult, ObservedError};

/// Drives directory objects through soft delete and optional hard delete,
/// confirming each step against the eventually consistent deleted items view.
#[derive(Clone)]
pub struct DeleteVerificationService {
    deleted_items: Arc<dyn DeletedItemsDirectory>,
}

impl DeleteVerificationService {
    /// Creates a delete verification service.
    #[must_use]
    pub fn new(deleted_items: Arc<dyn DeletedItemsDirectory>) -> Self {
        Self { deleted_items }
    }

    /// Runs the full verified delete.
    ///
    /// Unset retry fields take the soft delete defaults, and the resolved
    /// options carry over into the hard delete phase. Without `hard_delete`
    /// the object stays restorable from deleted items for the platform's
    /// retention window (30 days for Entra ID).
    #[instrument(
        skip(self, soft_delete, options, cancellation),
        fields(
            resource_type = %options.resource_type(),
            resource_id = %options.resource_id(),
            display_name = options.display_name().unwrap_or_default(),
        )
    )]
    pub async fn execute_delete_with_verification<F, Fut>(
        &self,
        soft_delete: F,
        hard_delete: bool,
        options: &DeleteOptions,
        cancellation: &CancellationToken,
    ) -> DeleteVerificationResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let options = options.with_defaults(RetryPolicy::SOFT_DELETE);

        self.execute_soft_delete(soft_delete, &options, cancellation)
            .await?;

        if !hard_delete {
            info!("object soft deleted and restorable from deleted items");
            return Ok(());
        }

        self.execute_hard_delete(&options, cancellation).await?;
        info!("object permanently deleted");
        Ok(())
    }

    /// Runs the verified delete using a remover port for the primary delete call.
    pub async fn delete_directory_object(
        &self,
        remover: &dyn DirectoryObjectRemover,
        hard_delete: bool,
        options: &DeleteOptions,
        cancellation: &CancellationToken,
    ) -> DeleteVerificationResult<()> {
        let resource_type = options.resource_type();
        let resource_id = options.resource_id();

        self.execute_delete_with_verification(
            || remover.delete_object(resource_type, resource_id),
            hard_delete,
            options,
            cancellation,
        )
        .await
    }

    fn cancelled(
        phase: DeletePhase,
        options: &DeleteOptions,
        completed_attempts: u32,
        max_retries: u32,
    ) -> DeleteVerificationError {
        DeleteVerificationError::Cancelled {
            phase,
            resource_type: options.resource_type(),
            resource_id: options.resource_id().to_owned(),
            completed_attempts,
            max_retries,
        }
    }
}

/// Sleeps a jittered interval. Returns `false` if cancelled first.
async fn wait_before_retry(interval: Duration, cancellation: &CancellationToken) -> bool {
    let delay = jittered(interval);

    tokio::select! {
        () = cancellation.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests;
