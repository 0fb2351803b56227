use dirsweep_core::GraphErrorInfo;
use dirsweep_domain::{DeleteOptions, RetryPolicy, is_not_found};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    DeletePhase, DeleteVerificationError, DeleteVerificationResult, DeleteVerificationService,
    wait_before_retry,
};

impl DeleteVerificationService {
    /// Permanently deletes a soft-deleted object and waits until lookups
    /// report it missing.
    ///
    /// Unset retry fields take the hard delete defaults (5 attempts, 2s
    /// apart). A permanent delete answered with "not found" counts as done.
    pub async fn execute_hard_delete(
        &self,
        options: &DeleteOptions,
        cancellation: &CancellationToken,
    ) -> DeleteVerificationResult<()> {
        let policy = options.retry_policy(RetryPolicy::HARD_DELETE);
        let max_retries = policy.max_retries();

        if cancellation.is_cancelled() {
            return Err(Self::cancelled(DeletePhase::HardDelete, options, 0, 1));
        }

        debug!(
            resource_type = %options.resource_type(),
            resource_id = %options.resource_id(),
            "issuing permanent delete"
        );
        if let Err(error) = self
            .deleted_items
            .purge_deleted_item(options.resource_id())
            .await
        {
            let detail = GraphErrorInfo::from_app_error(&error);
            if is_not_found(&detail) {
                info!(
                    resource_type = %options.resource_type(),
                    resource_id = %options.resource_id(),
                    "object already absent from deleted items"
                );
                return Ok(());
            }

            warn!(
                resource_type = %options.resource_type(),
                resource_id = %options.resource_id(),
                error = %detail,
                "permanent delete call failed"
            );
            return Err(DeleteVerificationError::HardDeleteFailed {
                resource_type: options.resource_type(),
                resource_id: options.resource_id().to_owned(),
                detail,
            });
        }

        for attempt in 1..=max_retries {
            if cancellation.is_cancelled() {
                return Err(Self::cancelled(
                    DeletePhase::HardDeleteVerification,
                    options,
                    attempt - 1,
                    max_retries,
                ));
            }

            match self
                .deleted_items
                .get_deleted_item(options.resource_id())
                .await
            {
                Ok(()) => {
                    debug!(
                        resource_type = %options.resource_type(),
                        resource_id = %options.resource_id(),
                        attempt,
                        max_retries,
                        "object still present in deleted items"
                    );
                }
                Err(error) => {
                    let detail = GraphErrorInfo::from_app_error(&error);
                    if !is_not_found(&detail) {
                        warn!(
                            resource_type = %options.resource_type(),
                            resource_id = %options.resource_id(),
                            attempt,
                            error = %detail,
                            "unexpected error verifying permanent delete"
                        );
                        return Err(DeleteVerificationError::UnexpectedVerificationError {
                            resource_type: options.resource_type(),
                            resource_id: options.resource_id().to_owned(),
                            attempt,
                            detail,
                        });
                    }

                    info!(
                        resource_type = %options.resource_type(),
                        resource_id = %options.resource_id(),
                        attempt,
                        max_retries,
                        "permanent delete confirmed"
                    );
                    return Ok(());
                }
            }

            if attempt < max_retries
                && !wait_before_retry(policy.retry_interval(), cancellation).await
            {
                return Err(Self::cancelled(
                    DeletePhase::HardDeleteVerification,
                    options,
                    attempt,
                    max_retries,
                ));
            }
        }

        warn!(
            resource_type = %options.resource_type(),
            resource_id = %options.resource_id(),
            max_retries,
            "object still in deleted items after permanent delete"
        );
        Err(DeleteVerificationError::HardDeleteNotVerified {
            resource_type: options.resource_type(),
            resource_id: options.resource_id().to_owned(),
            attempts: max_retries,
            max_retries,
        })
    }
}
