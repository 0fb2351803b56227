use std::future::Future;

use dirsweep_core::{AppResult, GraphErrorInfo};
use dirsweep_domain::{DeleteOptions, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    DeletePhase, DeleteVerificationError, DeleteVerificationResult, DeleteVerificationService,
    ObservedError, wait_before_retry,
};

impl DeleteVerificationService {
    /// Deletes an object and waits until it shows up in deleted items.
    ///
    /// The delete call runs exactly once. Lookups then repeat up to the
    /// configured retry budget (10 attempts, 3s apart when unset), and any
    /// lookup failure counts as "not visible yet".
    pub async fn execute_soft_delete<F, Fut>(
        &self,
        soft_delete: F,
        options: &DeleteOptions,
        cancellation: &CancellationToken,
    ) -> DeleteVerificationResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let policy = options.retry_policy(RetryPolicy::SOFT_DELETE);
        let max_retries = policy.max_retries();

        if cancellation.is_cancelled() {
            return Err(Self::cancelled(DeletePhase::SoftDelete, options, 0, 1));
        }

        debug!(
            resource_type = %options.resource_type(),
            resource_id = %options.resource_id(),
            "issuing soft delete"
        );
        soft_delete().await.map_err(|error| {
            warn!(
                resource_type = %options.resource_type(),
                resource_id = %options.resource_id(),
                error = %error,
                "soft delete call failed"
            );
            DeleteVerificationError::SoftDeleteFailed {
                resource_type: options.resource_type(),
                resource_id: options.resource_id().to_owned(),
                detail: GraphErrorInfo::from_app_error(&error),
            }
        })?;

        let mut last_error: Option<GraphErrorInfo> = None;

        for attempt in 1..=max_retries {
            if cancellation.is_cancelled() {
                return Err(Self::cancelled(
                    DeletePhase::SoftDeleteVerification,
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
                    info!(
                        resource_type = %options.resource_type(),
                        resource_id = %options.resource_id(),
                        attempt,
                        max_retries,
                        "soft delete visible in deleted items"
                    );
                    return Ok(());
                }
                Err(error) => {
                    let detail = GraphErrorInfo::from_app_error(&error);
                    debug!(
                        resource_type = %options.resource_type(),
                        resource_id = %options.resource_id(),
                        attempt,
                        max_retries,
                        error = %detail,
                        "soft deleted object not visible yet"
                    );
                    last_error = Some(detail);
                }
            }

            if attempt < max_retries
                && !wait_before_retry(policy.retry_interval(), cancellation).await
            {
                return Err(Self::cancelled(
                    DeletePhase::SoftDeleteVerification,
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
            "soft delete not confirmed before retries ran out"
        );
        Err(DeleteVerificationError::SoftDeleteNotVerified {
            resource_type: options.resource_type(),
            resource_id: options.resource_id().to_owned(),
            attempts: max_retries,
            max_retries,
            last_error: ObservedError(last_error),
        })
    }
}
