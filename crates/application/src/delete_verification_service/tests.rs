use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dirsweep_core::{AppError, AppResult, GraphErrorInfo};
use dirsweep_domain::{DeleteOptions, DirectoryResourceType};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::delete_ports::{DeletedItemsDirectory, DirectoryObjectRemover};

use super::{DeletePhase, DeleteVerificationError, DeleteVerificationService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scripted {
    Ok,
    NotFound,
    NotFoundByCode,
    NotFoundByMessage,
    Forbidden,
}

impl Scripted {
    fn into_result(self, object_id: &str) -> AppResult<()> {
        match self {
            Self::Ok => Ok(()),
            Self::NotFound => Err(AppError::Graph(GraphErrorInfo::new(
                Some(404),
                Some("Request_ResourceNotFound".to_owned()),
                format!("Resource '{object_id}' does not exist or one of its queried reference-property objects are not present."),
            ))),
            Self::NotFoundByCode => Err(AppError::Graph(GraphErrorInfo::new(
                Some(400),
                Some("ErrorItemNotFound".to_owned()),
                "The request failed.",
            ))),
            Self::NotFoundByMessage => Err(AppError::Graph(GraphErrorInfo::new(
                Some(400),
                Some("BadRequest".to_owned()),
                "The specified object no longer exists.",
            ))),
            Self::Forbidden => Err(AppError::Graph(GraphErrorInfo::new(
                Some(403),
                Some("Authorization_RequestDenied".to_owned()),
                "Insufficient privileges to complete the operation.",
            ))),
        }
    }
}

struct FakeDeletedItemsDirectory {
    lookups: Mutex<VecDeque<Scripted>>,
    lookup_fallback: Scripted,
    purge: Scripted,
    lookup_calls: AtomicU32,
    purge_calls: AtomicU32,
    cancel_after_lookups: Option<(u32, CancellationToken)>,
}

impl FakeDeletedItemsDirectory {
    fn new(lookup_fallback: Scripted) -> Self {
        Self {
            lookups: Mutex::new(VecDeque::new()),
            lookup_fallback,
            purge: Scripted::Ok,
            lookup_calls: AtomicU32::new(0),
            purge_calls: AtomicU32::new(0),
            cancel_after_lookups: None,
        }
    }

    fn with_lookups(mut self, lookups: impl IntoIterator<Item = Scripted>) -> Self {
        self.lookups = Mutex::new(lookups.into_iter().collect());
        self
    }

    fn with_purge(mut self, purge: Scripted) -> Self {
        self.purge = purge;
        self
    }

    fn cancelling_after(mut self, lookups: u32, token: CancellationToken) -> Self {
        self.cancel_after_lookups = Some((lookups, token));
        self
    }

    fn lookup_calls(&self) -> u32 {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    fn purge_calls(&self) -> u32 {
        self.purge_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeletedItemsDirectory for FakeDeletedItemsDirectory {
    async fn get_deleted_item(&self, object_id: &str) -> AppResult<()> {
        let calls = self.lookup_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((threshold, token)) = &self.cancel_after_lookups
            && calls >= *threshold
        {
            token.cancel();
        }

        let scripted = self
            .lookups
            .lock()
            .await
            .pop_front()
            .unwrap_or(self.lookup_fallback);
        scripted.into_result(object_id)
    }

    async fn purge_deleted_item(&self, object_id: &str) -> AppResult<()> {
        self.purge_calls.fetch_add(1, Ordering::SeqCst);
        self.purge.into_result(object_id)
    }
}

#[derive(Default)]
struct FakeRemover {
    deleted: Mutex<Vec<(DirectoryResourceType, String)>>,
}

#[async_trait]
impl DirectoryObjectRemover for FakeRemover {
    async fn delete_object(
        &self,
        resource_type: DirectoryResourceType,
        object_id: &str,
    ) -> AppResult<()> {
        self.deleted
            .lock()
            .await
            .push((resource_type, object_id.to_owned()));
        Ok(())
    }
}

fn fast_options(max_retries: u32) -> DeleteOptions {
    DeleteOptions::new(DirectoryResourceType::ServicePrincipal, "abc-123")
        .unwrap_or_else(|_| unreachable!())
        .with_display_name("Build Agent")
        .with_max_retries(max_retries)
        .with_retry_interval(Duration::from_millis(1))
}

fn service(directory: &Arc<FakeDeletedItemsDirectory>) -> DeleteVerificationService {
    DeleteVerificationService::new(directory.clone())
}

async fn succeed() -> AppResult<()> {
    Ok(())
}

#[tokio::test]
async fn soft_delete_succeeds_once_lookup_finds_object() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::Ok)
            .with_lookups([Scripted::NotFound, Scripted::NotFound]),
    );

    let result = service(&directory)
        .execute_soft_delete(succeed, &fast_options(3), &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(directory.lookup_calls(), 3);
}

#[tokio::test]
async fn soft_delete_fails_after_exhausting_lookups() {
    let directory = Arc::new(FakeDeletedItemsDirectory::new(Scripted::NotFound));

    let result = service(&directory)
        .execute_soft_delete(succeed, &fast_options(3), &CancellationToken::new())
        .await;

    assert_eq!(directory.lookup_calls(), 3);
    match result {
        Err(
            error @ DeleteVerificationError::SoftDeleteNotVerified {
                attempts: 3,
                max_retries: 3,
                ..
            },
        ) => {
            let message = error.to_string();
            assert!(message.contains("3 of 3 attempts"));
            assert!(message.contains("status 404"));
            assert!(message.contains("Request_ResourceNotFound"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn soft_delete_stops_polling_at_first_visible_lookup() {
    let directory = Arc::new(FakeDeletedItemsDirectory::new(Scripted::Ok));

    let result = service(&directory)
        .execute_soft_delete(succeed, &fast_options(5), &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(directory.lookup_calls(), 1);
}

#[tokio::test]
async fn soft_delete_treats_any_lookup_failure_as_not_visible_yet() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::Ok)
            .with_lookups([Scripted::Forbidden, Scripted::NotFound]),
    );

    let result = service(&directory)
        .execute_soft_delete(succeed, &fast_options(4), &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(directory.lookup_calls(), 3);
}

#[tokio::test]
async fn failed_soft_delete_call_skips_verification_and_hard_delete() {
    let directory = Arc::new(FakeDeletedItemsDirectory::new(Scripted::Ok));

    let result = service(&directory)
        .execute_delete_with_verification(
            || async { Scripted::Forbidden.into_result("abc-123") },
            true,
            &fast_options(3),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(DeleteVerificationError::SoftDeleteFailed {
            resource_type,
            resource_id,
            detail,
        }) => {
            assert_eq!(resource_type, DirectoryResourceType::ServicePrincipal);
            assert_eq!(resource_id, "abc-123");
            assert_eq!(detail.status_code(), Some(403));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(directory.lookup_calls(), 0);
    assert_eq!(directory.purge_calls(), 0);
}

#[tokio::test]
async fn soft_only_delete_never_purges() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::Ok).with_lookups([Scripted::NotFound]),
    );

    let result = service(&directory)
        .execute_delete_with_verification(
            succeed,
            false,
            &fast_options(3),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(directory.lookup_calls(), 2);
    assert_eq!(directory.purge_calls(), 0);
}

#[tokio::test]
async fn full_delete_purges_and_confirms_removal() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::NotFound)
            .with_lookups([Scripted::NotFound, Scripted::Ok, Scripted::Ok]),
    );

    let result = service(&directory)
        .execute_delete_with_verification(
            succeed,
            true,
            &fast_options(4),
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(directory.purge_calls(), 1);
    // two soft delete lookups, then present once and missing once after the purge
    assert_eq!(directory.lookup_calls(), 4);
}

#[tokio::test]
async fn hard_delete_treats_404_purge_as_done_without_polling() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::Ok).with_purge(Scripted::NotFound),
    );

    let result = service(&directory)
        .execute_hard_delete(&fast_options(3), &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(directory.purge_calls(), 1);
    assert_eq!(directory.lookup_calls(), 0);
}

#[tokio::test]
async fn hard_delete_recognizes_not_found_codes_and_messages() {
    for purge in [Scripted::NotFoundByCode, Scripted::NotFoundByMessage] {
        let directory =
            Arc::new(FakeDeletedItemsDirectory::new(Scripted::Ok).with_purge(purge));

        let result = service(&directory)
            .execute_hard_delete(&fast_options(3), &CancellationToken::new())
            .await;

        assert!(result.is_ok(), "purge {purge:?} should be idempotent");
        assert_eq!(directory.lookup_calls(), 0);
    }
}

#[tokio::test]
async fn hard_delete_surfaces_other_purge_failures_without_polling() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::Ok).with_purge(Scripted::Forbidden),
    );

    let result = service(&directory)
        .execute_hard_delete(&fast_options(3), &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(DeleteVerificationError::HardDeleteFailed { .. })
    ));
    assert_eq!(directory.lookup_calls(), 0);
}

#[tokio::test]
async fn hard_delete_polls_until_lookup_reports_not_found() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::NotFoundByMessage)
            .with_lookups([Scripted::Ok, Scripted::Ok]),
    );

    let result = service(&directory)
        .execute_hard_delete(&fast_options(5), &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(directory.lookup_calls(), 3);
}

#[tokio::test]
async fn hard_delete_exhaustion_asks_for_manual_cleanup() {
    let directory = Arc::new(FakeDeletedItemsDirectory::new(Scripted::Ok));

    let result = service(&directory)
        .execute_hard_delete(&fast_options(3), &CancellationToken::new())
        .await;

    assert_eq!(directory.lookup_calls(), 3);
    match result {
        Err(error @ DeleteVerificationError::HardDeleteNotVerified { .. }) => {
            assert_eq!(error.phase(), DeletePhase::HardDeleteVerification);
            assert!(error.to_string().contains("manual cleanup may be required"));
            assert!(error.to_string().contains("3 of 3 attempts"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn hard_delete_returns_unexpected_lookup_errors_immediately() {
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::NotFound)
            .with_lookups([Scripted::Ok, Scripted::Forbidden]),
    );

    let result = service(&directory)
        .execute_hard_delete(&fast_options(5), &CancellationToken::new())
        .await;

    match result {
        Err(DeleteVerificationError::UnexpectedVerificationError {
            attempt, detail, ..
        }) => {
            assert_eq!(attempt, 2);
            assert_eq!(detail.status_code(), Some(403));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(directory.lookup_calls(), 2);
}

#[tokio::test]
async fn cancelled_token_prevents_any_call() {
    let directory = Arc::new(FakeDeletedItemsDirectory::new(Scripted::Ok));
    let invoked = AtomicBool::new(false);
    let token = CancellationToken::new();
    token.cancel();

    let result = service(&directory)
        .execute_delete_with_verification(
            || async {
                invoked.store(true, Ordering::SeqCst);
                Ok(())
            },
            true,
            &fast_options(3),
            &token,
        )
        .await;

    assert!(matches!(
        result,
        Err(DeleteVerificationError::Cancelled {
            phase: DeletePhase::SoftDelete,
            completed_attempts: 0,
            ..
        })
    ));
    assert!(!invoked.load(Ordering::SeqCst));
    assert_eq!(directory.lookup_calls(), 0);
    assert_eq!(directory.purge_calls(), 0);
}

#[tokio::test]
async fn cancellation_mid_loop_stops_polling() {
    let token = CancellationToken::new();
    let directory = Arc::new(
        FakeDeletedItemsDirectory::new(Scripted::NotFound).cancelling_after(2, token.clone()),
    );

    let result = service(&directory)
        .execute_delete_with_verification(succeed, true, &fast_options(10), &token)
        .await;

    match result {
        Err(
            error @ DeleteVerificationError::Cancelled {
                completed_attempts: 2,
                max_retries: 10,
                ..
            },
        ) => {
            assert!(error.is_cancelled());
            assert_eq!(error.phase(), DeletePhase::SoftDeleteVerification);
            assert!(error.to_string().contains("cancelled after 2 of 10 attempts"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(directory.lookup_calls(), 2);
    assert_eq!(directory.purge_calls(), 0);
}

#[tokio::test]
async fn cancellation_interrupts_retry_sleep() {
    let directory = Arc::new(FakeDeletedItemsDirectory::new(Scripted::NotFound));
    let token = CancellationToken::new();
    let options = fast_options(3).with_retry_interval(Duration::from_secs(60));

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        service(&directory).execute_soft_delete(succeed, &options, &token),
    )
    .await;

    assert!(matches!(
        result,
        Ok(Err(DeleteVerificationError::Cancelled {
            completed_attempts: 1,
            ..
        }))
    ));
    assert_eq!(directory.lookup_calls(), 1);
}

#[tokio::test]
async fn delete_directory_object_uses_remover_for_primary_delete() {
    let directory = Arc::new(FakeDeletedItemsDirectory::new(Scripted::Ok));
    let remover = FakeRemover::default();
    let options = DeleteOptions::new(DirectoryResourceType::Application, "app-1")
        .unwrap_or_else(|_| unreachable!())
        .with_max_retries(2)
        .with_retry_interval(Duration::from_millis(1));

    let result = service(&directory)
        .delete_directory_object(&remover, false, &options, &CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(
        remover.deleted.lock().await.clone(),
        vec![(DirectoryResourceType::Application, "app-1".to_owned())]
    );
}

#[test]
fn cancellation_converts_to_cancelled_app_error() {
    let error = DeleteVerificationError::Cancelled {
        phase: DeletePhase::HardDeleteVerification,
        resource_type: DirectoryResourceType::User,
        resource_id: "user-1".to_owned(),
        completed_attempts: 1,
        max_retries: 5,
    };

    assert!(matches!(AppError::from(error), AppError::Cancelled(_)));
}
