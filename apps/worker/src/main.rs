//! dirsweep bulk delete worker.

#![forbid(unsafe_code)]

mod worker_config;

use std::sync::Arc;
use std::time::Duration;

use dirsweep_application::{
    DeleteVerificationService, DeletedItemsDirectory, DirectoryObjectRemover,
};
use dirsweep_core::{AppError, AppResult};
use dirsweep_domain::DeleteOptions;
use dirsweep_infrastructure::{GraphDirectoryClient, InMemoryDirectory};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::worker_config::{WorkerBackend, WorkerConfig};

struct DirectoryBackend {
    deleted_items: Arc<dyn DeletedItemsDirectory>,
    remover: Arc<dyn DirectoryObjectRemover>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let backend = build_backend(&config).await?;
    let service = DeleteVerificationService::new(backend.deleted_items.clone());

    let cancellation = CancellationToken::new();
    watch_for_shutdown(&cancellation, config.deadline);

    info!(
        resource_type = %config.resource_type,
        object_count = config.object_ids.len(),
        hard_delete = config.hard_delete,
        concurrency = config.concurrency,
        "dirsweep-worker started"
    );

    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let mut tasks = JoinSet::new();

    for object_id in &config.object_ids {
        let options = DeleteOptions::new(config.resource_type, object_id.as_str())?
            .with_max_retries(config.max_retries)
            .with_retry_interval(config.retry_interval);
        let service = service.clone();
        let remover = backend.remover.clone();
        let semaphore = semaphore.clone();
        let cancellation = cancellation.clone();
        let hard_delete = config.hard_delete;

        tasks.spawn(async move {
            let result = run_delete(
                &service,
                remover.as_ref(),
                &semaphore,
                hard_delete,
                &options,
                &cancellation,
            )
            .await;
            (options.resource_id().to_owned(), result)
        });
    }

    let total = config.object_ids.len();
    let mut failed = 0_usize;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((object_id, Ok(()))) => {
                info!(object_id = %object_id, "delete verified");
            }
            Ok((object_id, Err(error))) => {
                failed = failed.saturating_add(1);
                warn!(object_id = %object_id, error = %error, "delete failed");
            }
            Err(error) => {
                failed = failed.saturating_add(1);
                warn!(error = %error, "delete task aborted");
            }
        }
    }

    info!(total, failed, "dirsweep-worker finished");

    if failed > 0 {
        return Err(AppError::Internal(format!(
            "{failed} of {total} deletes failed"
        )));
    }

    Ok(())
}

async fn run_delete(
    service: &DeleteVerificationService,
    remover: &dyn DirectoryObjectRemover,
    semaphore: &Arc<Semaphore>,
    hard_delete: bool,
    options: &DeleteOptions,
    cancellation: &CancellationToken,
) -> AppResult<()> {
    let _permit = semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|error| AppError::Internal(format!("worker semaphore closed: {error}")))?;

    service
        .delete_directory_object(remover, hard_delete, options, cancellation)
        .await
        .map_err(AppError::from)
}

async fn build_backend(config: &WorkerConfig) -> AppResult<DirectoryBackend> {
    match &config.backend {
        WorkerBackend::Graph(graph_config) => {
            let client = Arc::new(GraphDirectoryClient::new(graph_config.clone())?);
            info!(base_url = %graph_config.base_url(), "using microsoft graph backend");
            Ok(DirectoryBackend {
                deleted_items: client.clone(),
                remover: client,
            })
        }
        WorkerBackend::Memory { replication_lag } => {
            let directory = Arc::new(InMemoryDirectory::new(*replication_lag));
            for object_id in &config.object_ids {
                directory
                    .insert_object(config.resource_type, object_id.as_str())
                    .await;
            }
            info!(
                replication_lag = *replication_lag,
                "using in-memory backend"
            );
            Ok(DirectoryBackend {
                deleted_items: directory.clone(),
                remover: directory,
            })
        }
    }
}

fn watch_for_shutdown(cancellation: &CancellationToken, deadline: Option<Duration>) {
    let on_signal = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown requested, cancelling pending deletes");
            on_signal.cancel();
        }
    });

    if let Some(deadline) = deadline {
        let on_deadline = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            warn!(
                deadline_seconds = deadline.as_secs(),
                "deadline reached, cancelling pending deletes"
            );
            on_deadline.cancel();
        });
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
