use std::collections::HashMap;

use async_trait::async_trait;
use dirsweep_application::{DeletedItemsDirectory, DirectoryObjectRemover};
use dirsweep_core::{AppError, AppResult, GraphErrorInfo};
use dirsweep_domain::DirectoryResourceType;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    Live,
    /// Soft deleted; lookups miss until the counter reaches zero.
    SoftDeleted { pending_lookups: u32 },
    /// Purged; lookups still hit until the counter reaches zero.
    Purged { pending_lookups: u32 },
}

#[derive(Debug, Clone, Copy)]
struct DirectoryObject {
    resource_type: DirectoryResourceType,
    state: ObjectState,
}

/// In-memory directory that replays Graph's eventual consistency.
///
/// Every delete or purge takes `replication_lag` lookups before the
/// deleted items view reflects it.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    objects: RwLock<HashMap<String, DirectoryObject>>,
    replication_lag: u32,
}

impl InMemoryDirectory {
    /// Creates an empty directory with the given replication lag.
    #[must_use]
    pub fn new(replication_lag: u32) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            replication_lag,
        }
    }

    /// Adds a live object.
    pub async fn insert_object(&self, resource_type: DirectoryResourceType, object_id: &str) {
        self.objects.write().await.insert(
            object_id.to_owned(),
            DirectoryObject {
                resource_type,
                state: ObjectState::Live,
            },
        );
    }

    /// Returns whether the object is still live in its owning collection.
    pub async fn is_live(&self, object_id: &str) -> bool {
        self.objects
            .read()
            .await
            .get(object_id)
            .is_some_and(|object| object.state == ObjectState::Live)
    }

    /// Returns whether the directory holds any record of the object.
    pub async fn contains(&self, object_id: &str) -> bool {
        self.objects.read().await.contains_key(object_id)
    }
}

fn missing(object_id: &str) -> AppError {
    AppError::Graph(GraphErrorInfo::new(
        Some(404),
        Some("Request_ResourceNotFound".to_owned()),
        format!(
            "Resource '{object_id}' does not exist or one of its queried reference-property objects are not present."
        ),
    ))
}

#[async_trait]
impl DirectoryObjectRemover for InMemoryDirectory {
    async fn delete_object(
        &self,
        resource_type: DirectoryResourceType,
        object_id: &str,
    ) -> AppResult<()> {
        let mut objects = self.objects.write().await;
        let object = objects
            .get_mut(object_id)
            .filter(|object| {
                object.resource_type == resource_type && object.state == ObjectState::Live
            })
            .ok_or_else(|| missing(object_id))?;

        object.state = ObjectState::SoftDeleted {
            pending_lookups: self.replication_lag,
        };
        Ok(())
    }
}

#[async_trait]
impl DeletedItemsDirectory for InMemoryDirectory {
    async fn get_deleted_item(&self, object_id: &str) -> AppResult<()> {
        let mut objects = self.objects.write().await;
        let Some(object) = objects.get_mut(object_id) else {
            return Err(missing(object_id));
        };

        let state = object.state;
        match state {
            ObjectState::Live => Err(missing(object_id)),
            ObjectState::SoftDeleted { pending_lookups: 0 } => Ok(()),
            ObjectState::SoftDeleted { pending_lookups } => {
                object.state = ObjectState::SoftDeleted {
                    pending_lookups: pending_lookups - 1,
                };
                Err(missing(object_id))
            }
            ObjectState::Purged { pending_lookups: 0 } => {
                objects.remove(object_id);
                Err(missing(object_id))
            }
            ObjectState::Purged { pending_lookups } => {
                object.state = ObjectState::Purged {
                    pending_lookups: pending_lookups - 1,
                };
                Ok(())
            }
        }
    }

    async fn purge_deleted_item(&self, object_id: &str) -> AppResult<()> {
        let mut objects = self.objects.write().await;
        let object = objects
            .get_mut(object_id)
            .filter(|object| object.state == ObjectState::SoftDeleted { pending_lookups: 0 })
            .ok_or_else(|| missing(object_id))?;

        object.state = ObjectState::Purged {
            pending_lookups: self.replication_lag,
        };
        Ok(())
    }
}
