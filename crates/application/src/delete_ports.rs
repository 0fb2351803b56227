use async_trait::async_trait;
use dirsweep_core::AppResult;
use dirsweep_domain::DirectoryResourceType;

/// Port over the directory's recycle bin of soft-deleted objects.
#[async_trait]
pub trait DeletedItemsDirectory: Send + Sync {
    /// Looks up a soft-deleted object by identifier.
    ///
    /// Returns `Ok(())` when the object is visible in deleted items and an
    /// error otherwise. A missing object should surface as an error that
    /// classifies as not found.
    async fn get_deleted_item(&self, object_id: &str) -> AppResult<()>;

    /// Permanently removes a soft-deleted object.
    async fn purge_deleted_item(&self, object_id: &str) -> AppResult<()>;
}

/// Port for the primary delete of a live directory object.
#[async_trait]
pub trait DirectoryObjectRemover: Send + Sync {
    /// Deletes the object from its owning collection, moving it to deleted items.
    async fn delete_object(
        &self,
        resource_type: DirectoryResourceType,
        object_id: &str,
    ) -> AppResult<()>;
}
