// ABOUTME: Collaborator traits the issuance pipeline consumes.
// ABOUTME: Compute covers listing, guest attributes and metadata writes; ProjectDirectory covers folders.

use crate::error::CloudError;
use crate::types::{Instance, Metadata};
use async_trait::async_trait;

/// Instance directory, guest attribute store and metadata writer for one cloud.
#[async_trait]
pub trait Compute: Send + Sync {
    /// All instances in all zones of `project_id`.
    async fn list_instances(&self, project_id: &str) -> Result<Vec<Instance>, CloudError>;

    /// Read one guest attribute. `Ok(None)` when the instance has not published it.
    async fn read_guest_attribute(
        &self,
        project_id: &str,
        zone: &str,
        instance: &str,
        query_path: &str,
    ) -> Result<Option<String>, CloudError>;

    /// Replace the instance's metadata with `metadata`.
    async fn set_metadata(
        &self,
        project_id: &str,
        zone: &str,
        instance: &str,
        metadata: &Metadata,
    ) -> Result<(), CloudError>;
}

/// Folder/project hierarchy lookups.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// IDs of active projects whose direct parent is `folder_id`.
    async fn list_active_projects(&self, folder_id: &str) -> Result<Vec<String>, CloudError>;

    /// IDs of folders whose direct parent is `folder_id`.
    async fn list_sub_folders(&self, folder_id: &str) -> Result<Vec<String>, CloudError>;
}
