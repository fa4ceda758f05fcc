//! Project records and their append-only build logs
//!
//! Every component reads and writes projects through the [`ProjectStore`]
//! trait. [`InMemoryProjectStore`] is the bundled implementation.

pub mod memory;
pub mod models;

pub use memory::InMemoryProjectStore;
pub use models::{
    BuildLogEntry, LogLevel, NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Assigns the next id, status `uploaded`, progress 0.
    async fn create_project(&self, new: NewProject) -> Result<Project, StoreError>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// Merges the update and refreshes `updated_at`. `None` for unknown ids.
    async fn update_project(
        &self,
        id: ProjectId,
        update: ProjectUpdate,
    ) -> Result<Option<Project>, StoreError>;

    /// Removes the record and its logs. Returns whether a record existed.
    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError>;

    /// All projects in ascending id order.
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    async fn append_log(
        &self,
        project_id: ProjectId,
        level: LogLevel,
        message: String,
    ) -> Result<BuildLogEntry, StoreError>;

    /// Entries for one project in insertion order.
    async fn list_logs(&self, project_id: ProjectId) -> Result<Vec<BuildLogEntry>, StoreError>;

    /// Returns how many entries were removed.
    async fn clear_logs(&self, project_id: ProjectId) -> Result<usize, StoreError>;
}
