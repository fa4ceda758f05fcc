use super::models::{BuildLogEntry, LogLevel, NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate};
use super::{ProjectStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
struct StoreState {
    projects: BTreeMap<ProjectId, Project>,
    logs: HashMap<ProjectId, Vec<BuildLogEntry>>,
    next_project_id: ProjectId,
    next_log_id: u64,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            projects: BTreeMap::new(),
            logs: HashMap::new(),
            next_project_id: 1,
            next_log_id: 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    state: RwLock<StoreState>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn create_project(&self, new: NewProject) -> Result<Project, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_project_id;
        state.next_project_id += 1;

        let now = Utc::now();
        let project = Project {
            id,
            name: new.name,
            original_file_name: new.original_file_name,
            file_size: new.file_size,
            framework: None,
            status: ProjectStatus::Uploaded,
            progress: 0,
            analysis: None,
            apk_path: None,
            apk_size: None,
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(id, project.clone());
        debug!(project_id = id, name = %project.name, "Project created");
        Ok(project)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.state.read().await.projects.get(&id).cloned())
    }

    async fn update_project(
        &self,
        id: ProjectId,
        update: ProjectUpdate,
    ) -> Result<Option<Project>, StoreError> {
        let mut state = self.state.write().await;
        let Some(project) = state.projects.get_mut(&id) else {
            return Ok(None);
        };
        update.apply_to(project);
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        state.logs.remove(&id);
        Ok(state.projects.remove(&id).is_some())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.state.read().await.projects.values().cloned().collect())
    }

    async fn append_log(
        &self,
        project_id: ProjectId,
        level: LogLevel,
        message: String,
    ) -> Result<BuildLogEntry, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_log_id;
        state.next_log_id += 1;

        let entry = BuildLogEntry {
            id,
            project_id,
            level,
            message,
            timestamp: Utc::now(),
        };
        state
            .logs
            .entry(project_id)
            .or_default()
            .push(entry.clone());
        Ok(entry)
    }

    async fn list_logs(&self, project_id: ProjectId) -> Result<Vec<BuildLogEntry>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .logs
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear_logs(&self, project_id: ProjectId) -> Result<usize, StoreError> {
        Ok(self
            .state
            .write()
            .await
            .logs
            .remove(&project_id)
            .map(|entries| entries.len())
            .unwrap_or(0))
    }
}
