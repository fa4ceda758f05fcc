use super::archive::extract_zip;
use super::walk::{list_files, WalkConfig};
use super::FileStoreError;
use crate::store::ProjectId;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub is_dir: bool,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    uploads_root: PathBuf,
    builds_root: PathBuf,
    walk: WalkConfig,
}

impl FileStore {
    pub fn new(uploads_root: impl Into<PathBuf>, builds_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
            builds_root: builds_root.into(),
            walk: WalkConfig::default(),
        }
    }

    pub fn with_walk_config(mut self, walk: WalkConfig) -> Self {
        self.walk = walk;
        self
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    pub fn builds_root(&self) -> &Path {
        &self.builds_root
    }

    /// Creates both roots.
    pub async fn init(&self) -> Result<(), FileStoreError> {
        self.ensure_directory(&self.uploads_root).await?;
        self.ensure_directory(&self.builds_root).await?;
        info!(
            uploads = %self.uploads_root.display(),
            builds = %self.builds_root.display(),
            "File store ready"
        );
        Ok(())
    }

    /// Persists an upload as `<unix-millis>_<name>`.
    pub async fn save_upload(&self, bytes: &[u8], name: &str) -> Result<PathBuf, FileStoreError> {
        self.ensure_directory(&self.uploads_root).await?;
        let file_name = format!("{}_{}", Utc::now().timestamp_millis(), name);
        let path = self.uploads_root.join(file_name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| FileStoreError::io(&path, e))?;
        debug!(path = %path.display(), size = bytes.len(), "Upload saved");
        Ok(path)
    }

    /// Working directory path for a project, without touching the disk.
    pub fn project_path(&self, id: ProjectId) -> PathBuf {
        self.builds_root.join(format!("project_{}", id))
    }

    /// Working directory for a project, created when absent.
    pub async fn project_directory(&self, id: ProjectId) -> Result<PathBuf, FileStoreError> {
        let path = self.project_path(id);
        self.ensure_directory(&path).await?;
        Ok(path)
    }

    pub async fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<usize, FileStoreError> {
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
            .await
            .map_err(|e| FileStoreError::Task(e.to_string()))?
    }

    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    pub async fn read_to_string(&self, path: &Path) -> Result<String, FileStoreError> {
        fs::read_to_string(path)
            .await
            .map_err(|e| Self::map_read_error(path, e))
    }

    pub async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FileStoreError> {
        fs::read(path).await.map_err(|e| Self::map_read_error(path, e))
    }

    /// Writes a file, creating parent directories first.
    pub async fn write_file(
        &self,
        path: &Path,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), FileStoreError> {
        if let Some(parent) = path.parent() {
            self.ensure_directory(parent).await?;
        }
        fs::write(path, contents)
            .await
            .map_err(|e| FileStoreError::io(path, e))
    }

    pub async fn ensure_directory(&self, path: &Path) -> Result<(), FileStoreError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| FileStoreError::io(path, e))
    }

    pub async fn metadata(&self, path: &Path) -> Result<FileStat, FileStoreError> {
        let meta = fs::metadata(path)
            .await
            .map_err(|e| Self::map_read_error(path, e))?;
        Ok(FileStat {
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    /// Relative `/`-separated paths of every regular file under `dir`.
    pub async fn list_files(&self, dir: &Path) -> Result<Vec<String>, FileStoreError> {
        let dir = dir.to_path_buf();
        let walk = self.walk.clone();
        tokio::task::spawn_blocking(move || list_files(&dir, &walk))
            .await
            .map_err(|e| FileStoreError::Task(e.to_string()))
    }

    /// Best-effort recursive delete. Failures are logged only.
    pub async fn delete_directory(&self, path: &Path) {
        match fs::remove_dir_all(path).await {
            Ok(()) => debug!(path = %path.display(), "Directory deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete directory"),
        }
    }

    /// Best-effort single file delete. Failures are logged only.
    pub async fn delete_file(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete file"),
        }
    }

    fn map_read_error(path: &Path, e: std::io::Error) -> FileStoreError {
        if e.kind() == std::io::ErrorKind::NotFound {
            FileStoreError::NotFound(path.to_path_buf())
        } else {
            FileStoreError::io(path, e)
        }
    }
}
