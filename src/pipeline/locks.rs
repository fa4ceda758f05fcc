use crate::store::ProjectId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per project id. Holding the guard means holding the
/// project's only in-flight phase slot.
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<ProjectId, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: ProjectId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drops the entry for a deleted project. Guards already handed out stay
    /// valid.
    pub async fn forget(&self, id: ProjectId) {
        self.locks.lock().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
