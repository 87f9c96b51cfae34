//! Cached task snapshot
//!
//! The terminal client keeps the last task list it loaded in a JSON file next
//! to the database and shows it when the store cannot be read.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::task::TaskRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Owner of every task in the snapshot
    pub user_id: String,
    pub saved_at: DateTime<Utc>,
    pub tasks: Vec<TaskRecord>,
}

impl TaskSnapshot {
    pub fn new(user_id: impl Into<String>, tasks: Vec<TaskRecord>) -> Self {
        Self {
            user_id: user_id.into(),
            saved_at: Utc::now(),
            tasks,
        }
    }

    /// `tasks-cache.json` in the database's directory
    pub fn path_for(db_path: &str) -> PathBuf {
        Path::new(db_path).with_file_name("tasks-cache.json")
    }

    /// Load a snapshot, `None` when no file exists yet
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No task snapshot at {}", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Load the snapshot only if it belongs to `user_id`
    pub fn load_for<P: AsRef<Path>>(path: P, user_id: &str) -> Result<Option<Self>> {
        Ok(Self::load(path)?.filter(|s| s.user_id == user_id))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        debug!("Saved {} tasks to {}", self.tasks.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, TaskStore};

    fn tasks(user_id: &str) -> Result<Vec<TaskRecord>> {
        let store = TaskStore::in_memory()?;
        store.create(user_id, NewTask::weekly("mon", "Gym"))?;
        store.list(user_id)
    }

    #[test]
    fn test_missing_file_is_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(TaskSnapshot::load(dir.path().join("tasks-cache.json"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("tasks-cache.json");

        let snapshot = TaskSnapshot::new("u1", tasks("u1")?);
        snapshot.save(&path)?;

        let loaded = TaskSnapshot::load(&path)?.unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.tasks[0].weekly_day.as_deref(), Some("mon"));
        Ok(())
    }

    #[test]
    fn test_other_users_snapshot_is_ignored() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tasks-cache.json");
        TaskSnapshot::new("u1", tasks("u1")?).save(&path)?;

        assert!(TaskSnapshot::load_for(&path, "u1")?.is_some());
        assert!(TaskSnapshot::load_for(&path, "u2")?.is_none());
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tasks-cache.json");
        std::fs::write(&path, "not json")?;
        assert!(TaskSnapshot::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_path_for() {
        assert_eq!(
            TaskSnapshot::path_for("data/dayline.db"),
            PathBuf::from("data/tasks-cache.json")
        );
    }
}
