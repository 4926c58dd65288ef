use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// One pick as it is written to the snapshot and the remote picks table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRecord {
    pub user: String,
    pub tournament: String,
    pub golfer: String,
    #[serde(default)]
    pub created_at: String,
}

/// JSON file holding every pick, used when no remote store is configured.
#[derive(Debug, Clone)]
pub struct PicksSnapshot {
    path: PathBuf,
}

impl PicksSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, picks: &[PickRecord]) -> Result<(), SyncError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let body = serde_json::to_vec_pretty(picks)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }

    /// `None` when no snapshot has been written yet.
    pub async fn read(&self) -> Result<Option<Vec<PickRecord>>, SyncError> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&body)?))
    }
}
