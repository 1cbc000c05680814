//! JSON file progress store.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use ageshift_core::error::DomainError;
use ageshift_core::progress::{Clock, ProgressStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

/// On-disk layout of the progress file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressFile {
    /// Last persisted age index.
    pub current_index: Option<usize>,
    /// Collected item ids.
    pub collected: BTreeSet<String>,
    /// When the file was last written.
    pub saved_at: Option<DateTime<Utc>>,
}

/// Progress store backed by one JSON file.
///
/// Every operation reads the file, so edits made while the host is stopped
/// are picked up; writes go to a sibling temp file that is then renamed
/// over the original.
pub struct JsonFileProgressStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    io: Mutex<()>,
}

impl std::fmt::Debug for JsonFileProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileProgressStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn infra(action: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::Infrastructure(format!("failed to {action} progress: {err}"))
}

impl JsonFileProgressStore {
    /// Creates a store writing to `path`, stamping saves with `clock`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            io: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<ProgressFile, DomainError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| infra("parse", e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ProgressFile::default()),
            Err(e) => Err(infra("read", e)),
        }
    }

    async fn write(&self, mut file: ProgressFile) -> Result<(), DomainError> {
        file.saved_at = Some(self.clock.now());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| infra("create directory for", e))?;
        }
        let json = serde_json::to_vec_pretty(&file).map_err(|e| infra("encode", e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| infra("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| infra("replace", e))?;
        debug!(path = %self.path.display(), "progress saved");
        Ok(())
    }

    /// Reads the whole progress file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the file exists but cannot
    /// be read or parsed.
    pub async fn load(&self) -> Result<ProgressFile, DomainError> {
        let _io = self.io.lock().await;
        self.read().await
    }
}

#[async_trait]
impl ProgressStore for JsonFileProgressStore {
    async fn save_current_index(&self, index: usize) -> Result<(), DomainError> {
        let _io = self.io.lock().await;
        let mut file = self.read().await?;
        file.current_index = Some(index);
        self.write(file).await
    }

    async fn load_current_index(&self) -> Result<Option<usize>, DomainError> {
        Ok(self.load().await?.current_index)
    }

    async fn mark_collected(&self, id: &str) -> Result<(), DomainError> {
        let _io = self.io.lock().await;
        let mut file = self.read().await?;
        if file.collected.insert(id.to_owned()) {
            self.write(file).await?;
        }
        Ok(())
    }

    async fn has_collected(&self, id: &str) -> Result<bool, DomainError> {
        Ok(self.load().await?.collected.contains(id))
    }
}
