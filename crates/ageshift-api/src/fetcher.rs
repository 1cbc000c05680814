//! Filesystem asset fetcher.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ageshift_core::asset::{AssetFetcher, VisualAsset};
use ageshift_core::error::DomainError;
use async_trait::async_trait;
use tracing::debug;

/// Loads visual assets from files under a root directory.
///
/// Keys are relative paths; keys that would escape the root are rejected.
#[derive(Debug)]
pub struct FsAssetFetcher {
    root: PathBuf,
    resident_bytes: AtomicU64,
}

impl FsAssetFetcher {
    /// Creates a fetcher rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resident_bytes: AtomicU64::new(0),
        }
    }

    /// Total size of fetched assets that have not been released.
    #[must_use]
    pub fn resident_bytes(&self) -> u64 {
        self.resident_bytes.load(Ordering::Relaxed)
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, DomainError> {
        let relative = Path::new(key);
        let confined = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !confined {
            return Err(DomainError::AssetLoad {
                key: key.to_owned(),
                reason: "key must be a relative path inside the asset root".into(),
            });
        }
        Ok(self.root.join(relative))
    }
}

fn byte_len(asset: &VisualAsset) -> u64 {
    u64::try_from(asset.data.len()).unwrap_or(u64::MAX)
}

#[async_trait]
impl AssetFetcher for FsAssetFetcher {
    async fn fetch(&self, key: &str) -> Result<VisualAsset, DomainError> {
        let path = self.resolve(key)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DomainError::AssetLoad {
                key: key.to_owned(),
                reason: e.to_string(),
            })?;
        let asset = VisualAsset::new(key, bytes);
        self.resident_bytes
            .fetch_add(byte_len(&asset), Ordering::Relaxed);
        debug!(key, bytes = asset.data.len(), "asset loaded from disk");
        Ok(asset)
    }

    fn release(&self, asset: &VisualAsset) {
        self.resident_bytes
            .fetch_sub(byte_len(asset), Ordering::Relaxed);
        debug!(key = %asset.key, "asset released");
    }
}
