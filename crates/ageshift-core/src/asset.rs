//! Visual asset ports.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainError;

/// A fetched per-age visual asset (sprite atlas or skeleton bundle).
///
/// The payload is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualAsset {
    /// The key the asset was fetched by.
    pub key: String,
    /// Raw asset bytes.
    pub data: Arc<[u8]>,
}

impl VisualAsset {
    /// Creates an asset from its key and bytes.
    #[must_use]
    pub fn new(key: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            key: key.into(),
            data: data.into(),
        }
    }
}

/// External collaborator that fetches visual assets by key.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetches the asset stored under `key`.
    async fn fetch(&self, key: &str) -> Result<VisualAsset, DomainError>;

    /// Frees the underlying resource of an asset that is no longer used.
    fn release(&self, asset: &VisualAsset);
}

/// The visible appearance slot of the player character.
pub trait AppearanceSink: Send + Sync {
    /// Replaces the visible appearance with `asset`.
    fn show(&self, asset: &VisualAsset);
}
