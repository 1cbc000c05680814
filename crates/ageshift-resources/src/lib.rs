//! Resource Loader Session for the Ageshift engine.
//!
//! Fetches per-age visual assets through an injected `AssetFetcher`,
//! caches them by key within a byte budget and hands out generation-tagged
//! handles so callers can tell stale results from current ones.

pub mod handle;
pub mod session;

pub use handle::{HandleId, LoadState, ResourceHandle};
pub use session::{DEFAULT_BUDGET_BYTES, ResourceSession};
