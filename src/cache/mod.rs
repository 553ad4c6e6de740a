//! Keyed request cache for remote query results.
//!
//! This module is backend-agnostic:
//! - Results are cached under semantic query keys (e.g. "tickets page 2")
//!   that also carry an invalidation family (e.g. "tickets")
//! - Whole families are invalidated after mutations
//! - Basic offline mode (serve stale cache when the network is unavailable)
//! - The entire cache can be cleared when the principal changes

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, CachedEntry, NoopStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource, QueryKey};
