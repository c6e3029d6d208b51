//! Media info cache for RandVid.
//!
//! This module provides persistent storage for probe results (duration and
//! orientation) so that rescans of a folder only probe new or changed files.
//!
//! # Architecture
//!
//! * [`store`]: JSON persistence, prefix invalidation and statistics.
//! * [`entry`]: The stored record and its freshness check.
//!
//! # Cache Invalidation
//!
//! Entries are keyed by normalized absolute path and validated against the
//! file's modification time. If the mtime recorded at probe time differs
//! from the file's current mtime, the entry is stale and the file is
//! re-probed during the next scan. A folder can also be invalidated
//! wholesale with [`MediaInfoCache::remove_prefix`] before a forced rescan.

pub mod entry;
pub mod store;

pub use entry::{mtime_seconds, CacheEntry, Orientation, DURATION_SENTINEL};
pub use store::{
    default_cache_path, CacheError, CacheResult, CacheStats, MediaInfoCache, CACHE_FILE_NAME,
};
