//! JSON-backed media info cache.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::entry::{CacheEntry, Orientation};
use crate::scanner::path_utils::{is_within, path_key};

/// File name of the cache inside the per-user data directory.
pub const CACHE_FILE_NAME: &str = "media_info_cache.json";

/// Errors that can occur while reading or writing the cache file.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache I/O error for {path}: {source}")]
    Io {
        /// Path of the cache file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The cache file does not contain a valid JSON object.
    #[error("cache file {path} is corrupted: {source}")]
    Corrupted {
        /// Path of the cache file
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the in-memory mapping failed.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Counts describing the cache contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub entries: usize,
    /// Entries classified as vertical
    pub vertical: usize,
    /// Entries classified as horizontal
    pub horizontal: usize,
    /// Entries with unreadable dimensions
    pub unknown: usize,
    /// Entries whose duration could not be probed
    pub unprobed: usize,
}

/// Persistent mapping from normalized file path to probe results.
///
/// The store is loaded once, mutated in memory while a scan runs, and written
/// back with [`MediaInfoCache::persist`]. It holds no locks: the owner is
/// expected to be the only writer for the lifetime of a scan.
#[derive(Debug, Clone)]
pub struct MediaInfoCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    atomic: bool,
}

impl MediaInfoCache {
    /// Create an empty cache that will persist to `path`, without reading it.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            atomic: true,
        }
    }

    /// Load the cache stored at `path`.
    ///
    /// A missing, unreadable or corrupted file yields an empty cache. A cold
    /// start is not an error.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut cache = Self::new(path);
        match cache.read_entries() {
            Ok(entries) => {
                log::debug!(
                    "Loaded {} cache entries from {}",
                    entries.len(),
                    cache.path.display()
                );
                cache.entries = entries;
            }
            Err(CacheError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::debug!("No cache at {}, starting cold", cache.path.display());
            }
            Err(e) => {
                log::warn!("Ignoring unusable cache: {}", e);
            }
        }
        cache
    }

    /// Choose between temp-file-and-rename (default) and in-place overwrite
    /// when persisting.
    #[must_use]
    pub fn with_atomic_persist(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    fn read_entries(&self) -> CacheResult<BTreeMap<String, CacheEntry>> {
        let content = fs::read_to_string(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CacheError::Corrupted {
            path: self.path.clone(),
            source,
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the entry for a cache key (see [`path_key`]).
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Look up the entry for a file path, normalizing it first.
    #[must_use]
    pub fn lookup_path(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(&path_key(path))
    }

    /// Insert or overwrite the entry for a cache key.
    pub fn upsert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Iterate over `(key, entry)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove every entry whose path lies inside `folder`.
    ///
    /// Keys are re-normalized before comparing, so stores written by other
    /// tools with un-normalized keys are handled too. Matching is by path
    /// component, not raw string prefix.
    ///
    /// Returns the number of removed entries.
    pub fn remove_prefix(&mut self, folder: &Path) -> usize {
        let folder = path_key(folder);
        let before = self.entries.len();
        self.entries.retain(|key, _| !is_within(key, &folder));
        let removed = before - self.entries.len();
        log::debug!("Removed {} cache entries under {}", removed, folder);
        removed
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Summarize the cache contents.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            entries: self.entries.len(),
            ..CacheStats::default()
        };
        for entry in self.entries.values() {
            match entry.orientation {
                Orientation::Vertical => stats.vertical += 1,
                Orientation::Horizontal => stats.horizontal += 1,
                Orientation::Unknown => stats.unknown += 1,
            }
            if entry.is_unprobed() {
                stats.unprobed += 1;
            }
        }
        stats
    }

    /// Write the full mapping back to disk.
    ///
    /// With atomic persistence (the default) the snapshot is written to a
    /// temporary file in the same directory and renamed over the previous
    /// one, so a crash mid-write leaves the last good snapshot intact.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created or the file
    /// cannot be written. Scanners log and ignore this.
    pub fn persist(&self) -> CacheResult<()> {
        let json = serde_json::to_string(&self.entries)?;
        let io_err = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(io_err)?;

        if self.atomic {
            let mut tmp = NamedTempFile::new_in(&parent).map_err(io_err)?;
            tmp.write_all(json.as_bytes()).map_err(io_err)?;
            tmp.as_file().sync_all().map_err(io_err)?;
            tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        } else {
            fs::write(&self.path, json).map_err(io_err)?;
        }

        log::debug!(
            "Persisted {} cache entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Default per-user cache location (`<local data dir>/media_info_cache.json`).
///
/// # Errors
///
/// Fails if the platform has no home directory to derive it from.
pub fn default_cache_path() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "randvid", "randvid")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
    Ok(dirs.data_local_dir().join(CACHE_FILE_NAME))
}
