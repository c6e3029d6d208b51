//! Folder scanner: walk, consult the cache, probe, filter.
//!
//! # Overview
//!
//! [`FolderScanner::scan`] produces the filtered video list for a
//! [`ScanRequest`]:
//!
//! 1. Enumerate every video under the root (see [`VideoWalker`]) and count
//!    them up front.
//! 2. For each file, in walk order: normalize its path, read its current
//!    mtime and look it up in the cache. The cached entry is reused only if
//!    it exists, the request is not a forced reload, and its mtime matches.
//!    Otherwise both probes run and the entry is overwritten.
//! 3. Apply the orientation and length filters and keep matches.
//! 4. Report `(scanned, total)` after every file, kept or not.
//! 5. Persist the cache once, then return the [`ScanSummary`].
//!
//! Nothing in a scan is fatal. Probe failures become sentinel values, a
//! missing root yields an empty result, and a failed persist is logged.
//!
//! # Parallel probing
//!
//! With `probe_threads > 1` files are resolved on a rayon pool. Results are
//! still returned in walk order, and progress counts are issued under a lock
//! so they stay strictly increasing by one.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rayon::prelude::*;

use super::path_utils::{normalize_path, path_key};
use super::probe::{probe_entry, DimensionProbe, DurationProbe, FfprobeProber};
use super::walker::{VideoWalker, WalkerConfig};
use super::{ScanRequest, ScanSummary};
use crate::cache::{mtime_seconds, CacheEntry, MediaInfoCache};
use crate::progress::ScanProgress;

/// Configuration for a [`FolderScanner`].
#[derive(Clone)]
pub struct ScannerConfig {
    /// Which files the walk picks up.
    pub walker: WalkerConfig,
    /// Number of worker threads for probing. 1 means strictly sequential.
    pub probe_threads: usize,
    /// Optional shutdown flag for cooperative cancellation.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ScanProgress>>,
}

impl fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("walker", &self.walker)
            .field("probe_threads", &self.probe_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            probe_threads: 1,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ScannerConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Set the number of probe threads (at least 1).
    #[must_use]
    pub fn with_probe_threads(mut self, threads: usize) -> Self {
        self.probe_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ScanProgress>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// What happened to one file.
enum FileOutcome {
    /// File vanished or its metadata was unreadable.
    Unreadable,
    /// Cached entry reused.
    Hit { path: PathBuf, entry: CacheEntry },
    /// Freshly probed.
    Probed {
        path: PathBuf,
        key: String,
        entry: CacheEntry,
        failed: bool,
    },
    /// Skipped because shutdown was requested.
    Cancelled,
}

/// Produces filtered video lists, keeping a [`MediaInfoCache`] up to date.
#[derive(Clone)]
pub struct FolderScanner {
    duration_probe: Arc<dyn DurationProbe>,
    dimension_probe: Arc<dyn DimensionProbe>,
    config: ScannerConfig,
}

impl fmt::Debug for FolderScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderScanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FolderScanner {
    /// Create a scanner with explicit probing collaborators.
    #[must_use]
    pub fn new(
        duration_probe: Arc<dyn DurationProbe>,
        dimension_probe: Arc<dyn DimensionProbe>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            duration_probe,
            dimension_probe,
            config,
        }
    }

    /// Create a scanner that probes with the given `ffprobe` executable.
    #[must_use]
    pub fn with_ffprobe(binary: impl Into<PathBuf>, config: ScannerConfig) -> Self {
        let prober = Arc::new(FfprobeProber::new(binary));
        Self::new(prober.clone(), prober, config)
    }

    /// The scanner's configuration.
    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Replace the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ScanProgress>) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Replace the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.shutdown_flag = Some(flag);
        self
    }

    /// Scan `request.root` and return the videos passing the request's
    /// filters, updating and then persisting `cache`.
    pub fn scan(&self, request: &ScanRequest, cache: &mut MediaInfoCache) -> ScanSummary {
        let start = Instant::now();
        log::info!(
            "Scanning {} (orientation: {}, max length: {}s, force reload: {})",
            request.root.display(),
            request.orientation,
            request.max_length_secs,
            request.force_reload
        );

        let mut walker = VideoWalker::new(&request.root, self.config.walker.clone());
        if let Some(flag) = &self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let files = match walker.collect() {
            Ok(files) => files,
            Err(e) => {
                log::warn!("No videos found: {}", e);
                return ScanSummary {
                    interrupted: self.config.is_shutdown_requested(),
                    duration: start.elapsed(),
                    ..ScanSummary::default()
                };
            }
        };

        let total = files.len();
        let mut summary = ScanSummary {
            total_files: total,
            ..ScanSummary::default()
        };
        if let Some(cb) = &self.config.progress_callback {
            cb.on_scan_start(&request.root, total);
        }

        if self.config.probe_threads > 1 && total > 1 {
            self.scan_parallel(&files, request, cache, &mut summary);
        } else {
            self.scan_sequential(&files, request, cache, &mut summary);
        }
        summary.interrupted |= self.config.is_shutdown_requested();

        if let Err(e) = cache.persist() {
            log::warn!("Failed to save media info cache: {}", e);
        }

        summary.duration = start.elapsed();
        log::info!(
            "Found {} of {} videos in {:.2?} ({} cached, {} probed, {} probe failures){}",
            summary.videos.len(),
            total,
            summary.duration,
            summary.cache_hits,
            summary.probed_files,
            summary.probe_failures,
            if summary.interrupted {
                ", interrupted"
            } else {
                ""
            }
        );
        if let Some(cb) = &self.config.progress_callback {
            cb.on_scan_end(&summary);
        }
        summary
    }

    /// Invalidate every cache entry under `request.root`, persist, then run a
    /// forced scan.
    pub fn reload(&self, request: &ScanRequest, cache: &mut MediaInfoCache) -> ScanSummary {
        let removed = cache.remove_prefix(&request.root);
        log::info!(
            "Reloading {}: dropped {} cached entries",
            request.root.display(),
            removed
        );
        if let Err(e) = cache.persist() {
            log::warn!("Failed to save media info cache: {}", e);
        }
        let forced = request.clone().with_force_reload(true);
        self.scan(&forced, cache)
    }

    fn scan_sequential(
        &self,
        files: &[PathBuf],
        request: &ScanRequest,
        cache: &mut MediaInfoCache,
        summary: &mut ScanSummary,
    ) {
        let total = files.len();
        for (i, file) in files.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                summary.interrupted = true;
                break;
            }
            let outcome = self.resolve(file, cache, request.force_reload);
            apply_outcome(outcome, request, cache, summary);
            self.report(i + 1, total, file);
        }
    }

    fn scan_parallel(
        &self,
        files: &[PathBuf],
        request: &ScanRequest,
        cache: &mut MediaInfoCache,
        summary: &mut ScanSummary,
    ) {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.probe_threads)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Cannot build probe pool, probing sequentially: {}", e);
                self.scan_sequential(files, request, cache, summary);
                return;
            }
        };

        let total = files.len();
        let scanned = Mutex::new(0usize);
        let snapshot: &MediaInfoCache = cache;

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    if self.config.is_shutdown_requested() {
                        return FileOutcome::Cancelled;
                    }
                    let outcome = self.resolve(file, snapshot, request.force_reload);
                    if let Ok(mut count) = scanned.lock() {
                        *count += 1;
                        self.report(*count, total, file);
                    }
                    outcome
                })
                .collect()
        });

        for outcome in outcomes {
            apply_outcome(outcome, request, cache, summary);
        }
    }

    fn report(&self, scanned: usize, total: usize, path: &Path) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_file_scanned(scanned, total, path);
        }
    }

    /// Decide whether the cached entry for `file` can be reused, probing it
    /// otherwise. Never mutates the cache.
    fn resolve(&self, file: &Path, cache: &MediaInfoCache, force_reload: bool) -> FileOutcome {
        let path = normalize_path(file);
        let key = path_key(&path);

        let mtime = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => mtime_seconds(t),
            Err(e) => {
                log::warn!("Cannot read modification time of {}: {}", path.display(), e);
                return FileOutcome::Unreadable;
            }
        };

        if !force_reload {
            if let Some(entry) = cache.lookup(&key) {
                if entry.is_fresh(mtime) {
                    log::trace!("Cache hit: {}", path.display());
                    return FileOutcome::Hit {
                        path,
                        entry: *entry,
                    };
                }
                log::trace!("Cache stale: {}", path.display());
            } else {
                log::trace!("Cache miss: {}", path.display());
            }
        }

        let (entry, failed) = probe_entry(
            self.duration_probe.as_ref(),
            self.dimension_probe.as_ref(),
            &path,
            mtime,
        );
        FileOutcome::Probed {
            path,
            key,
            entry,
            failed,
        }
    }
}

/// Record an outcome in the cache and summary, keeping the file if it
/// passes the filters.
fn apply_outcome(
    outcome: FileOutcome,
    request: &ScanRequest,
    cache: &mut MediaInfoCache,
    summary: &mut ScanSummary,
) {
    let (path, entry) = match outcome {
        FileOutcome::Cancelled => {
            summary.interrupted = true;
            return;
        }
        FileOutcome::Unreadable => {
            summary.scanned_files += 1;
            return;
        }
        FileOutcome::Hit { path, entry } => {
            summary.cache_hits += 1;
            (path, entry)
        }
        FileOutcome::Probed {
            path,
            key,
            entry,
            failed,
        } => {
            summary.probed_files += 1;
            if failed {
                summary.probe_failures += 1;
            }
            cache.upsert(key, entry);
            (path, entry)
        }
    };

    summary.scanned_files += 1;
    if request.accepts(&entry) {
        summary.videos.push(path);
    }
}
