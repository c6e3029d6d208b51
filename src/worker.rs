//! Background scan worker.
//!
//! A scan walks the tree and runs external processes for every uncached
//! file, so interactive callers run it off their own thread.
//! [`ScanWorker::spawn`] moves the scanner and the cache onto a dedicated
//! thread and hands back a [`ScanHandle`]. The handle exposes a channel of
//! [`ScanEvent`]s: zero or more `Progress` events with strictly increasing
//! counts, then exactly one `Finished`.
//!
//! The cache is owned by the worker for the lifetime of the scan and
//! returned by [`ScanHandle::wait`]. Only one scan should use a given cache
//! file at a time; callers serialize scans themselves.
//!
//! ```rust,no_run
//! use randvid::cache::MediaInfoCache;
//! use randvid::scanner::{FolderScanner, ScanRequest, ScannerConfig};
//! use randvid::worker::{ScanEvent, ScanWorker};
//!
//! let scanner = FolderScanner::with_ffprobe("ffprobe", ScannerConfig::default());
//! let cache = MediaInfoCache::load("/tmp/media_info_cache.json");
//! let handle = ScanWorker::spawn(scanner, cache, ScanRequest::new("/videos")).unwrap();
//!
//! for event in handle.events().iter() {
//!     match event {
//!         ScanEvent::Progress { scanned, total } => println!("{scanned}/{total}"),
//!         ScanEvent::Finished(summary) => println!("{} videos", summary.videos.len()),
//!     }
//! }
//! let (summary, cache) = handle.wait().unwrap();
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use thiserror::Error;

use crate::cache::MediaInfoCache;
use crate::progress::ScanProgress;
use crate::scanner::{FolderScanner, ScanRequest, ScanSummary};

/// Message sent from the worker to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// One more file has been processed.
    Progress {
        /// Files processed so far (1-based)
        scanned: usize,
        /// Files found under the root
        total: usize,
    },
    /// The scan is over. Always the last event.
    Finished(ScanSummary),
}

/// Errors from running a scan on a worker thread.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The OS refused to create the thread.
    #[error("failed to spawn scan worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker thread panicked.
    #[error("scan worker panicked")]
    Panicked,
}

/// Forwards per-file progress into the event channel, then to any callback
/// the scanner already had.
struct ChannelProgress {
    tx: Sender<ScanEvent>,
    inner: Option<Arc<dyn ScanProgress>>,
}

impl ScanProgress for ChannelProgress {
    fn on_scan_start(&self, folder: &Path, total: usize) {
        if let Some(inner) = &self.inner {
            inner.on_scan_start(folder, total);
        }
    }

    fn on_file_scanned(&self, scanned: usize, total: usize, path: &Path) {
        // The receiver may already be gone; the scan still completes.
        let _ = self.tx.send(ScanEvent::Progress { scanned, total });
        if let Some(inner) = &self.inner {
            inner.on_file_scanned(scanned, total, path);
        }
    }

    fn on_scan_end(&self, summary: &ScanSummary) {
        if let Some(inner) = &self.inner {
            inner.on_scan_end(summary);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Scan,
    Reload,
}

/// Launches scans on a background thread.
pub struct ScanWorker;

impl ScanWorker {
    /// Run [`FolderScanner::scan`] on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] if the thread cannot be created.
    pub fn spawn(
        scanner: FolderScanner,
        cache: MediaInfoCache,
        request: ScanRequest,
    ) -> Result<ScanHandle, WorkerError> {
        Self::start(scanner, cache, request, Mode::Scan)
    }

    /// Run [`FolderScanner::reload`] on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] if the thread cannot be created.
    pub fn spawn_reload(
        scanner: FolderScanner,
        cache: MediaInfoCache,
        request: ScanRequest,
    ) -> Result<ScanHandle, WorkerError> {
        Self::start(scanner, cache, request, Mode::Reload)
    }

    fn start(
        scanner: FolderScanner,
        mut cache: MediaInfoCache,
        request: ScanRequest,
        mode: Mode,
    ) -> Result<ScanHandle, WorkerError> {
        let (tx, rx) = unbounded();

        let cancel = scanner
            .config()
            .shutdown_flag
            .clone()
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        let progress = Arc::new(ChannelProgress {
            tx: tx.clone(),
            inner: scanner.config().progress_callback.clone(),
        });
        let scanner = scanner
            .with_shutdown_flag(Arc::clone(&cancel))
            .with_progress_callback(progress);

        let thread = thread::Builder::new()
            .name("randvid-scan".to_string())
            .spawn(move || {
                log::debug!("Scan worker started ({:?})", mode);
                let summary = match mode {
                    Mode::Scan => scanner.scan(&request, &mut cache),
                    Mode::Reload => scanner.reload(&request, &mut cache),
                };
                let _ = tx.send(ScanEvent::Finished(summary.clone()));
                (summary, cache)
            })
            .map_err(WorkerError::Spawn)?;

        Ok(ScanHandle {
            events: rx,
            cancel,
            thread,
        })
    }
}

/// Handle to a running scan.
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<(ScanSummary, MediaInfoCache)>,
}

impl ScanHandle {
    /// Event stream. Disconnects after `Finished`.
    #[must_use]
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    /// Ask the scan to stop before its next file.
    ///
    /// The cache is still persisted and the summary is flagged interrupted.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// The flag [`cancel`](Self::cancel) sets.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Block until the scan is done and take back the summary and cache.
    ///
    /// Undelivered events are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] if the worker panicked.
    pub fn wait(self) -> Result<(ScanSummary, MediaInfoCache), WorkerError> {
        self.thread.join().map_err(|_| WorkerError::Panicked)
    }

    /// Like [`wait`](Self::wait), calling `on_progress(scanned, total)` for
    /// each progress event as it arrives.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] if the worker panicked.
    pub fn wait_with_progress<F>(
        self,
        mut on_progress: F,
    ) -> Result<(ScanSummary, MediaInfoCache), WorkerError>
    where
        F: FnMut(usize, usize),
    {
        for event in self.events.iter() {
            match event {
                ScanEvent::Progress { scanned, total } => on_progress(scanned, total),
                ScanEvent::Finished(_) => break,
            }
        }
        self.wait()
    }
}
