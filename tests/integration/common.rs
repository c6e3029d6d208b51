//! Shared fixtures: an in-memory prober, a progress recorder, and helpers
//! for building video folders.

#![allow(dead_code)]

use randvid::progress::ScanProgress;
use randvid::scanner::{
    DimensionProbe, DurationProbe, FolderScanner, ProbeError, ScanSummary, ScannerConfig,
};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Serializes tests that read or write `RANDVID_*` environment variables.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// Prober answering from a table keyed by file name.
///
/// Files missing from the table fail both probes.
#[derive(Default)]
pub struct FakeProber {
    media: Mutex<HashMap<String, (f64, (u32, u32))>>,
    duration_calls: AtomicUsize,
    dimension_calls: AtomicUsize,
    probed: Mutex<Vec<String>>,
}

impl FakeProber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, name: &str, duration: f64, dims: (u32, u32)) {
        self.media
            .lock()
            .unwrap()
            .insert(name.to_string(), (duration, dims));
    }

    pub fn duration_calls(&self) -> usize {
        self.duration_calls.load(Ordering::SeqCst)
    }

    pub fn dimension_calls(&self) -> usize {
        self.dimension_calls.load(Ordering::SeqCst)
    }

    /// File names passed to the duration probe, in call order.
    pub fn probed_names(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    pub fn reset_counts(&self) {
        self.duration_calls.store(0, Ordering::SeqCst);
        self.dimension_calls.store(0, Ordering::SeqCst);
        self.probed.lock().unwrap().clear();
    }

    fn lookup(&self, path: &Path) -> Option<(f64, (u32, u32))> {
        let name = path.file_name()?.to_str()?;
        self.media.lock().unwrap().get(name).copied()
    }
}

impl DurationProbe for FakeProber {
    fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        self.duration_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(name) = path.file_name() {
            self.probed
                .lock()
                .unwrap()
                .push(name.to_string_lossy().into_owned());
        }
        self.lookup(path).map(|m| m.0).ok_or(ProbeError::Failed {
            path: path.to_path_buf(),
            status: Some(1),
        })
    }
}

impl DimensionProbe for FakeProber {
    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError> {
        self.dimension_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(path).map(|m| m.1).ok_or(ProbeError::Failed {
            path: path.to_path_buf(),
            status: Some(1),
        })
    }
}

/// Records every progress callback.
#[derive(Default)]
pub struct RecordingProgress {
    pub started: Mutex<Option<usize>>,
    pub events: Mutex<Vec<(usize, usize)>>,
    pub ended: AtomicUsize,
}

impl RecordingProgress {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(usize, usize)> {
        self.events.lock().unwrap().clone()
    }
}

impl ScanProgress for RecordingProgress {
    fn on_scan_start(&self, _folder: &Path, total: usize) {
        *self.started.lock().unwrap() = Some(total);
    }

    fn on_file_scanned(&self, scanned: usize, total: usize, _path: &Path) {
        self.events.lock().unwrap().push((scanned, total));
    }

    fn on_scan_end(&self, _summary: &ScanSummary) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

/// Create a file (and its parent directories) with some bytes in it.
pub fn touch(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path)
        .unwrap()
        .write_all(b"not really a video")
        .unwrap();
    path
}

pub fn scanner_with(prober: &Arc<FakeProber>, config: ScannerConfig) -> FolderScanner {
    FolderScanner::new(prober.clone(), prober.clone(), config)
}

pub fn scanner(prober: &Arc<FakeProber>) -> FolderScanner {
    scanner_with(prober, ScannerConfig::default())
}

pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

/// The three-file folder used throughout: A (vertical, 10s),
/// B (horizontal, 40s), C (vertical, 50s).
pub fn abc_folder(root: &Path) -> Arc<FakeProber> {
    let prober = FakeProber::new();
    prober.set("a.mp4", 10.0, (1080, 1920));
    prober.set("b.mp4", 40.0, (1920, 1080));
    prober.set("c.mp4", 50.0, (720, 1280));
    touch(root, "a.mp4");
    touch(root, "b.mp4");
    touch(root, "c.mp4");
    prober
}
