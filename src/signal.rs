//! Ctrl+C handling for interruptible scans.
//!
//! A single [`ShutdownHandler`] wraps an `Arc<AtomicBool>`. The flag is
//! handed to the scanner and walker, which stop at the next file boundary
//! once it is set. The partially updated cache is still persisted.
//!
//! ```rust,no_run
//! use randvid::signal::install_handler;
//! use randvid::scanner::ScannerConfig;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = ScannerConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code after an interrupted scan (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was received or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag manually.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag, for passing to [`ScannerConfig`](crate::scanner::ScannerConfig)
    /// or a [`ScanWorker`](crate::worker::ScanWorker).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// The hook can only be registered once per process. Later calls (for
/// instance from several `run_app` tests) get the same handler back with
/// its flag cleared. If another library already owns the hook, an unhooked
/// handler is returned that still honours `request_shutdown`.
///
/// # Errors
///
/// Currently always succeeds; the `Result` is kept so callers can treat
/// installation as fallible.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Saving cache...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler);
        }
        Err(e) => {
            log::debug!("Ctrl+C hook unavailable ({}), using unhooked handler", e);
            let _ = GLOBAL_HANDLER.set(ShutdownHandler::new());
        }
    }

    let handler = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
    handler.reset();
    Ok(handler.clone())
}
