//! Application configuration.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the per-user config directory (or `--config PATH`)
//! 3. `RANDVID_*` environment variables (`__` separates nested keys)
//! 4. command-line flags
//!
//! ```toml
//! ffprobe_path = "/usr/local/bin/ffprobe"
//! probe_threads = 4
//! orientation = "vertical"
//! max_length = 60
//! extensions = ["mp4", "mkv", "webm"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::{default_cache_path, MediaInfoCache};
use crate::cli::ScanArgs;
use crate::scanner::{
    FfprobeProber, OrientationFilter, ScannerConfig, WalkerConfig, DEFAULT_VIDEO_EXTENSIONS,
};
use crate::scanner::probe::FFPROBE_EXECUTABLE_NAME;

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "RANDVID_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media info cache file; the per-user data directory when unset.
    pub cache_path: Option<PathBuf>,
    /// ffprobe executable.
    pub ffprobe_path: PathBuf,
    /// Files probed in parallel. 1 keeps probing sequential.
    pub probe_threads: usize,
    /// Default orientation filter.
    pub orientation: OrientationFilter,
    /// Default maximum length in seconds (0 = unlimited).
    pub max_length: u64,
    /// Recognized video extensions.
    pub extensions: Vec<String>,
    /// Follow symbolic links during the walk.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Write the cache through a temporary file and rename.
    pub atomic_persist: bool,
    /// Folder scanned when none is given on the command line.
    pub home_folder: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: None,
            ffprobe_path: PathBuf::from(FFPROBE_EXECUTABLE_NAME),
            probe_threads: 1,
            orientation: OrientationFilter::Both,
            max_length: 0,
            extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            follow_symlinks: false,
            skip_hidden: false,
            atomic_persist: true,
            home_folder: None,
        }
    }
}

impl Config {
    /// Default per-user location of `config.toml`.
    ///
    /// # Errors
    ///
    /// Fails if the platform has no home directory to derive it from.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "randvid", "randvid")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Build the figment for a given config file: defaults, file, environment.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the configuration, falling back to defaults on any error.
    ///
    /// `path` overrides the default `config.toml` location.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::config_path() {
                Ok(p) => p,
                Err(e) => {
                    log::debug!("No config location, using defaults: {}", e);
                    return Self::default();
                }
            },
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from a specific file, reporting errors.
    ///
    /// A missing file contributes nothing; environment overrides still apply.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, mistyped values, or an empty extension list.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Self = Self::figment(path)
            .extract()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.validate()?;
        log::debug!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Fails if no video extension is configured.
    pub fn validate(&self) -> Result<()> {
        if self.walker_config().extensions.is_empty() {
            anyhow::bail!("At least one video extension must be configured");
        }
        Ok(())
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or the file written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line overrides from `scan`/`reload`.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if let Some(orientation) = args.orientation {
            self.orientation = orientation;
        }
        if let Some(max_length) = args.max_length {
            self.max_length = max_length;
        }
        if let Some(cache) = &args.cache {
            self.cache_path = Some(cache.clone());
        }
        if let Some(ffprobe) = &args.ffprobe {
            self.ffprobe_path = ffprobe.clone();
        }
        if let Some(threads) = args.probe_threads {
            self.probe_threads = threads;
        }
        if !args.extensions.is_empty() {
            self.extensions = args.extensions.clone();
        }
        self.follow_symlinks |= args.follow_symlinks;
        self.skip_hidden |= args.skip_hidden;
    }

    /// The cache file to use.
    ///
    /// # Errors
    ///
    /// Fails only when no path is configured and the platform default is
    /// unavailable.
    pub fn cache_file(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => default_cache_path(),
        }
    }

    /// Load the configured cache.
    ///
    /// # Errors
    ///
    /// See [`Config::cache_file`].
    pub fn open_cache(&self) -> Result<MediaInfoCache> {
        let path = self.cache_file()?;
        Ok(MediaInfoCache::load(path).with_atomic_persist(self.atomic_persist))
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
            ..WalkerConfig::default()
        }
        .with_extensions(&self.extensions)
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .with_walker(self.walker_config())
            .with_probe_threads(self.probe_threads)
    }

    /// The prober for the configured ffprobe executable.
    #[must_use]
    pub fn prober(&self) -> FfprobeProber {
        FfprobeProber::new(&self.ffprobe_path)
    }
}
