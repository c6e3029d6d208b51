//! Playback queue built from a scan result.
//!
//! Scans return videos in walk order; [`Playlist`] shuffles them and walks
//! the shuffled order with wrap-around in both directions. [`FilterSettings`]
//! tracks filter changes made while a playlist is playing, so the caller
//! knows when the current list is out of date and a rescan is due.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::scanner::{OrientationFilter, ScanRequest};

/// Shuffled, wrapping playback order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    videos: Vec<PathBuf>,
    position: Option<usize>,
}

impl Playlist {
    /// Keep `videos` in the given order.
    #[must_use]
    pub fn new(videos: Vec<PathBuf>) -> Self {
        Self {
            videos,
            position: None,
        }
    }

    /// Shuffle `videos` with `rng`.
    ///
    /// ```
    /// use rand::SeedableRng;
    /// use randvid::playlist::Playlist;
    /// use std::path::PathBuf;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    /// let videos = vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")];
    /// let playlist = Playlist::shuffled(videos, &mut rng);
    /// assert_eq!(playlist.len(), 2);
    /// ```
    #[must_use]
    pub fn shuffled<R: Rng + ?Sized>(mut videos: Vec<PathBuf>, rng: &mut R) -> Self {
        videos.shuffle(rng);
        Self::new(videos)
    }

    /// Shuffle `videos` with the thread-local generator.
    #[must_use]
    pub fn shuffled_random(videos: Vec<PathBuf>) -> Self {
        Self::shuffled(videos, &mut rand::thread_rng())
    }

    /// Reshuffle in place and rewind.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.videos.shuffle(rng);
        self.position = None;
    }

    /// Number of videos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    /// Whether there is nothing to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Videos in playback order.
    #[must_use]
    pub fn videos(&self) -> &[PathBuf] {
        &self.videos
    }

    /// Index of the current video, if playback has started.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Jump to the first video.
    pub fn start(&mut self) -> Option<&Path> {
        self.position = (!self.videos.is_empty()).then_some(0);
        self.current()
    }

    /// The video being played.
    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.position
            .and_then(|i| self.videos.get(i))
            .map(PathBuf::as_path)
    }

    /// Move to the next video, wrapping to the first after the last.
    pub fn advance(&mut self) -> Option<&Path> {
        let len = self.videos.len();
        if len == 0 {
            return None;
        }
        self.position = Some(self.position.map_or(0, |i| (i + 1) % len));
        self.current()
    }

    /// Move to the previous video, wrapping to the last before the first.
    pub fn retreat(&mut self) -> Option<&Path> {
        let len = self.videos.len();
        if len == 0 {
            return None;
        }
        self.position = Some(self.position.map_or(len - 1, |i| (i + len - 1) % len));
        self.current()
    }
}

/// Orientation and length filters of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    /// Orientation filter
    pub orientation: OrientationFilter,
    /// Maximum length in seconds (0 = unlimited)
    pub max_length_secs: u64,
}

/// Filters the current playlist was built with, and the ones the user has
/// chosen since.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSettings {
    applied: Filters,
    pending: Filters,
}

impl FilterSettings {
    /// Start with `filters` both applied and pending.
    #[must_use]
    pub fn new(filters: Filters) -> Self {
        Self {
            applied: filters,
            pending: filters,
        }
    }

    /// Choose a new orientation filter for the next scan.
    pub fn set_orientation(&mut self, orientation: OrientationFilter) {
        self.pending.orientation = orientation;
    }

    /// Choose a new maximum length for the next scan.
    pub fn set_max_length(&mut self, secs: u64) {
        self.pending.max_length_secs = secs;
    }

    /// Filters of the current playlist.
    #[must_use]
    pub fn applied(&self) -> Filters {
        self.applied
    }

    /// Filters the next scan will use.
    #[must_use]
    pub fn pending(&self) -> Filters {
        self.pending
    }

    /// Whether the pending filters differ from the applied ones.
    #[must_use]
    pub fn needs_rescan(&self) -> bool {
        self.applied != self.pending
    }

    /// Mark the pending filters as applied.
    pub fn commit(&mut self) -> Filters {
        self.applied = self.pending;
        self.applied
    }

    /// A scan request for `folder` using the pending filters.
    #[must_use]
    pub fn request_for(&self, folder: impl Into<PathBuf>) -> ScanRequest {
        ScanRequest::new(folder)
            .with_orientation(self.pending.orientation)
            .with_max_length(self.pending.max_length_secs)
    }
}
