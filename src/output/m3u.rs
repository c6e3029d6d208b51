//! Extended M3U playlist output.
//!
//! ```text
//! #EXTM3U
//! #EXTINF:10,a.mp4
//! /home/user/Videos/a.mp4
//! #EXTINF:-1,broken.mkv
//! /home/user/Videos/broken.mkv
//! ```
//!
//! Durations come from the cache and are rounded to whole seconds; files
//! that could not be probed get `-1`, the M3U convention for unknown length.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::cache::MediaInfoCache;

/// One playlist line pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct M3uEntry {
    /// Length in whole seconds, -1 if unknown
    pub duration: i64,
    /// Display title (file name)
    pub title: String,
    /// Location
    pub path: PathBuf,
}

/// M3U playlist writer.
#[derive(Debug, Clone, Default)]
pub struct M3uOutput {
    entries: Vec<M3uEntry>,
}

impl M3uOutput {
    /// Build a playlist for `videos`, in the given order.
    #[must_use]
    pub fn new(videos: &[impl AsRef<Path>], cache: &MediaInfoCache) -> Self {
        let entries = videos
            .iter()
            .map(|p| {
                let path = p.as_ref();
                let duration = cache
                    .lookup_path(path)
                    .filter(|e| !e.is_unprobed())
                    .map_or(-1, |e| e.duration_seconds.round() as i64);
                let title = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                M3uEntry {
                    duration,
                    title,
                    path: path.to_path_buf(),
                }
            })
            .collect();
        Self { entries }
    }

    /// Playlist entries.
    #[must_use]
    pub fn entries(&self) -> &[M3uEntry] {
        &self.entries
    }

    /// Write the playlist.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "#EXTM3U")?;
        for entry in &self.entries {
            writeln!(writer, "#EXTINF:{},{}", entry.duration, entry.title)?;
            writeln!(writer, "{}", entry.path.display())?;
        }
        Ok(())
    }

    /// Render the playlist to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
