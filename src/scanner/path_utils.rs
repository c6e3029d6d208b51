//! Path normalization for cache keys.
//!
//! A cache key must be identical every time the same file is scanned, no
//! matter which relative path, `.`/`..` segments or Unicode normalization
//! form the walk happened to produce.
//!
//! Two forms are produced:
//!
//! - [`normalize_path`]: absolute and lexically cleaned. This is still a real,
//!   openable path and is what scan results hand back to the caller.
//! - [`path_key`]: the normalized path additionally folded to Unicode NFC.
//!   macOS reports names in NFD while Windows and Linux usually store NFC,
//!   so only the key is folded; opening an NFC spelling of an NFD name fails
//!   on Linux.
//!
//! Keys are JSON strings, so a name that is not valid Unicode is spelled
//! with escapes instead of replacement characters. Each stray byte becomes
//! `U+FFFD`, two hex digits, `U+FFFD`; a literal `U+FFFD` is doubled. Two
//! different names therefore never share a key.
//!
//! # Example
//!
//! ```
//! use randvid::scanner::path_utils::{is_within, path_key};
//! use std::path::Path;
//!
//! let nfc = Path::new("/videos/café.mp4");
//! let nfd = Path::new("/videos/./cafe\u{0301}.mp4");
//! assert_eq!(path_key(nfc), path_key(nfd));
//! assert!(is_within(&path_key(nfd), &path_key(Path::new("/videos"))));
//! ```

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

const ESCAPE: char = '\u{FFFD}';

/// Normalize a string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Remove `.` segments and resolve `..` segments without touching the
/// filesystem.
///
/// Symlinks are not resolved, matching what the user sees in the folder
/// they picked. A `..` that would climb above the root is dropped.
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Make a path absolute (relative to the current directory) and lexically
/// normalize it.
///
/// This is the form returned in scan results.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|e| {
        log::debug!("Cannot make {} absolute: {}", path.display(), e);
        path.to_path_buf()
    });
    lexical_normalize(&absolute)
}

/// Build the cache key for a path: absolute, lexically normalized, NFC.
#[must_use]
pub fn path_key(path: &Path) -> String {
    normalize_path_str(&escape_os_str(normalize_path(path).as_os_str()))
}

/// Whether the cache key `key` names `folder_key` or something inside it.
///
/// Comparison is component by component, so `/videos` does not contain
/// `/videos2/clip.mp4`. `key` is re-normalized first in case the cache file
/// was edited by hand.
#[must_use]
pub fn is_within(key: &str, folder_key: &str) -> bool {
    let key = normalize_path_str(&lexical_normalize(Path::new(key)).to_string_lossy());
    Path::new(&key).starts_with(folder_key)
}

fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        out.push(c);
        if c == ESCAPE {
            out.push(ESCAPE);
        }
    }
}

fn push_raw(out: &mut String, hex: &str) {
    out.push(ESCAPE);
    out.push_str(hex);
    out.push(ESCAPE);
}

#[cfg(unix)]
fn escape_os_str(s: &OsStr) -> String {
    use std::os::unix::ffi::OsStrExt;

    if let Some(text) = s.to_str() {
        if !text.contains(ESCAPE) {
            return text.to_string();
        }
    }
    let mut out = String::with_capacity(s.len());
    for chunk in s.as_bytes().utf8_chunks() {
        push_text(&mut out, chunk.valid());
        for byte in chunk.invalid() {
            push_raw(&mut out, &format!("{byte:02X}"));
        }
    }
    out
}

#[cfg(windows)]
fn escape_os_str(s: &OsStr) -> String {
    use std::os::windows::ffi::OsStrExt;

    let mut out = String::with_capacity(s.len());
    for unit in char::decode_utf16(s.encode_wide()) {
        match unit {
            Ok(c) => push_text(&mut out, c.encode_utf8(&mut [0; 4])),
            Err(e) => push_raw(&mut out, &format!("{:04X}", e.unpaired_surrogate())),
        }
    }
    out
}

#[cfg(not(any(unix, windows)))]
fn escape_os_str(s: &OsStr) -> String {
    let mut out = String::with_capacity(s.len());
    push_text(&mut out, &s.to_string_lossy());
    out
}
