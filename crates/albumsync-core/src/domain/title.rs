//! Title derivation rules
//!
//! Album titles come from directory names, media titles from paths relative
//! to the album directory. Both rules are pure string logic shared by the
//! reconciler and the run driver.

use std::path::Path;

/// Derives the remote album title from a local directory name.
///
/// A leading `[YYYY-MM-DD] ` date prefix is a local ordering convention and
/// is stripped from the remote title.
#[must_use]
pub fn album_title(dir_name: &str) -> &str {
    let bytes = dir_name.as_bytes();
    let is_prefixed = bytes.len() > 13
        && bytes[0] == b'['
        && bytes[1..5].iter().all(u8::is_ascii_digit)
        && bytes[5] == b'-'
        && bytes[6..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'-'
        && bytes[9..11].iter().all(u8::is_ascii_digit)
        && bytes[11] == b']'
        && bytes[12] == b' ';
    if is_prefixed {
        &dir_name[13..]
    } else {
        dir_name
    }
}

/// Derives the remote display title for a media file.
///
/// The title is the path relative to the album directory with path
/// separators replaced by `_`, so nested files keep a unique, readable
/// remote name. Files outside the album directory fall back to their full
/// path.
#[must_use]
pub fn media_title(path: &Path, album_dir: &Path) -> String {
    let relative = path.strip_prefix(album_dir).unwrap_or(path);
    relative
        .to_string_lossy()
        .replace(['/', '\\'], "_")
}
