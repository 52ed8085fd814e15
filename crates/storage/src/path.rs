//! Relative path validation.
//!
//! Sidecar records store paths relative to the owning media item's root
//! directory. Those paths come from a database that anything could have
//! written to, so they are validated before being joined onto a real
//! directory and handed to a [`Disk`](crate::Disk).

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a path relative to some root.
///
/// Rejects anything that would escape the root (leading `..`, absolute
/// prefixes on Windows), null bytes, and paths that normalize to nothing.
/// Leading `/` and `.` components are dropped, so `"/Season 1/a.srt"` is
/// treated as relative.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sidecar_storage::validate_path;
/// assert!(validate_path("Season 01/Show - S01E01.en.srt").is_ok());
/// assert!(validate_path("extras/../poster.jpg").is_ok()); // (never leaves root)
/// assert!(validate_path("../poster.jpg").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("./Season 01//./extras/../Show.nfo").unwrap(),
///     Path::new("Season 01/Show.nfo")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Join a stored relative path onto an absolute root directory.
///
/// The relative part is [validated](validate) first, so the result is always
/// inside `root`.
///
/// ```
/// use std::path::Path;
/// use sidecar_storage::resolve_path;
/// let path = resolve_path("/tv/Show", "Season 01/Show - S01E01.en.srt").unwrap();
/// assert_eq!(path, Path::new("/tv/Show/Season 01/Show - S01E01.en.srt"));
/// assert!(resolve_path("relative/root", "a.srt").is_err());
/// assert!(resolve_path("/tv/Show", "../Other/a.srt").is_err());
/// ```
pub fn resolve(root: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    if !root.is_absolute() {
        exn::bail!(ErrorKind::InvalidPath(root.to_path_buf()));
    }
    Ok(root.join(validate(relative)?))
}
