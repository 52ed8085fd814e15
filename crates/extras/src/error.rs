//! Extras Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extras error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extras operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a lifecycle failure.
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Disk`]
///
/// ### Contract Violations
/// - [`ErrorKind::MediaItemNotFound`]
/// - [`ErrorKind::InvalidPath`]
///
/// ### Dispatch Errors
/// - [`ErrorKind::Dispatch`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A read or write via the [`ExtraFileRepository`](sidecar_cache::ExtraFileRepository) failed.
    #[display("extra file index error")]
    Storage,
    /// The owning media item of a deleted media file could not be resolved.
    #[display("media item not found: {_0}")]
    MediaItemNotFound(#[error(not(source))] u64),
    /// An existence check or deletion sink failed.
    #[display("disk error")]
    Disk,
    /// A stored relative path could not be resolved inside its media item.
    #[display("invalid extra file path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// One or more event handlers failed; the first failure is the source.
    #[display("{_0} event handler(s) failed")]
    Dispatch(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Disk)
    }
}
