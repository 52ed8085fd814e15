//! Disk trait and implementations.
//!
//! The [`Disk`] trait is the small slice of filesystem access the sidecar
//! lifecycle needs: an existence check, deletion, and moving a file
//! somewhere else (for the recycle bin).

mod local;
#[cfg(feature = "mock")]
mod mock;
mod ro;

pub use self::local::LocalDisk;
#[cfg(feature = "mock")]
pub use self::mock::{MockDisk, Operation};
pub use self::ro::ReadOnlyDisk;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Filesystem operations on absolute paths.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sidecar_storage::{Disk, error::Result};
///
/// async fn remove_if_present(disk: &dyn Disk, path: &Path) -> Result<bool> {
///     if !disk.exists(path).await? {
///         return Ok(false);
///     }
///     disk.delete(path).await?;
///     Ok(true)
/// }
/// ```
#[async_trait]
pub trait Disk: Send + Sync {
    /// Name of the disk implementation (used for logging only).
    fn name(&self) -> &str;

    /// Check if a file exists.
    ///
    /// A missing file is `Ok(false)`, never an error. Only genuine I/O
    /// faults (permissions, broken mounts) are returned as errors.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Move a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the source
    /// file does not exist.
    ///
    /// # Notes
    /// - Implementations should create parent directories of the destination.
    /// - If the destination already exists, it will be overwritten.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;
}
