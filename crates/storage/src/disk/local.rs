//! Local filesystem disk.
//!
//! Plain `tokio::fs` calls, with I/O errors mapped onto
//! [`ErrorKind`](crate::error::ErrorKind) categories.

use crate::Disk;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Local filesystem disk.
///
/// All paths must be absolute; relative paths are rejected with
/// [`InvalidPath`](ErrorKind::InvalidPath) rather than being resolved against
/// whatever the process working directory happens to be.
#[derive(Clone, Debug)]
pub struct LocalDisk {
    name: String,
}
impl LocalDisk {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn require_absolute(path: &Path) -> Result<()> {
        if !path.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        Ok(())
    }

    /// Renaming across filesystems fails with `CrossesDevices`; recycle bins
    /// are commonly on another mount, so fall back to copy and delete.
    async fn copy_then_delete(from: &Path, to: &Path) -> Result<()> {
        fs::copy(from, to).await.map_err(|e| ErrorKind::from_io(e, from))?;
        fs::remove_file(from).await.map_err(|e| ErrorKind::from_io(e, from))?;
        Ok(())
    }
}
impl Default for LocalDisk {
    fn default() -> Self {
        Self::new("local")
    }
}

#[async_trait]
impl Disk for LocalDisk {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Self::require_absolute(path)?;
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ErrorKind::from_io(e, path).into()),
        }
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        Self::require_absolute(path)?;
        Ok(fs::remove_file(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        Self::require_absolute(from)?;
        Self::require_absolute(to)?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ErrorKind::from_io(e, parent))?;
        }
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => Self::copy_then_delete(from, to).await,
            Err(e) => Err(ErrorKind::from_io(e, from).into()),
        }
    }
}
