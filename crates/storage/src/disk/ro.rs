//! Read-only disk.
//!
//! Wraps another disk and prevents mutations from executing, while still
//! reporting success to the caller. Used for dry runs.

use async_trait::async_trait;
use std::path::Path;

use crate::{Disk, DiskHandle, error::Result};

/// Read-only disk.
///
/// Existence checks are passed through; deletes and renames are dropped with
/// an [`info event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyDisk {
    inner: DiskHandle,
}
impl ReadOnlyDisk {
    pub fn new(inner: DiskHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Disk for ReadOnlyDisk {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        tracing::info!(disk = self.name(), path = %path.display(), "Skipping delete during read-only mode");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        tracing::info!(disk = self.name(), from = %from.display(), to = %to.display(), "Skipping move during read-only mode");
        Ok(())
    }
}
