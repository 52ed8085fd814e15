//! Deletion sinks.
//!
//! A [`DeletionSink`] decides what "deleting" a file means: [`Permanent`]
//! removes it outright, [`RecycleBin`] moves it somewhere it can be restored
//! from.

use crate::error::{ErrorKind, Result};
use crate::DiskHandle;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Upper bound on `_n` suffixes tried before giving up on a recycle bin name.
const MAX_RECYCLE_SUFFIX: usize = 1000;

#[async_trait]
pub trait DeletionSink: Send + Sync {
    /// Short description of the sink (used for logging only).
    fn name(&self) -> &str;

    /// Get rid of the file at `path`, returning once it is gone from its
    /// original location.
    ///
    /// Fails loudly on I/O faults. A file that is already absent is reported
    /// as [`NotFound`](ErrorKind::NotFound); callers that don't care should
    /// check [`Disk::exists`](crate::Disk::exists) first.
    async fn delete_file(&self, path: &Path) -> Result<()>;
}

/// Removes files outright.
#[derive(Clone)]
pub struct Permanent {
    disk: DiskHandle,
}
impl Permanent {
    pub fn new(disk: DiskHandle) -> Self {
        Self { disk }
    }
}

#[async_trait]
impl DeletionSink for Permanent {
    fn name(&self) -> &str {
        "permanent"
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        tracing::debug!(disk = self.disk.name(), path = %path.display(), "Deleting file");
        self.disk.delete(path).await
    }
}

/// Moves files into a recycle bin directory so they can be recovered.
///
/// A file at `/tv/Show/Show.en.srt` is moved to `<bin>/Show/Show.en.srt`,
/// keeping the name of the directory it came from. If that name is already
/// taken (the same file was recycled before), `_1`, `_2`, ... is appended to
/// the file stem.
///
/// Without a configured bin there is nowhere to recover from, and files are
/// deleted permanently.
#[derive(Clone)]
pub struct RecycleBin {
    disk: DiskHandle,
    location: Option<PathBuf>,
}
impl RecycleBin {
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if `location` is not
    /// absolute.
    pub fn new(disk: DiskHandle, location: Option<PathBuf>) -> Result<Self> {
        if let Some(location) = &location
            && !location.is_absolute()
        {
            exn::bail!(ErrorKind::InvalidPath(location.clone()));
        }
        Ok(Self { disk, location })
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Find a free destination for `path` inside the bin.
    async fn destination(&self, bin: &Path, path: &Path) -> Result<PathBuf> {
        let Some(file_name) = path.file_name() else {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        };
        let folder = match path.parent().and_then(Path::file_name) {
            Some(parent) => bin.join(parent),
            None => bin.to_path_buf(),
        };
        let candidate = folder.join(file_name);
        if !self.disk.exists(&candidate).await? {
            return Ok(candidate);
        }
        let stem = Path::new(file_name).file_stem().unwrap_or(file_name);
        let extension = Path::new(file_name).extension();
        for n in 1..=MAX_RECYCLE_SUFFIX {
            let mut name = OsString::from(stem);
            name.push(format!("_{n}"));
            if let Some(extension) = extension {
                name.push(".");
                name.push(extension);
            }
            let candidate = folder.join(name);
            if !self.disk.exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        exn::bail!(ErrorKind::RecycleBinFull(candidate))
    }
}

#[async_trait]
impl DeletionSink for RecycleBin {
    fn name(&self) -> &str {
        "recycle bin"
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        let Some(bin) = &self.location else {
            tracing::info!(path = %path.display(), "Recycle bin has not been configured, deleting permanently");
            return self.disk.delete(path).await;
        };
        let destination = self.destination(bin, path).await?;
        tracing::debug!(from = %path.display(), to = %destination.display(), "Moving file to recycle bin");
        self.disk.rename(path, &destination).await
    }
}
