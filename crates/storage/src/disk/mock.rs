//! In-memory disk for testing.

use crate::Disk;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A call made against a [`MockDisk`], recorded in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Exists(PathBuf),
    Delete(PathBuf),
    Rename(PathBuf, PathBuf),
}

#[derive(Default)]
struct State {
    files: HashMap<PathBuf, Vec<u8>>,
    faulty: HashSet<PathBuf>,
    log: Vec<Operation>,
}

/// In-memory disk for testing.
///
/// Files live in a `HashMap` behind a [`RwLock`], so all trait methods can
/// operate on `&self`. Every call is recorded (see [`operations`](Self::operations)),
/// and paths can be marked [faulty](Self::with_fault) to make any operation
/// touching them fail with an I/O error.
///
/// # Examples
///
/// ```
/// use sidecar_storage::Disk;
/// use sidecar_storage::disk::MockDisk;
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let disk = MockDisk::with_files(["/tv/Show/Show.nfo"]);
/// assert!(disk.exists(Path::new("/tv/Show/Show.nfo")).await?);
/// disk.delete(Path::new("/tv/Show/Show.nfo")).await?;
/// assert!(!disk.exists(Path::new("/tv/Show/Show.nfo")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockDisk {
    name: String,
    state: RwLock<State>,
}

impl MockDisk {
    /// Create a mock disk pre-populated with (empty) files.
    ///
    /// Panics if any path is not absolute. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut state = State::default();
        for path in files {
            let path = path.into();
            if !path.is_absolute() {
                panic!("MockDisk::with_files: path must be absolute {}", path.display());
            }
            state.files.insert(path, Vec::new());
        }
        Self {
            name: "mock".to_string(),
            state: RwLock::new(state),
        }
    }

    /// Make every operation on `path` fail with an I/O error.
    pub fn with_fault(mut self, path: impl Into<PathBuf>) -> Self {
        self.state.get_mut().faulty.insert(path.into());
        self
    }

    /// All calls made so far, in order.
    pub async fn operations(&self) -> Vec<Operation> {
        self.state.read().await.log.clone()
    }

    /// Paths of all files currently on the disk, sorted.
    pub async fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.state.read().await.files.keys().cloned().collect();
        files.sort();
        files
    }

    fn check(state: &State, path: &Path) -> Result<()> {
        if !path.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        if state.faulty.contains(path) {
            exn::bail!(ErrorKind::Io(std::io::Error::other(format!("injected fault: {}", path.display()))));
        }
        Ok(())
    }
}
impl Default for MockDisk {
    fn default() -> Self {
        let files: [&str; 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl Disk for MockDisk {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let mut state = self.state.write().await;
        state.log.push(Operation::Exists(path.to_path_buf()));
        Self::check(&state, path)?;
        Ok(state.files.contains_key(path))
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let mut state = self.state.write().await;
        state.log.push(Operation::Delete(path.to_path_buf()));
        Self::check(&state, path)?;
        state.files.remove(path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.to_path_buf())))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.write().await;
        state.log.push(Operation::Rename(from.to_path_buf(), to.to_path_buf()));
        Self::check(&state, from)?;
        Self::check(&state, to)?;
        let data = state.files.remove(from).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(from.to_path_buf())))?;
        state.files.insert(to.to_path_buf(), data);
        Ok(())
    }
}
