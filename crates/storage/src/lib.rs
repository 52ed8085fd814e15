//! Disk access for sidecar files.
//!
//! Unlike a library backend, sidecar files live next to the media they belong
//! to, scattered across many media item directories. Every [`Disk`] operation
//! therefore takes an absolute path; use [`resolve_path`] to join an owner's
//! root directory with a stored relative path.
//!
//! Removing a file goes through a [`DeletionSink`]: either [`Permanent`] or
//! the recoverable [`RecycleBin`].

pub mod disk;
pub mod error;
mod path;
pub mod sink;

pub use crate::disk::Disk;
pub use crate::path::{resolve as resolve_path, validate as validate_path};
pub use crate::sink::{DeletionSink, Permanent, RecycleBin};
use std::sync::Arc;

pub type DiskHandle = Arc<dyn Disk + Send + Sync>;
pub type SinkHandle = Arc<dyn DeletionSink + Send + Sync>;
