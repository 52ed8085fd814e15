//! Lifecycle of sidecar files.
//!
//! [`ExtraFileService`] is the entry point: one service per kind of extra
//! file, wrapping an [`ExtraFileRepository`](sidecar_cache::ExtraFileRepository).
//! It persists discovered extras with upsert semantics, and reacts to the
//! deletion events published on an [`EventBus`] by cleaning up the index and,
//! when a media file was genuinely deleted, the extra files on disk.

mod bus;
pub mod error;
mod events;
mod lookup;
mod service;

pub use crate::bus::{EventBus, Handle};
pub use crate::events::{DeleteReason, MediaFileDeleted, MediaItemDeleted};
pub use crate::lookup::{MediaItemLookup, StaticMediaItems};
pub use crate::service::ExtraFileService;
