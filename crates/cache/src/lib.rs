//! SQLite index of sidecar files.
//!
//! The index records where each extra file (subtitle, metadata, artwork...)
//! lives relative to its owning media item, and which media file it belongs
//! to. It is not the source of truth for whether a file exists - the disk is.
//!
//! # Architecture
//! - [`ExtraFile`]: the data contract every kind of extra file implements,
//!   sharing the common [`ExtraFileMeta`] fields.
//! - [`ExtraFileRepository`]: the storage contract the lifecycle service
//!   consumes, generic over the kind of extra file.
//! - [`SqliteRepository`]: the SQLite implementation. All kinds share one
//!   table, discriminated by [`Kind`].

mod db;
pub mod error;
pub mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{ExtraFile, ExtraFileMeta, Kind, MetadataFile, MetadataType, OtherExtraFile, SubtitleFile};
pub use crate::repo::{ExtraFileRepository, SqliteRepository};
