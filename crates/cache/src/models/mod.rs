//! Extra file models.
//!
//! Every kind of extra file is a [`ExtraFileMeta`] (the fields the lifecycle
//! cares about) plus kind-specific details. The [`ExtraFile`] trait ties the
//! two together so repositories and services can be generic over the kind.

mod metadata;
mod other;
pub(crate) mod row;
mod subtitle;

pub use self::metadata::{MetadataDetails, MetadataFile, MetadataType};
pub use self::other::OtherExtraFile;
pub use self::subtitle::{SubtitleDetails, SubtitleFile};
use derive_more::{Display, Error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::UtcDateTime;

/// Discriminator for the kinds of extra file sharing the index.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Kind {
    #[display("subtitle")]
    Subtitle,
    #[display("metadata")]
    Metadata,
    #[display("other")]
    Other,
}
impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subtitle => "subtitle",
            Self::Metadata => "metadata",
            Self::Other => "other",
        }
    }
}
impl FromStr for Kind {
    type Err = UnknownKind;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subtitle" => Ok(Self::Subtitle),
            "metadata" => Ok(Self::Metadata),
            "other" => Ok(Self::Other),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

#[derive(Debug, Display, Error)]
#[display("unknown extra file kind: {_0}")]
pub struct UnknownKind(#[error(not(source))] String);

/// Fields shared by every kind of extra file.
///
/// A record with `id == 0` has never been persisted. `added` and
/// `last_updated` are stamped by the lifecycle service on upsert; they start
/// out as the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraFileMeta {
    pub id: u64,
    /// Owning media item (series, movie...).
    pub media_item_id: u64,
    /// Owning media file, if the extra belongs to a specific file rather than
    /// the media item as a whole.
    pub media_file_id: Option<u64>,
    /// Sub-grouping within the media item (e.g. a season number).
    pub sub_group: Option<u32>,
    /// Path relative to the owning media item's root directory.
    pub relative_path: PathBuf,
    /// Extension including the leading dot, or empty.
    pub extension: String,
    pub added: UtcDateTime,
    pub last_updated: UtcDateTime,
}
impl ExtraFileMeta {
    /// A new, unpersisted record for an extra file of `media_item_id`.
    pub fn new(media_item_id: u64, relative_path: impl Into<PathBuf>) -> Self {
        let relative_path = relative_path.into();
        let extension = extension_of(&relative_path);
        Self {
            id: 0,
            media_item_id,
            media_file_id: None,
            sub_group: None,
            relative_path,
            extension,
            added: UtcDateTime::UNIX_EPOCH,
            last_updated: UtcDateTime::UNIX_EPOCH,
        }
    }

    pub fn with_media_file(mut self, media_file_id: u64) -> Self {
        self.media_file_id = Some(media_file_id);
        self
    }

    pub fn with_sub_group(mut self, sub_group: u32) -> Self {
        self.sub_group = Some(sub_group);
        self
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

fn extension_of(path: &Path) -> String {
    path.extension().map(|ext| format!(".{}", ext.to_string_lossy())).unwrap_or_default()
}

/// A kind of extra file that can be stored in the index.
///
/// Implementors deref to their [`ExtraFileMeta`], so `file.relative_path`
/// works on any kind.
pub trait ExtraFile: Deref<Target = ExtraFileMeta> + DerefMut + Clone + Send + Sync + 'static {
    /// Discriminator stored alongside each record.
    const KIND: Kind;

    /// Whether the files of this kind are removed outright during cascading
    /// deletes instead of being sent to the recycle bin.
    const PERMANENTLY_DELETE: bool = false;

    /// Kind-specific fields, persisted as JSON.
    type Details: Serialize + DeserializeOwned;

    fn details(&self) -> Self::Details;

    fn from_parts(meta: ExtraFileMeta, details: Self::Details) -> Self;
}
