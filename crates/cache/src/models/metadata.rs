use crate::models::{ExtraFile, ExtraFileMeta, Kind};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// What a metadata file describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataType {
    #[default]
    Unknown,
    /// Metadata for the whole media item (e.g. `tvshow.nfo`).
    MediaItemMetadata,
    /// Artwork for the whole media item (e.g. `poster.jpg`).
    MediaItemImage,
    /// Artwork for a sub-group (e.g. `season01-poster.jpg`).
    SubGroupImage,
    /// Metadata for a single media file.
    MediaFileMetadata,
    /// Artwork for a single media file (e.g. an episode thumbnail).
    MediaFileImage,
}

/// A metadata or artwork file written by a metadata consumer (Kodi, Plex...).
///
/// Metadata is regenerated on demand, so it isn't worth recovering: these
/// files are deleted permanently instead of being recycled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataFile {
    meta: ExtraFileMeta,
    /// Name of the consumer that wrote the file.
    pub consumer: String,
    pub metadata_type: MetadataType,
    /// Hash of the content at the time it was written, used to skip
    /// rewriting unchanged metadata.
    pub hash: Option<String>,
}
impl MetadataFile {
    pub fn new(meta: ExtraFileMeta, consumer: impl Into<String>, metadata_type: MetadataType) -> Self {
        Self {
            meta,
            consumer: consumer.into(),
            metadata_type,
            hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}
impl Deref for MetadataFile {
    type Target = ExtraFileMeta;
    fn deref(&self) -> &ExtraFileMeta {
        &self.meta
    }
}
impl DerefMut for MetadataFile {
    fn deref_mut(&mut self) -> &mut ExtraFileMeta {
        &mut self.meta
    }
}

#[derive(Serialize, Deserialize)]
pub struct MetadataDetails {
    consumer: String,
    #[serde(rename = "type", default)]
    metadata_type: MetadataType,
    #[serde(default)]
    hash: Option<String>,
}

impl ExtraFile for MetadataFile {
    const KIND: Kind = Kind::Metadata;
    const PERMANENTLY_DELETE: bool = true;
    type Details = MetadataDetails;

    fn details(&self) -> MetadataDetails {
        MetadataDetails {
            consumer: self.consumer.clone(),
            metadata_type: self.metadata_type,
            hash: self.hash.clone(),
        }
    }

    fn from_parts(meta: ExtraFileMeta, details: MetadataDetails) -> Self {
        Self {
            meta,
            consumer: details.consumer,
            metadata_type: details.metadata_type,
            hash: details.hash,
        }
    }
}
