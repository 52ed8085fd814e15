//! Deletion events published by the owning media system.

use derive_more::Display;

/// Why a media file record is being removed.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum DeleteReason {
    /// Deleted on request.
    #[display("manual")]
    Manual,
    /// Replaced by a better release.
    #[display("upgrade")]
    Upgrade,
    /// The file disappeared from disk on its own.
    #[display("missing from disk")]
    MissingFromDisk,
    /// No sub-items (episodes) link to the file any more. Only the record is
    /// going away; the file itself stays on disk.
    #[display("no linked episodes")]
    NoLinkedEpisodes,
}
impl DeleteReason {
    /// Whether the media file was only removed from the index, leaving its
    /// sidecar files live on disk.
    pub fn is_bookkeeping_only(&self) -> bool {
        matches!(self, Self::NoLinkedEpisodes)
    }
}

/// A media item (series, movie) was removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaItemDeleted {
    pub media_item_id: u64,
    /// Whether the owning media system is removing the item's directory.
    pub delete_files: bool,
}

/// A media file was removed from a media item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaFileDeleted {
    pub media_file_id: u64,
    pub media_item_id: u64,
    pub reason: DeleteReason,
}
