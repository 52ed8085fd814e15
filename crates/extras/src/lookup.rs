//! Resolution of a media item's root directory.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// Resolves the directory an extra file's relative path is relative to.
#[async_trait]
pub trait MediaItemLookup: Send + Sync {
    /// Absolute root directory of the media item.
    ///
    /// An unknown media item is a [`MediaItemNotFound`](ErrorKind::MediaItemNotFound)
    /// error: an event referring to it should never have been published.
    async fn media_item_root(&self, media_item_id: u64) -> Result<PathBuf>;
}

/// Fixed, in-memory map of media item roots.
#[derive(Clone, Debug, Default)]
pub struct StaticMediaItems {
    roots: HashMap<u64, PathBuf>,
}
impl StaticMediaItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, media_item_id: u64, root: impl Into<PathBuf>) -> Self {
        self.insert(media_item_id, root);
        self
    }

    /// Returns the previous root, if the media item was already known.
    pub fn insert(&mut self, media_item_id: u64, root: impl Into<PathBuf>) -> Option<PathBuf> {
        self.roots.insert(media_item_id, root.into())
    }
}
impl<P: Into<PathBuf>> FromIterator<(u64, P)> for StaticMediaItems {
    fn from_iter<T: IntoIterator<Item = (u64, P)>>(iter: T) -> Self {
        Self {
            roots: iter.into_iter().map(|(id, root)| (id, root.into())).collect(),
        }
    }
}

#[async_trait]
impl MediaItemLookup for StaticMediaItems {
    async fn media_item_root(&self, media_item_id: u64) -> Result<PathBuf> {
        match self.roots.get(&media_item_id) {
            Some(root) => Ok(root.clone()),
            None => exn::bail!(ErrorKind::MediaItemNotFound(media_item_id)),
        }
    }
}
