use crate::error::{ErrorKind, Result};
use crate::models::{ExtraFile, ExtraFileMeta, Kind};
use exn::{OptionExt, ResultExt};
use sidecar_storage::validate_path;
use std::path::{Path, PathBuf};
use time::UtcDateTime;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExtraFileRow {
    pub(crate) id: i64,
    pub(crate) kind: String,
    pub(crate) media_item_id: i64,
    pub(crate) media_file_id: Option<i64>,
    pub(crate) sub_group: Option<i64>,
    pub(crate) relative_path: String,
    pub(crate) extension: String,
    pub(crate) details: String,
    pub(crate) added: i64,
    pub(crate) last_updated: i64,
}

/// SQLite has no unsigned 64-bit integers.
pub(crate) fn to_db_id(id: u64, what: &'static str) -> Result<i64> {
    i64::try_from(id).or_raise(|| ErrorKind::InvalidData(what))
}

fn from_db_id(id: i64, what: &'static str) -> Result<u64> {
    u64::try_from(id).or_raise(|| ErrorKind::InvalidData(what))
}

/// Normalize a relative path into the form it is stored (and looked up) as.
pub(crate) fn db_path(path: impl AsRef<Path>) -> Result<String> {
    let path = validate_path(path).or_raise(|| ErrorKind::InvalidData("relative path"))?;
    Ok(path.to_str().ok_or_raise(|| ErrorKind::InvalidData("relative path"))?.to_string())
}

pub(crate) fn timestamp(ts: i64, what: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(ts).or_raise(|| ErrorKind::InvalidData(what))
}

impl ExtraFileRow {
    pub(crate) fn from_model<E: ExtraFile>(file: &E) -> Result<Self> {
        Ok(Self {
            id: to_db_id(file.id, "id")?,
            kind: E::KIND.as_str().to_string(),
            media_item_id: to_db_id(file.media_item_id, "media item id")?,
            media_file_id: file.media_file_id.map(|id| to_db_id(id, "media file id")).transpose()?,
            sub_group: file.sub_group.map(i64::from),
            relative_path: db_path(&file.relative_path)?,
            extension: file.extension.clone(),
            details: serde_json::to_string(&file.details()).or_raise(|| ErrorKind::InvalidData("details"))?,
            added: file.added.unix_timestamp(),
            last_updated: file.last_updated.unix_timestamp(),
        })
    }

    pub(crate) fn into_model<E: ExtraFile>(self) -> Result<E> {
        let kind = self.kind.parse::<Kind>().or_raise(|| ErrorKind::InvalidData("kind"))?;
        if kind != E::KIND {
            exn::bail!(ErrorKind::InvalidData("kind"));
        }
        let meta = ExtraFileMeta {
            id: from_db_id(self.id, "id")?,
            media_item_id: from_db_id(self.media_item_id, "media item id")?,
            media_file_id: self.media_file_id.map(|id| from_db_id(id, "media file id")).transpose()?,
            sub_group: self
                .sub_group
                .map(|group| u32::try_from(group).or_raise(|| ErrorKind::InvalidData("sub group")))
                .transpose()?,
            relative_path: PathBuf::from(self.relative_path),
            extension: self.extension,
            added: timestamp(self.added, "added")?,
            last_updated: timestamp(self.last_updated, "last updated")?,
        };
        let details = serde_json::from_str(&self.details).or_raise(|| ErrorKind::InvalidData("details"))?;
        Ok(E::from_parts(meta, details))
    }
}
