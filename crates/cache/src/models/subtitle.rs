use crate::models::{ExtraFile, ExtraFileMeta, Kind};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// A subtitle track stored next to a media file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtitleFile {
    meta: ExtraFileMeta,
    /// ISO 639 language code parsed from the file name, if any.
    pub language: Option<String>,
    /// Extra flags parsed from the file name (`forced`, `sdh`, `cc`...).
    pub tags: Vec<String>,
}
impl SubtitleFile {
    pub fn new(meta: ExtraFileMeta, language: Option<String>) -> Self {
        Self { meta, language, tags: Vec::new() }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}
impl Deref for SubtitleFile {
    type Target = ExtraFileMeta;
    fn deref(&self) -> &ExtraFileMeta {
        &self.meta
    }
}
impl DerefMut for SubtitleFile {
    fn deref_mut(&mut self) -> &mut ExtraFileMeta {
        &mut self.meta
    }
}

#[derive(Serialize, Deserialize)]
pub struct SubtitleDetails {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl ExtraFile for SubtitleFile {
    const KIND: Kind = Kind::Subtitle;
    type Details = SubtitleDetails;

    fn details(&self) -> SubtitleDetails {
        SubtitleDetails {
            language: self.language.clone(),
            tags: self.tags.clone(),
        }
    }

    fn from_parts(meta: ExtraFileMeta, details: SubtitleDetails) -> Self {
        Self {
            meta,
            language: details.language,
            tags: details.tags,
        }
    }
}
