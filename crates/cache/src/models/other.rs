use crate::models::{ExtraFile, ExtraFileMeta, Kind};
use std::ops::{Deref, DerefMut};

/// Any other file kept alongside a media file (`.nfo` files from other tools,
/// text files, samples...) that should follow it around.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtherExtraFile(ExtraFileMeta);
impl OtherExtraFile {
    pub fn new(meta: ExtraFileMeta) -> Self {
        Self(meta)
    }
}
impl Deref for OtherExtraFile {
    type Target = ExtraFileMeta;
    fn deref(&self) -> &ExtraFileMeta {
        &self.0
    }
}
impl DerefMut for OtherExtraFile {
    fn deref_mut(&mut self) -> &mut ExtraFileMeta {
        &mut self.0
    }
}

impl ExtraFile for OtherExtraFile {
    const KIND: Kind = Kind::Other;
    type Details = ();

    fn details(&self) {}

    fn from_parts(meta: ExtraFileMeta, _details: ()) -> Self {
        Self(meta)
    }
}
