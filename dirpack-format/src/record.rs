use crate::meta::{EntryKind, Metadata};

/// The path and metadata of one archived entry. Content, if any, follows
/// the header on the stream and is never held by the header itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Path as given to the archiver, `/`-separated. Never empty, never
    /// contains whitespace.
    pub path: String,

    pub meta: Metadata,
}

impl RecordHeader {
    #[inline(always)]
    pub fn new(path: String, meta: Metadata) -> RecordHeader {
        RecordHeader { path, meta }
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline(always)]
    pub fn kind(&self) -> EntryKind {
        self.meta.kind
    }

    /// Number of content bytes following this header on the stream.
    #[inline(always)]
    pub fn content_len(&self) -> u64 {
        if self.meta.is_file() {
            self.meta.size
        } else {
            0
        }
    }
}
