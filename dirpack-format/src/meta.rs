//! Point-in-time snapshots of filesystem entries.

use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Encoded size of a [`Metadata`] block: kind (1), mode (4), size (8), mtime (8).
pub const METADATA_LEN: usize = 21;

pub(crate) const TAG_DIRECTORY: u8 = 0x01;
pub(crate) const TAG_REGULAR_FILE: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    /// Symlinks, devices, sockets and fifos. Never written to an archive.
    Other,
}

impl EntryKind {
    #[inline(always)]
    pub fn tag(self) -> Option<u8> {
        match self {
            EntryKind::Directory => Some(TAG_DIRECTORY),
            EntryKind::RegularFile => Some(TAG_REGULAR_FILE),
            EntryKind::Other => None,
        }
    }

    #[inline(always)]
    pub fn from_tag(tag: u8) -> Option<EntryKind> {
        match tag {
            TAG_DIRECTORY => Some(EntryKind::Directory),
            TAG_REGULAR_FILE => Some(EntryKind::RegularFile),
            _ => None,
        }
    }

    fn of(file_type: fs::FileType) -> EntryKind {
        if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::RegularFile
        } else {
            EntryKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,

    /// Permission bits, including setuid/setgid/sticky.
    pub mode: u32,

    /// Length in bytes. For regular files this is the exact content length
    /// that follows the record.
    pub size: u64,

    /// Seconds since the Unix epoch.
    pub mtime: i64,
}

impl Metadata {
    /// Queries the filesystem for `path`. With `follow` set, symlinks are
    /// resolved (`stat`); otherwise the link itself is described (`lstat`).
    pub fn snapshot(path: &Path, follow: bool) -> Result<Metadata> {
        let meta = if follow {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        };

        meta.map(|m| Metadata::from_fs(&m))
            .map_err(|source| Error::Stat {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn from_fs(meta: &fs::Metadata) -> Metadata {
        Metadata {
            kind: EntryKind::of(meta.file_type()),
            mode: mode(meta),
            size: meta.len(),
            mtime: mtime(meta),
        }
    }

    #[inline(always)]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    #[inline(always)]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::RegularFile
    }
}

#[cfg(unix)]
fn mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode(meta: &fs::Metadata) -> u32 {
    let base = if meta.is_dir() { 0o755 } else { 0o644 };
    if meta.permissions().readonly() {
        base & !0o222
    } else {
        base
    }
}

#[cfg(unix)]
fn mtime(meta: &fs::Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;
    meta.mtime()
}

#[cfg(not(unix))]
fn mtime(meta: &fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
