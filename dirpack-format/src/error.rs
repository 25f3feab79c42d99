use std::path::PathBuf;

use crate::path::PathError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot stat `{}`", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open directory `{}`", .path.display())]
    DirOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read directory entry in `{}`", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read file `{}`", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File `{}` shrank while archiving: expected {expected} bytes, read {actual}", .path.display())]
    ShortRead {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Cannot archive path `{path}`")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("Skipping non-UTF-8 entry name {name:?} in `{parent}`")]
    NonUtf8Name { parent: String, name: std::ffi::OsString },

    #[error("Cannot write to archive")]
    WriteArchive {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read from archive")]
    ReadArchive {
        #[source]
        source: std::io::Error,
    },

    #[error("Path token starting with `{prefix}` exceeds the maximum path length")]
    PathTooLong { prefix: String },

    #[error("Archive is truncated in record `{path}`")]
    TruncatedArchive { path: String },

    #[error("Archive record `{path}` is corrupt: {reason}")]
    CorruptRecord { path: String, reason: String },

    #[error("Refusing to extract `{path}`")]
    UnsafePath {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("Cannot create directory `{}`", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write file `{}`", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot remove partially extracted file `{}`", .path.display())]
    RemovePartial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
