//! Sequential directory archives.
//!
//! An archive is a flat log of records written in pre-order:
//!
//! ```text
//! Record := PathToken '\n' MetadataBlock Content?
//! ```
//!
//! `MetadataBlock` is a fixed 21-byte little-endian block (kind, mode, size,
//! mtime) and `Content` is exactly `size` bytes, present only for regular
//! files. There is no header, index or terminator; a reader stops when the
//! stream ends where the next path token would begin.
//!
//! ```no_run
//! let mut out = std::fs::File::create("docs.dpk")?;
//! let report = dirpack_format::run_create(&mut out, "docs", false)?;
//! println!("archived {} records", report.records);
//!
//! let input = std::fs::File::open("docs.dpk")?;
//! dirpack_format::run_extract(input, true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod archive;
mod de;
mod error;
mod extract;
mod file;
pub mod meta;
pub mod path;
mod record;
mod report;
mod ser;

use std::io::{BufReader, Read, Write};

pub use archive::Archiver;
pub use error::{Error, Result};
pub use extract::Extractor;
pub use file::{RecordReader, RecordWriter};
pub use meta::{EntryKind, Metadata};
pub use record::RecordHeader;
pub use report::Report;

/// Archives the tree at `root` into `output`.
///
/// `output` is flushed but not closed; its lifecycle belongs to the caller.
pub fn run_create<W: Write>(output: W, root: &str, verbose: bool) -> Result<Report> {
    Archiver::new(output).verbose(verbose).archive(root)
}

/// Recreates every record of `input` relative to the current directory.
pub fn run_extract<R: Read>(input: R, verbose: bool) -> Result<Report> {
    Extractor::new(BufReader::new(input))
        .verbose(verbose)
        .extract()
}

/// Reads every record header of `input` without touching the filesystem.
pub fn run_list<R: Read>(input: R) -> Result<Vec<RecordHeader>> {
    RecordReader::new(BufReader::new(input)).collect()
}
