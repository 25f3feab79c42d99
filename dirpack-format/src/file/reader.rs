use std::io::{prelude::*, ErrorKind};
use std::path::Path;

use crate::{
    de::{read_path_token, DeserializeOwned},
    meta::Metadata,
    record::RecordHeader,
    Error, Result,
};

use super::COPY_BUF_LEN;

/// Reads records front to back from an archive stream.
///
/// Content that the caller does not consume with [`RecordReader::copy_content`]
/// is skipped automatically before the next header is read.
#[derive(Debug)]
pub struct RecordReader<R: BufRead> {
    reader: R,
    current: Option<String>,
    pending: u64,
    failed: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> RecordReader<R> {
        RecordReader {
            reader,
            current: None,
            pending: 0,
            failed: false,
        }
    }

    /// Returns the next record header, or `None` at a clean end of stream.
    pub fn next_record(&mut self) -> Result<Option<RecordHeader>> {
        self.skip_content()?;

        let path = match read_path_token(&mut self.reader)? {
            Some(path) => path,
            None => {
                self.current = None;
                return Ok(None);
            }
        };

        let meta = match Metadata::deserialize_owned(&mut self.reader) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(Error::TruncatedArchive { path })
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(Error::CorruptRecord {
                    path,
                    reason: e.to_string(),
                })
            }
            Err(source) => return Err(Error::ReadArchive { source }),
        };

        let header = RecordHeader::new(path, meta);
        tracing::debug!(path = %header.path, kind = ?header.kind(), size = header.meta.size, "read record");

        self.pending = header.content_len();
        self.current = Some(header.path.clone());
        Ok(Some(header))
    }

    /// Streams the current record's content into `dest`.
    ///
    /// The stream ending early is `TruncatedArchive`; a failing `dest` is
    /// reported as `WriteFile` against `dest_path`.
    pub fn copy_content<W: Write>(&mut self, dest: &mut W, dest_path: &Path) -> Result<u64> {
        let mut buf = vec![0u8; self.pending.min(COPY_BUF_LEN as u64) as usize];
        let mut copied = 0u64;

        while self.pending > 0 {
            let want = self.pending.min(buf.len() as u64) as usize;
            let n = self.read_chunk(&mut buf[..want])?;

            dest.write_all(&buf[..n])
                .map_err(|source| Error::WriteFile {
                    path: dest_path.to_path_buf(),
                    source,
                })?;
            copied += n as u64;
        }

        Ok(copied)
    }

    fn skip_content(&mut self) -> Result<()> {
        if self.pending == 0 {
            return Ok(());
        }

        let mut buf = vec![0u8; self.pending.min(COPY_BUF_LEN as u64) as usize];
        while self.pending > 0 {
            let want = self.pending.min(buf.len() as u64) as usize;
            self.read_chunk(&mut buf[..want])?;
        }

        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(0) => {
                    return Err(Error::TruncatedArchive {
                        path: self.current.clone().unwrap_or_default(),
                    })
                }
                Ok(n) => {
                    self.pending -= n as u64;
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => return Err(Error::ReadArchive { source }),
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<RecordHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.next_record() {
            Ok(header) => header.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
