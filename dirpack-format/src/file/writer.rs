use std::io::{prelude::*, ErrorKind};
use std::path::Path;

use crate::{path, record::RecordHeader, ser::Serialize, Error, Result};

use super::COPY_BUF_LEN;

/// Appends records to an archive stream. Never seeks.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    writer: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> RecordWriter<W> {
        RecordWriter { writer }
    }

    /// Writes the path token and metadata block for `header`.
    pub fn write_header(&mut self, header: &RecordHeader) -> Result<()> {
        path::check_token(&header.path).map_err(|source| Error::InvalidPath {
            path: header.path.clone(),
            source,
        })?;

        header
            .write(&mut self.writer)
            .map_err(|source| Error::WriteArchive { source })?;

        tracing::debug!(path = %header.path, kind = ?header.kind(), size = header.meta.size, "wrote record");
        Ok(())
    }

    /// Copies exactly `header.meta.size` bytes from `source` into the archive.
    ///
    /// Extra bytes in `source` are ignored. Running out early is a
    /// `ShortRead`, since the record already promised that many bytes.
    pub fn write_content<R: Read>(
        &mut self,
        header: &RecordHeader,
        source_path: &Path,
        mut source: R,
    ) -> Result<u64> {
        let expected = header.content_len();
        let mut buf = vec![0u8; expected.min(COPY_BUF_LEN as u64) as usize];
        let mut copied = 0u64;

        while copied < expected {
            let want = (expected - copied).min(buf.len() as u64) as usize;
            let n = match source.read(&mut buf[..want]) {
                Ok(0) => {
                    return Err(Error::ShortRead {
                        path: source_path.to_path_buf(),
                        expected,
                        actual: copied,
                    })
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(Error::ReadFile {
                        path: source_path.to_path_buf(),
                        source: err,
                    })
                }
            };

            self.writer
                .write_all(&buf[..n])
                .map_err(|source| Error::WriteArchive { source })?;
            copied += n as u64;
        }

        Ok(copied)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|source| Error::WriteArchive { source })
    }
}
