use std::io::{BufRead, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::meta::{EntryKind, Metadata, METADATA_LEN};
use crate::path::MAX_PATH_LEN;
use crate::{Error, Result};

pub(crate) trait DeserializeOwned {
    fn deserialize_owned<R: Read>(reader: &mut R) -> std::io::Result<Self>
    where
        Self: Sized;
}

impl DeserializeOwned for Metadata {
    fn deserialize_owned<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        // Read the whole block first so a short stream always surfaces as
        // `UnexpectedEof`, whatever the tag says.
        let mut block = [0u8; METADATA_LEN];
        reader.read_exact(&mut block)?;
        let mut cursor = &block[..];

        let tag = cursor.read_u8()?;
        let kind = EntryKind::from_tag(tag).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid or unsupported entry kind: {:#04x}", tag),
            )
        })?;

        Ok(Metadata {
            kind,
            mode: cursor.read_u32::<LittleEndian>()?,
            size: cursor.read_u64::<LittleEndian>()?,
            mtime: cursor.read_i64::<LittleEndian>()?,
        })
    }
}

/// Reads the next whitespace-delimited path token.
///
/// Returns `Ok(None)` when the stream ends before any token byte, which is
/// how a well-formed archive ends. The delimiter is consumed and must be `\n`.
pub(crate) fn read_path_token<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    loop {
        let buf = reader
            .fill_buf()
            .map_err(|source| Error::ReadArchive { source })?;
        if buf.is_empty() {
            return Ok(None);
        }

        let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        let found = skip < buf.len();
        reader.consume(skip);
        if found {
            break;
        }
    }

    let mut token: Vec<u8> = Vec::new();

    loop {
        let buf = reader
            .fill_buf()
            .map_err(|source| Error::ReadArchive { source })?;
        if buf.is_empty() {
            return Err(Error::TruncatedArchive {
                path: String::from_utf8_lossy(&token).into_owned(),
            });
        }

        let len = buf.iter().take_while(|b| !b.is_ascii_whitespace()).count();
        if token.len() + len > MAX_PATH_LEN {
            token.extend_from_slice(&buf[..len.min(32)]);
            return Err(Error::PathTooLong {
                prefix: String::from_utf8_lossy(&token[..token.len().min(32)]).into_owned(),
            });
        }

        token.extend_from_slice(&buf[..len]);
        let delimiter = buf.get(len).copied();
        reader.consume(len + delimiter.is_some() as usize);

        match delimiter {
            None => continue,
            Some(b'\n') => break,
            Some(other) => {
                return Err(Error::CorruptRecord {
                    path: String::from_utf8_lossy(&token).into_owned(),
                    reason: format!("path delimited by {:#04x} instead of a newline", other),
                })
            }
        }
    }

    String::from_utf8(token).map(Some).map_err(|e| Error::CorruptRecord {
        path: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        reason: "path is not valid UTF-8".into(),
    })
}
