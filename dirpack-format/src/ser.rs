use std::io::{Result, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{meta::Metadata, record::RecordHeader};

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
}

impl Serialize for Metadata {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let tag = self.kind.tag().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "only directories and regular files can be archived",
            )
        })?;

        writer.write_u8(tag)?;
        writer.write_u32::<LittleEndian>(self.mode)?;
        writer.write_u64::<LittleEndian>(self.size)?;
        writer.write_i64::<LittleEndian>(self.mtime)
    }
}

impl Serialize for RecordHeader {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.path.as_bytes())?;
        writer.write_u8(b'\n')?;
        self.meta.write(writer)
    }
}
