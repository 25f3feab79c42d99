mod reader;
mod writer;

pub use self::reader::RecordReader;
pub use self::writer::RecordWriter;

/// Upper bound on the scratch buffer used while moving file content.
pub(crate) const COPY_BUF_LEN: usize = 64 * 1024;
