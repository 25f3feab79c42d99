use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    Whitespace,
    TooLong(usize),
    Escapes,
}

impl std::error::Error for PathError {}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::TooLong(len) => write!(
                f,
                "{} ({} bytes, limit {})",
                self.as_str(),
                len,
                super::MAX_PATH_LEN
            ),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl PathError {
    pub fn as_str(&self) -> &str {
        match self {
            PathError::Empty => "no path provided",
            PathError::Whitespace => "whitespace found in path",
            PathError::TooLong(_) => "path exceeds maximum length",
            PathError::Escapes => "path escapes the destination directory",
        }
    }
}
