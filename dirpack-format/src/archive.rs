//! Serialises a directory tree into an archive stream, pre-order.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    file::RecordWriter,
    meta::{EntryKind, Metadata},
    path,
    record::RecordHeader,
    Error, Report, Result,
};

pub struct Archiver<W: Write> {
    writer: RecordWriter<BufWriter<W>>,
    base: PathBuf,
    verbose: bool,
    report: Report,
}

impl<W: Write> Archiver<W> {
    pub fn new(writer: W) -> Archiver<W> {
        Archiver {
            writer: RecordWriter::new(BufWriter::new(writer)),
            base: PathBuf::from("."),
            verbose: false,
            report: Report::default(),
        }
    }

    /// Print each archived path to stdout as it is visited.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Directory that relative roots are looked up in. Archived paths are
    /// unaffected and stay exactly as given to [`Archiver::archive`].
    pub fn base_dir<P: Into<PathBuf>>(mut self, base: P) -> Self {
        self.base = base.into();
        self
    }

    /// Archives the tree at `root` and flushes the stream.
    ///
    /// Trailing separators on `root` are dropped. The root gets its own
    /// record unless it is `.`. A root that could not be extracted again,
    /// such as `a/../b`, is refused before anything is written.
    pub fn archive(mut self, root: &str) -> Result<Report> {
        let root = path::trim_root(root);
        path::check_token(root)
            .and_then(|_| path::resolve(Path::new(""), root).map(|_| ()))
            .map_err(|source| Error::InvalidPath {
                path: root.to_string(),
                source,
            })?;

        self.walk(root, true)?;
        self.writer.flush()?;

        tracing::debug!(
            directories = self.report.directories,
            files = self.report.files,
            bytes = self.report.bytes,
            warnings = self.report.warnings.len(),
            "archive complete"
        );
        Ok(self.report)
    }

    fn walk(&mut self, dir: &str, is_root: bool) -> Result<()> {
        let disk_dir = self.base.join(dir);

        if is_root {
            let meta = Metadata::snapshot(&disk_dir, true)?;
            if meta.is_dir() && dir != "." {
                self.visit(dir);
                self.add_directory(dir, meta)?;
            }
        }

        let entries = fs::read_dir(&disk_dir).map_err(|source| Error::DirOpen {
            path: disk_dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| Error::ReadDir {
                path: disk_dir.clone(),
                source,
            })?;

            let file_name = entry.file_name();
            let name = match file_name.to_str() {
                Some(name) => name,
                None => {
                    self.report.warn(Error::NonUtf8Name {
                        parent: dir.to_string(),
                        name: file_name.clone(),
                    });
                    continue;
                }
            };

            if path::is_dot_entry(name) {
                continue;
            }

            let child = path::join(dir, name);
            if let Err(source) = path::check_token(&child) {
                self.report.warn(Error::InvalidPath {
                    path: child,
                    source,
                });
                continue;
            }

            let disk_child = disk_dir.join(name);
            let meta = match Metadata::snapshot(&disk_child, false) {
                Ok(meta) => meta,
                Err(e) => {
                    self.report.warn(e);
                    continue;
                }
            };

            self.visit(&child);
            match meta.kind {
                EntryKind::Directory => {
                    self.add_directory(&child, meta)?;
                    self.walk(&child, false)?;
                }
                EntryKind::RegularFile => self.add_file(child, &disk_child, meta)?,
                EntryKind::Other => {
                    tracing::debug!(path = %child, "skipping special file");
                    self.report.skipped += 1;
                }
            }
        }

        Ok(())
    }

    fn add_directory(&mut self, path: &str, meta: Metadata) -> Result<()> {
        self.writer
            .write_header(&RecordHeader::new(path.to_string(), meta))?;
        self.report.records += 1;
        self.report.directories += 1;
        Ok(())
    }

    fn add_file(&mut self, path: String, disk_path: &Path, meta: Metadata) -> Result<()> {
        let file = File::open(disk_path).map_err(|source| Error::OpenFile {
            path: disk_path.to_path_buf(),
            source,
        })?;

        let header = RecordHeader::new(path, meta);
        self.writer.write_header(&header)?;
        let copied = self.writer.write_content(&header, disk_path, file)?;

        self.report.records += 1;
        self.report.files += 1;
        self.report.bytes += copied;
        Ok(())
    }

    #[inline(always)]
    fn visit(&self, path: &str) {
        if self.verbose {
            println!("processing: {}", path);
        }
    }
}
