//! Replays an archive stream onto the filesystem.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{
    file::RecordReader,
    meta::EntryKind,
    path,
    record::RecordHeader,
    Error, Report, Result,
};

pub struct Extractor<R: BufRead> {
    reader: RecordReader<R>,
    dest: PathBuf,
    verbose: bool,
    report: Report,
    /// Directories whose recorded mode denies the owner write or search
    /// access. They are created accessible and restricted once every record
    /// beneath them has been written.
    deferred_modes: Vec<(PathBuf, u32)>,
    stripped_parents: bool,
}

impl<R: BufRead> Extractor<R> {
    pub fn new(reader: R) -> Extractor<R> {
        Extractor {
            reader: RecordReader::new(reader),
            dest: PathBuf::from("."),
            verbose: false,
            report: Report::default(),
            deferred_modes: vec![],
            stripped_parents: false,
        }
    }

    /// Print each record's path to stdout as it is replayed.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Directory that archived paths are recreated under.
    pub fn dest<P: Into<PathBuf>>(mut self, dest: P) -> Self {
        self.dest = dest.into();
        self
    }

    /// Replays every record until the stream ends.
    ///
    /// Restrictive directory modes are applied even when a fatal error stops
    /// the replay early.
    pub fn extract(mut self) -> Result<Report> {
        let result = self.replay();
        self.apply_deferred_modes();
        result?;

        tracing::debug!(
            directories = self.report.directories,
            files = self.report.files,
            bytes = self.report.bytes,
            warnings = self.report.warnings.len(),
            "extract complete"
        );
        Ok(self.report)
    }

    fn replay(&mut self) -> Result<()> {
        while let Some(header) = self.reader.next_record()? {
            if self.verbose {
                println!("{}: processing", header.path);
            }

            if !self.stripped_parents && path::has_leading_parent(&header.path) {
                self.stripped_parents = true;
                tracing::warn!(path = %header.path, "removing leading `..` from archived paths");
            }

            let target =
                path::resolve(&self.dest, &header.path).map_err(|source| Error::UnsafePath {
                    path: header.path.clone(),
                    source,
                })?;

            match header.kind() {
                EntryKind::Directory => self.create_directory(&target, header.meta.mode),
                EntryKind::RegularFile => self.create_file(&target, &header)?,
                EntryKind::Other => {
                    return Err(Error::CorruptRecord {
                        path: header.path,
                        reason: "entry kind cannot be extracted".into(),
                    })
                }
            }
            self.report.records += 1;
        }

        Ok(())
    }

    fn create_directory(&mut self, target: &Path, mode: u32) {
        let mut builder = fs::DirBuilder::new();

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode | 0o700);
        }

        match builder.create(target) {
            Ok(()) => {
                self.report.directories += 1;
                if mode & 0o700 != 0o700 {
                    self.deferred_modes.push((target.to_path_buf(), mode));
                }
            }
            Err(source) => self.report.warn(Error::CreateDirectory {
                path: target.to_path_buf(),
                source,
            }),
        }
    }

    /// Streams the record's content into a sibling partial file and renames
    /// it over `target` once complete, so a failed record never touches an
    /// existing file at `target`.
    fn create_file(&mut self, target: &Path, header: &RecordHeader) -> Result<()> {
        let partial = partial_path(target);

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(header.meta.mode);
        }

        let file = options.open(&partial).map_err(|source| Error::WriteFile {
            path: target.to_path_buf(),
            source,
        })?;
        let mut out = BufWriter::new(file);

        let result = self
            .reader
            .copy_content(&mut out, target)
            .and_then(|copied| {
                out.flush().map_err(|source| Error::WriteFile {
                    path: target.to_path_buf(),
                    source,
                })?;
                Ok(copied)
            });
        drop(out);

        let copied = match result {
            Ok(copied) => copied,
            Err(e) => {
                self.discard_partial(&partial);
                return Err(e);
            }
        };

        if let Err(source) = fs::rename(&partial, target) {
            self.discard_partial(&partial);
            return Err(Error::WriteFile {
                path: target.to_path_buf(),
                source,
            });
        }

        self.report.files += 1;
        self.report.bytes += copied;
        Ok(())
    }

    fn discard_partial(&mut self, partial: &Path) {
        if let Err(source) = fs::remove_file(partial) {
            self.report.warn(Error::RemovePartial {
                path: partial.to_path_buf(),
                source,
            });
        }
    }

    #[cfg(unix)]
    fn apply_deferred_modes(&mut self) {
        use std::os::unix::fs::PermissionsExt;

        // Deepest first, so restricting a parent never blocks a child.
        while let Some((target, mode)) = self.deferred_modes.pop() {
            if let Err(source) = fs::set_permissions(&target, fs::Permissions::from_mode(mode)) {
                self.report.warn(Error::CreateDirectory {
                    path: target,
                    source,
                });
            }
        }
    }

    #[cfg(not(unix))]
    fn apply_deferred_modes(&mut self) {
        self.deferred_modes.clear();
    }
}

/// `dir/name` becomes `dir/.name.dirpack-partial`.
fn partial_path(target: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = target.file_name() {
        name.push(file_name);
    }
    name.push(".dirpack-partial");
    target.with_file_name(name)
}
