//! End-to-end tests: archive real directory trees, then list and extract them.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use dirpack_format::{
    run_extract, run_list, Archiver, EntryKind, Error, Extractor, RecordHeader,
};
use tempfile::TempDir;

/// Builds `root/a.txt` ("hi\n") and `root/sub/b.txt` (empty) under a fresh temp dir.
fn sample_tree() -> TempDir {
    let base = TempDir::new().unwrap();
    let root = base.path().join("root");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), b"hi\n").unwrap();
    fs::write(root.join("sub").join("b.txt"), b"").unwrap();
    base
}

fn archive(base: &Path, root: &str) -> Vec<u8> {
    let mut out = vec![];
    Archiver::new(&mut out)
        .base_dir(base)
        .archive(root)
        .unwrap();
    out
}

/// Encodes a bare record header: path token, newline and metadata block.
fn raw_header(path: &str, kind: u8, mode: u32, size: u64) -> Vec<u8> {
    let mut bytes = format!("{}\n", path).into_bytes();
    bytes.push(kind);
    bytes.extend_from_slice(&mode.to_le_bytes());
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes.extend_from_slice(&0i64.to_le_bytes());
    bytes
}

fn position(records: &[RecordHeader], path: &str) -> usize {
    records
        .iter()
        .position(|r| r.path() == path)
        .unwrap_or_else(|| panic!("no record for {}", path))
}

#[test]
fn records_are_pre_order() {
    let base = sample_tree();
    let bytes = archive(base.path(), "root");
    let records = run_list(Cursor::new(bytes)).unwrap();

    let paths: Vec<&str> = records.iter().map(|r| r.path()).collect();
    assert_eq!(records.len(), 4, "{:?}", paths);
    assert_eq!(paths[0], "root");

    let sub = position(&records, "root/sub");
    let b = position(&records, "root/sub/b.txt");
    let a = position(&records, "root/a.txt");
    assert_eq!(b, sub + 1);
    assert!(a > 0);

    assert_eq!(records[0].kind(), EntryKind::Directory);
    assert_eq!(records[sub].kind(), EntryKind::Directory);
    assert_eq!(records[a].kind(), EntryKind::RegularFile);
    assert_eq!(records[a].meta.size, 3);
    assert_eq!(records[b].kind(), EntryKind::RegularFile);
    assert_eq!(records[b].meta.size, 0);
}

#[test]
fn stream_layout_of_a_file_record() {
    let base = TempDir::new().unwrap();
    fs::create_dir(base.path().join("only")).unwrap();
    fs::write(base.path().join("only").join("a.txt"), b"hi\n").unwrap();

    let bytes = archive(base.path(), "only");

    // "only\n" + 21-byte block, then "only/a.txt\n" + block + "hi\n".
    assert_eq!(&bytes[..5], b"only\n");
    assert_eq!(bytes[5], 0x01);
    let file = 5 + 21;
    assert_eq!(&bytes[file..file + 11], b"only/a.txt\n");
    assert_eq!(bytes[file + 11], 0x02);
    assert_eq!(&bytes[file + 11 + 5..file + 11 + 13], &3u64.to_le_bytes());
    assert_eq!(&bytes[bytes.len() - 3..], b"hi\n");
    assert_eq!(bytes.len(), file + 11 + 21 + 3);
}

#[test]
fn round_trip_restores_tree() {
    let base = sample_tree();
    let bytes = archive(base.path(), "root");

    let dest = TempDir::new().unwrap();
    let report = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract()
        .unwrap();

    assert_eq!(report.directories, 2);
    assert_eq!(report.files, 2);
    assert_eq!(report.bytes, 3);
    assert!(report.warnings.is_empty());

    let root = dest.path().join("root");
    assert!(root.is_dir());
    assert!(root.join("sub").is_dir());
    assert_eq!(fs::read(root.join("a.txt")).unwrap(), b"hi\n");
    assert_eq!(fs::read(root.join("sub").join("b.txt")).unwrap(), b"");
}

#[test]
fn round_trip_larger_than_copy_buffer() {
    let base = TempDir::new().unwrap();
    let root = base.path().join("big");
    fs::create_dir(&root).unwrap();
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(root.join("blob.bin"), &data).unwrap();
    fs::write(root.join("tail.txt"), b"after the blob").unwrap();

    let bytes = archive(base.path(), "big");
    let dest = TempDir::new().unwrap();
    Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract()
        .unwrap();

    assert_eq!(fs::read(dest.path().join("big/blob.bin")).unwrap(), data);
    assert_eq!(
        fs::read(dest.path().join("big/tail.txt")).unwrap(),
        b"after the blob"
    );
}

#[test]
fn trailing_separator_on_root_is_dropped() {
    let base = sample_tree();
    let bytes = archive(base.path(), "root//");
    let records = run_list(Cursor::new(bytes)).unwrap();
    assert_eq!(records[0].path(), "root");
    assert!(records.iter().all(|r| !r.path().contains("//")));
}

#[test]
fn dot_root_has_no_record_of_its_own() {
    let base = sample_tree();
    let bytes = archive(&base.path().join("root"), ".");
    let records = run_list(Cursor::new(bytes)).unwrap();

    let mut paths: Vec<&str> = records.iter().map(|r| r.path()).collect();
    paths.sort();
    assert_eq!(paths, vec!["./a.txt", "./sub", "./sub/b.txt"]);

    let bytes = archive(&base.path().join("root"), ".");
    let dest = TempDir::new().unwrap();
    Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract()
        .unwrap();
    assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"hi\n");
    assert!(dest.path().join("sub/b.txt").is_file());
}

#[test]
fn nested_root_keeps_full_path() {
    let base = sample_tree();
    let bytes = archive(base.path(), "root/sub");
    let records = run_list(Cursor::new(bytes)).unwrap();
    let paths: Vec<&str> = records.iter().map(|r| r.path()).collect();
    assert_eq!(paths, vec!["root/sub", "root/sub/b.txt"]);
}

#[cfg(unix)]
#[test]
fn symlinks_are_skipped() {
    let base = sample_tree();
    let root = base.path().join("root");
    std::os::unix::fs::symlink(root.join("a.txt"), root.join("link.txt")).unwrap();
    std::os::unix::fs::symlink(root.join("sub"), root.join("link-dir")).unwrap();

    let mut out = vec![];
    let report = Archiver::new(&mut out)
        .base_dir(base.path())
        .archive("root")
        .unwrap();
    assert_eq!(report.records, 4);
    assert_eq!(report.skipped, 2);
    assert!(report.warnings.is_empty());

    let records = run_list(Cursor::new(&out)).unwrap();
    assert!(records.iter().all(|r| !r.path().contains("link")));

    let dest = TempDir::new().unwrap();
    Extractor::new(Cursor::new(out))
        .dest(dest.path())
        .extract()
        .unwrap();
    assert!(!dest.path().join("root/link.txt").exists());
    assert!(!dest.path().join("root/link-dir").exists());
}

#[test]
fn unencodable_names_are_skipped_with_a_warning() {
    let base = sample_tree();
    let root = base.path().join("root");
    fs::write(root.join("two words.txt"), b"x").unwrap();
    fs::create_dir(root.join("spaced dir")).unwrap();
    fs::write(root.join("spaced dir").join("inner.txt"), b"y").unwrap();

    let mut out = vec![];
    let report = Archiver::new(&mut out)
        .base_dir(base.path())
        .archive("root")
        .unwrap();

    assert_eq!(report.records, 4);
    assert_eq!(report.warnings.len(), 2);
    assert!(report
        .warnings
        .iter()
        .all(|w| matches!(w, Error::InvalidPath { .. })));

    let records = run_list(Cursor::new(out)).unwrap();
    assert!(records.iter().all(|r| !r.path().contains("inner")));
}

#[test]
fn missing_root_is_fatal() {
    let base = TempDir::new().unwrap();
    let mut out = vec![];
    let result = Archiver::new(&mut out).base_dir(base.path()).archive("nope");
    match result {
        Err(Error::Stat { path, .. }) => assert_eq!(path, base.path().join("nope")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(out.is_empty());
}

#[test]
fn file_root_cannot_be_opened_as_directory() {
    let base = TempDir::new().unwrap();
    fs::write(base.path().join("plain.txt"), b"x").unwrap();

    let mut out = vec![];
    let result = Archiver::new(&mut out)
        .base_dir(base.path())
        .archive("plain.txt");
    assert!(matches!(result, Err(Error::DirOpen { .. })));
    assert!(out.is_empty());
}

#[test]
fn empty_stream_extracts_nothing() {
    let dest = TempDir::new().unwrap();
    let report = Extractor::new(Cursor::new(Vec::new()))
        .dest(dest.path())
        .extract()
        .unwrap();
    assert_eq!(report.records, 0);
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);

    let report = run_extract(&b""[..], false).unwrap();
    assert_eq!(report.records, 0);
    assert!(run_list(&b""[..]).unwrap().is_empty());
}

#[test]
fn truncated_metadata_creates_nothing() {
    let base = sample_tree();
    let bytes = archive(base.path(), "root");
    let cut = b"root\n".len() + 10;

    let dest = TempDir::new().unwrap();
    let result = Extractor::new(Cursor::new(bytes[..cut].to_vec()))
        .dest(dest.path())
        .extract();

    match result {
        Err(Error::TruncatedArchive { path }) => assert_eq!(path, "root"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[test]
fn truncated_content_removes_partial_file() {
    let base = TempDir::new().unwrap();
    fs::create_dir(base.path().join("t")).unwrap();
    fs::write(base.path().join("t").join("data.bin"), vec![7u8; 100]).unwrap();

    let bytes = archive(base.path(), "t");
    let cut = bytes.len() - 40;

    let dest = TempDir::new().unwrap();
    let result = Extractor::new(Cursor::new(bytes[..cut].to_vec()))
        .dest(dest.path())
        .extract();

    match result {
        Err(Error::TruncatedArchive { path }) => assert_eq!(path, "t/data.bin"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(dest.path().join("t").is_dir());
    assert!(!dest.path().join("t/data.bin").exists());
}

#[test]
fn undersized_record_fails_on_next_token() {
    // Claims one byte of content but three follow; the leftover "i\n" is read
    // as the next path token and the stream ends inside its metadata block.
    let mut bytes = b"f\n".to_vec();
    bytes.push(0x02);
    bytes.extend_from_slice(&0o644u32.to_le_bytes());
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&0i64.to_le_bytes());
    bytes.extend_from_slice(b"hi\n");

    let dest = TempDir::new().unwrap();
    let result = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract();

    match result {
        Err(Error::TruncatedArchive { path }) => assert_eq!(path, "i"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(fs::read(dest.path().join("f")).unwrap(), b"h");
}

#[test]
fn existing_directory_is_a_warning() {
    let base = sample_tree();
    let bytes = archive(base.path(), "root");

    let dest = TempDir::new().unwrap();
    fs::create_dir_all(dest.path().join("root/sub")).unwrap();

    let report = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract()
        .unwrap();

    assert_eq!(report.warnings.len(), 2);
    assert!(report
        .warnings
        .iter()
        .all(|w| matches!(w, Error::CreateDirectory { .. })));
    assert_eq!(report.records, 4);
    assert_eq!(report.directories, 0);
    assert_eq!(report.files, 2);
    assert_eq!(fs::read(dest.path().join("root/a.txt")).unwrap(), b"hi\n");
}

#[test]
fn escaping_paths_are_refused() {
    let outer = TempDir::new().unwrap();
    let dest = outer.path().join("dest");
    fs::create_dir(&dest).unwrap();

    let bytes = raw_header("root/../../evil", 0x01, 0o755, 0);
    let result = Extractor::new(Cursor::new(bytes)).dest(&dest).extract();

    assert!(matches!(result, Err(Error::UnsafePath { .. })));
    assert!(!outer.path().join("evil").exists());
    assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
}

#[test]
fn parent_relative_root_round_trips() {
    let base = sample_tree();
    let cwd = base.path().join("cwd");
    fs::create_dir(&cwd).unwrap();

    let bytes = archive(&cwd, "../root");
    let records = run_list(Cursor::new(&bytes)).unwrap();
    assert_eq!(records[0].path(), "../root");

    let dest = TempDir::new().unwrap();
    let report = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract()
        .unwrap();

    assert_eq!(report.records, 4);
    assert!(report.warnings.is_empty());
    assert_eq!(fs::read(dest.path().join("root/a.txt")).unwrap(), b"hi\n");
    assert!(dest.path().join("root/sub/b.txt").is_file());
}

#[test]
fn root_with_inner_parent_is_refused() {
    let base = sample_tree();
    fs::create_dir(base.path().join("cwd")).unwrap();

    let mut out = vec![];
    let result = Archiver::new(&mut out)
        .base_dir(base.path())
        .archive("cwd/../root");

    assert!(matches!(result, Err(Error::InvalidPath { .. })));
    assert!(out.is_empty());
}

#[test]
fn truncated_content_keeps_existing_file() {
    let mut bytes = raw_header("t", 0x01, 0o755, 0);
    bytes.extend(raw_header("t/data.bin", 0x02, 0o644, 100));
    bytes.extend_from_slice(&[7u8; 60]);

    let dest = TempDir::new().unwrap();
    fs::create_dir(dest.path().join("t")).unwrap();
    fs::write(dest.path().join("t/data.bin"), b"precious user data").unwrap();

    let result = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract();

    match result {
        Err(Error::TruncatedArchive { path }) => assert_eq!(path, "t/data.bin"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(
        fs::read(dest.path().join("t/data.bin")).unwrap(),
        b"precious user data"
    );
    assert_eq!(fs::read_dir(dest.path().join("t")).unwrap().count(), 1);
}

#[test]
fn complete_file_replaces_existing_file() {
    let mut bytes = raw_header("data.bin", 0x02, 0o644, 3);
    bytes.extend_from_slice(b"new");

    let dest = TempDir::new().unwrap();
    fs::write(dest.path().join("data.bin"), b"old contents").unwrap();

    let report = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract()
        .unwrap();

    assert_eq!(report.files, 1);
    assert_eq!(fs::read(dest.path().join("data.bin")).unwrap(), b"new");
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 1);
}

#[cfg(unix)]
#[test]
fn restricted_directory_modes_are_restored_last() {
    use std::os::unix::fs::PermissionsExt;

    let base = sample_tree();
    let sub = base.path().join("root/sub");
    fs::set_permissions(&sub, fs::Permissions::from_mode(0o555)).unwrap();

    let bytes = archive(base.path(), "root");
    fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();

    let dest = TempDir::new().unwrap();
    let report = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract()
        .unwrap();
    assert!(report.warnings.is_empty());

    let restored = dest.path().join("root/sub");
    assert!(restored.join("b.txt").is_file());
    let mode = fs::metadata(&restored).unwrap().permissions().mode() & 0o7777;
    assert_eq!(mode, 0o555);

    fs::set_permissions(&restored, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn restricted_directory_modes_survive_a_fatal_error() {
    use std::os::unix::fs::PermissionsExt;

    let mut bytes = raw_header("locked", 0x01, 0o555, 0);
    bytes.extend(raw_header("locked/f", 0x02, 0o644, 10));
    bytes.extend_from_slice(b"abc");

    let dest = TempDir::new().unwrap();
    let result = Extractor::new(Cursor::new(bytes))
        .dest(dest.path())
        .extract();
    assert!(matches!(result, Err(Error::TruncatedArchive { .. })));

    let locked = dest.path().join("locked");
    let mode = fs::metadata(&locked).unwrap().permissions().mode() & 0o7777;
    assert_eq!(mode, 0o555);
    assert_eq!(fs::read_dir(&locked).unwrap().count(), 0);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}
