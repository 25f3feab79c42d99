use std::path::{Component, Path, PathBuf};

mod error;

pub use self::error::PathError;

/// The separator written between path components in archived paths.
pub const PATH_SEP: &str = "/";

/// Longest path token a reader will accept, matching `PATH_MAX` on Linux.
pub const MAX_PATH_LEN: usize = 4096;

/// Builds `parent/name`. No normalisation is performed on either half.
///
/// `name` must be a single entry name, never `.` or `..`; see [`is_dot_entry`].
#[inline(always)]
pub fn join(parent: &str, name: &str) -> String {
    let mut out = String::with_capacity(parent.len() + PATH_SEP.len() + name.len());
    out.push_str(parent);
    out.push_str(PATH_SEP);
    out.push_str(name);
    out
}

#[inline(always)]
pub fn is_dot_entry(name: &str) -> bool {
    name == "." || name == ".."
}

/// Strips trailing separators from a root given on the command line.
/// A root made only of separators collapses to a single `/`.
pub fn trim_root(root: &str) -> &str {
    let trimmed = root.trim_end_matches(PATH_SEP);
    if trimmed.is_empty() && !root.is_empty() {
        PATH_SEP
    } else {
        trimmed
    }
}

/// Checks that `path` can be written as a single path token.
pub fn check_token(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    if path.len() > MAX_PATH_LEN {
        return Err(PathError::TooLong(path.len()));
    }

    if path.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(PathError::Whitespace);
    }

    Ok(())
}

/// Maps an archived path onto `dest`.
///
/// Leading separators, `.` and `..` components are dropped so absolute and
/// parent-relative roots are restored underneath `dest`. A `..` that follows
/// a normal component is rejected.
pub fn resolve(dest: &Path, path: &str) -> Result<PathBuf, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let mut out = dest.to_path_buf();
    let mut leading = true;

    for component in Path::new(path).components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir if leading => {}
            Component::ParentDir => return Err(PathError::Escapes),
            Component::Normal(part) => {
                leading = false;
                out.push(part);
            }
        }
    }

    Ok(out)
}

/// Whether `resolve` would drop a `..` from the front of `path`.
pub fn has_leading_parent(path: &str) -> bool {
    Path::new(path)
        .components()
        .find(|c| !matches!(c, Component::CurDir | Component::RootDir | Component::Prefix(_)))
        == Some(Component::ParentDir)
}
