//! Validated path composition
//!
//! Every place that joins untrusted input (a subpath, a tar entry name, a
//! reference turned into cache directories) onto a trusted root goes through
//! [`safe_join`]. Paths are normalized lexically; the filesystem is never
//! consulted, so the check holds for paths that do not exist yet.

use crate::error::{AilloyError, AilloyResult};
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute (against the current directory) and lexically clean it.
pub fn absolute(path: &Path) -> AilloyResult<PathBuf> {
    let abs = std::path::absolute(path)
        .map_err(|e| AilloyError::io(format!("resolving {}", path.display()), e))?;
    Ok(normalize(&abs))
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Join `rel` onto `root`, refusing any result outside `root`.
///
/// Leading `/` in `rel` is treated as relative to `root`. The returned path is
/// absolute and normalized; it may be equal to `root` itself.
pub fn safe_join(root: &Path, rel: impl AsRef<Path>) -> AilloyResult<PathBuf> {
    let root = absolute(root)?;
    let rel = rel.as_ref();

    let mut joined = root.clone();
    for component in rel.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                joined.pop();
            }
            Component::Normal(part) => joined.push(part),
        }
    }

    if !joined.starts_with(&root) {
        return Err(AilloyError::PathEscape {
            path: root.join(rel),
            root,
        });
    }
    Ok(joined)
}

/// Like [`safe_join`], but the result must be strictly below `root`.
pub fn safe_join_strict(root: &Path, rel: impl AsRef<Path>) -> AilloyResult<PathBuf> {
    let root_abs = absolute(root)?;
    let joined = safe_join(&root_abs, rel.as_ref())?;
    if joined == root_abs {
        return Err(AilloyError::PathEscape {
            path: joined,
            root: root_abs,
        });
    }
    Ok(joined)
}
