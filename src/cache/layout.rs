//! On-disk cache layout
//!
//! ```text
//! <root>/<host>/<owner>/<repo>/git/     bare clone
//! <root>/<host>/<owner>/<repo>/<tag>/   extracted snapshot of one version
//! ```
//!
//! Every path is composed with [`safe_join`], so neither a crafted reference
//! nor a hostile tag name can point outside the root.

use crate::cache::paths::{absolute, safe_join, safe_join_strict};
use crate::error::{AilloyError, AilloyResult};
use crate::mold::reference::Reference;
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Manifest file names that mark a directory as a mold
pub const MANIFEST_FILES: [&str; 2] = ["mold.yaml", "ingot.yaml"];

/// Name of the bare clone directory inside each repository directory
pub const BARE_CLONE_DIR: &str = "git";

/// Path of the manifest in `dir`, if it has one
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    MANIFEST_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// One cached repository and the versions extracted from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedMold {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub versions: Vec<String>,
    pub path: PathBuf,
}

impl CachedMold {
    /// `host/owner/repo`
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.host, self.owner, self.repo)
    }
}

/// Path computation and housekeeping for one cache root
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Use `root` as the cache directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<home>/.ailloy/cache`
    pub fn default_root() -> AilloyResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".ailloy").join("cache"))
            .ok_or(AilloyError::NoHomeDir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<host>/<owner>/<repo>`
    pub fn repo_dir(&self, reference: &Reference) -> AilloyResult<PathBuf> {
        let rel = Path::new(&reference.host)
            .join(&reference.owner)
            .join(&reference.repo);
        safe_join_strict(&self.root, rel)
    }

    /// `<root>/<host>/<owner>/<repo>/git`
    pub fn bare_clone_dir(&self, reference: &Reference) -> AilloyResult<PathBuf> {
        let repo_dir = self.repo_dir(reference)?;
        safe_join_strict(&repo_dir, BARE_CLONE_DIR)
    }

    /// `<root>/<host>/<owner>/<repo>/<tag>`
    pub fn version_dir(&self, reference: &Reference, tag: &str) -> AilloyResult<PathBuf> {
        let repo_dir = self.repo_dir(reference)?;
        let dir = safe_join_strict(&repo_dir, tag)?;
        // Nothing may land on or below the bare clone
        let first = dir
            .strip_prefix(&repo_dir)
            .ok()
            .and_then(|rel| rel.components().next());
        if first == Some(Component::Normal(OsStr::new(BARE_CLONE_DIR))) {
            return Err(AilloyError::PathEscape {
                path: dir,
                root: repo_dir,
            });
        }
        Ok(dir)
    }

    /// Whether the snapshot for `tag` (at the reference's subpath) holds a manifest
    pub fn is_cached(&self, reference: &Reference, tag: &str) -> bool {
        let Ok(dir) = self.version_dir(reference, tag) else {
            return false;
        };
        let target = match reference.subpath {
            Some(ref subpath) => match safe_join(&dir, subpath) {
                Ok(path) => path,
                Err(_) => return false,
            },
            None => dir,
        };
        find_manifest(&target).is_some()
    }

    /// Whether a complete snapshot of `tag` exists, i.e. its version
    /// directory holds a manifest at any depth. Such a snapshot is never
    /// rewritten, whichever subpath is asked for.
    pub fn has_snapshot(&self, reference: &Reference, tag: &str) -> bool {
        self.version_dir(reference, tag)
            .is_ok_and(|dir| contains_manifest(&dir))
    }

    /// Enumerate cached repositories and their snapshots.
    ///
    /// Repositories nested below the owner (`gitlab.com/acme/group/widget`)
    /// are found by their `git/` bare clone. Versions are the directories
    /// directly inside a repository, so a tag containing `/` such as
    /// `release/1.0` is reported by its first component (`release`).
    ///
    /// A missing root is an empty cache.
    pub fn list(&self) -> AilloyResult<Vec<CachedMold>> {
        let mut molds = Vec::new();
        for (host, host_path) in subdirs(&self.root)? {
            for (owner, owner_path) in subdirs(&host_path)? {
                let mut repos = Vec::new();
                find_repos(&owner_path, &owner_path, &mut repos)?;
                for (repo, repo_path) in repos {
                    let versions = subdirs(&repo_path)?
                        .into_iter()
                        .map(|(name, _)| name)
                        .filter(|name| name != BARE_CLONE_DIR)
                        .collect();
                    molds.push(CachedMold {
                        host: host.clone(),
                        owner: owner.clone(),
                        repo,
                        versions,
                        path: repo_path,
                    });
                }
            }
        }
        Ok(molds)
    }

    /// Remove everything cached for one repository.
    ///
    /// Returns `false` if nothing was cached.
    pub fn clean(&self, reference: &Reference) -> AilloyResult<bool> {
        let target = self.repo_dir(reference)?;
        if !target.exists() {
            return Ok(false);
        }
        info!("Removing cached mold {}", target.display());
        fs::remove_dir_all(&target)
            .map_err(|e| AilloyError::io(format!("removing {}", target.display()), e))?;
        Ok(true)
    }

    /// Remove every entry under the cache root, keeping the root itself.
    ///
    /// Returns the number of top-level entries removed.
    pub fn clean_all(&self) -> AilloyResult<usize> {
        let root = absolute(&self.root)?;
        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AilloyError::io(format!("reading {}", root.display()), e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry =
                entry.map_err(|e| AilloyError::io(format!("reading {}", root.display()), e))?;
            let target = safe_join_strict(&root, entry.file_name())?;
            debug!("Removing {}", target.display());
            let result = if entry.path().is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            result.map_err(|e| AilloyError::io(format!("removing {}", target.display()), e))?;
            removed += 1;
        }
        info!("Cleared {} cache entries from {}", removed, root.display());
        Ok(removed)
    }
}

/// Collect repository directories below `dir`, named relative to `owner_dir`.
///
/// A directory with a bare clone is a repository. So is one with no bare
/// clone anywhere below it (snapshots left after the clone was removed).
fn find_repos(
    owner_dir: &Path,
    dir: &Path,
    out: &mut Vec<(String, PathBuf)>,
) -> AilloyResult<()> {
    for (_, path) in subdirs(dir)? {
        if path.join(BARE_CLONE_DIR).is_dir() || !has_nested_clone(&path)? {
            let name = path
                .strip_prefix(owner_dir)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            out.push((name, path));
        } else {
            find_repos(owner_dir, &path, out)?;
        }
    }
    Ok(())
}

fn has_nested_clone(dir: &Path) -> AilloyResult<bool> {
    for (_, path) in subdirs(dir)? {
        if path.join(BARE_CLONE_DIR).is_dir() || has_nested_clone(&path)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether `dir` or any directory below it holds a manifest. Symlinks are
/// not followed and unreadable directories count as empty.
fn contains_manifest(dir: &Path) -> bool {
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        if find_manifest(&current).is_some() {
            return true;
        }
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                stack.push(entry.path());
            }
        }
    }
    false
}

/// Visible subdirectories of `dir`, sorted by name. Dot-directories (staging
/// areas) are skipped; a missing `dir` yields nothing.
fn subdirs(dir: &Path) -> AilloyResult<Vec<(String, PathBuf)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AilloyError::io(format!("reading {}", dir.display()), e)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AilloyError::io(format!("reading {}", dir.display()), e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !path.is_dir() {
            continue;
        }
        found.push((name, path));
    }
    found.sort();
    Ok(found)
}
