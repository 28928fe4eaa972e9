//! Read-only view of a fetched mold

use crate::cache::{find_manifest, safe_join};
use crate::error::{AilloyError, AilloyResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A validated mold directory inside the cache.
///
/// Only read access is offered, and every relative path is confined to the
/// root; the snapshot behind it is shared by every project using that version.
#[derive(Debug, Clone)]
pub struct MoldView {
    root: PathBuf,
    manifest: PathBuf,
}

impl MoldView {
    /// Open `root`, which must contain a manifest.
    pub fn open(root: impl Into<PathBuf>) -> AilloyResult<Self> {
        let root = root.into();
        let manifest =
            find_manifest(&root).ok_or_else(|| AilloyError::ManifestNotFound { path: root.clone() })?;
        Ok(Self { root, manifest })
    }

    /// Directory the view is rooted at
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of `mold.yaml` or `ingot.yaml`
    pub fn manifest_path(&self) -> &Path {
        &self.manifest
    }

    /// Contents of the manifest file
    pub fn manifest(&self) -> AilloyResult<String> {
        fs::read_to_string(&self.manifest)
            .map_err(|e| AilloyError::io(format!("reading {}", self.manifest.display()), e))
    }

    /// Whether `rel` exists inside the view. Escaping paths never exist.
    pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
        safe_join(&self.root, rel).is_ok_and(|path| path.exists())
    }

    pub fn read(&self, rel: impl AsRef<Path>) -> AilloyResult<Vec<u8>> {
        let path = safe_join(&self.root, rel)?;
        fs::read(&path).map_err(|e| AilloyError::io(format!("reading {}", path.display()), e))
    }

    pub fn read_to_string(&self, rel: impl AsRef<Path>) -> AilloyResult<String> {
        let path = safe_join(&self.root, rel)?;
        fs::read_to_string(&path)
            .map_err(|e| AilloyError::io(format!("reading {}", path.display()), e))
    }

    /// All regular files below the root, relative and sorted
    pub fn files(&self) -> AilloyResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let entries = fs::read_dir(&dir)
                .map_err(|e| AilloyError::io(format!("reading {}", dir.display()), e))?;
            for entry in entries {
                let entry =
                    entry.map_err(|e| AilloyError::io(format!("reading {}", dir.display()), e))?;
                let file_type = entry
                    .file_type()
                    .map_err(|e| AilloyError::io(format!("reading {}", dir.display()), e))?;
                let path = entry.path();
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        files.push(rel.to_path_buf());
                    }
                }
            }
        }
        files.sort();
        Ok(files)
    }
}
