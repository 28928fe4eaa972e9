//! Mold lock file
//!
//! `ailloy.lock` pins every resolved mold to a version and commit so repeated
//! runs reproduce the same snapshot. The file is always read and rewritten as
//! a whole. Concurrent writers are serialized by an advisory lock on a sidecar
//! file, and the new content is renamed into place so readers never see a
//! partial document.

use crate::error::{AilloyError, AilloyResult};
use crate::mold::reference::{Reference, SpecifierKind};
use chrono::{DateTime, Utc};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default lock file name, relative to the project directory
pub const LOCKFILE_NAME: &str = "ailloy.lock";

/// Schema version written to new lock files
pub const API_VERSION: &str = "v1";

/// One pinned mold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub name: String,
    /// Cache key of the origin repository (`host/owner/repo`)
    pub source: String,
    /// Resolved tag, branch, or commit
    pub version: String,
    pub commit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LockEntry {
    /// Whether this pin may be reused for `reference` without asking the remote.
    ///
    /// | kind       | reused                                   |
    /// |------------|------------------------------------------|
    /// | latest     | always                                   |
    /// | constraint | always                                   |
    /// | exact      | when the versions match, `v` ignored     |
    /// | branch     | never                                    |
    /// | sha        | never                                    |
    pub fn satisfies(&self, reference: &Reference) -> bool {
        if self.source != reference.cache_key() {
            return false;
        }
        match reference.kind {
            SpecifierKind::Latest | SpecifierKind::Constraint => true,
            SpecifierKind::Exact => strip_v(&self.version) == strip_v(&reference.version),
            SpecifierKind::Branch | SpecifierKind::Sha => false,
        }
    }
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// The whole lock document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    pub api_version: String,
    #[serde(default, rename = "molds")]
    pub entries: Vec<LockEntry>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            entries: Vec::new(),
        }
    }
}

impl LockFile {
    /// Read a lock file; `Ok(None)` if it does not exist.
    pub fn read(path: &Path) -> AilloyResult<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AilloyError::LockfileRead {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        let lock = toml::from_str(&content).map_err(|e| AilloyError::LockfileRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Some(lock))
    }

    /// Replace the lock file with this document.
    pub fn write(&self, path: &Path) -> AilloyResult<()> {
        let write_err = |reason: String| AilloyError::LockfileWrite {
            path: path.to_path_buf(),
            reason,
        };

        let content = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        let tmp = sibling(path, &format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, content).map_err(|e| write_err(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            write_err(e.to_string())
        })?;

        debug!("Wrote {} lock entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Entry pinned for `source`
    pub fn find_entry(&self, source: &str) -> Option<&LockEntry> {
        self.entries.iter().find(|e| e.source == source)
    }

    /// Replace the entry with the same source, or append.
    pub fn upsert_entry(&mut self, entry: LockEntry) {
        match self.entries.iter_mut().find(|e| e.source == entry.source) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Drop the entry for `source`, forcing the next resolution to go remote
    pub fn remove_entry(&mut self, source: &str) -> Option<LockEntry> {
        let idx = self.entries.iter().position(|e| e.source == source)?;
        Some(self.entries.remove(idx))
    }

    /// Read, modify, and rewrite the lock file under an exclusive lock.
    ///
    /// A missing file starts out empty. An unreadable one is an error rather
    /// than being silently replaced.
    pub fn update<R>(path: &Path, f: impl FnOnce(&mut LockFile) -> R) -> AilloyResult<R> {
        let guard_path = sibling(path, ".lck");
        let guard = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&guard_path)
            .map_err(|e| AilloyError::LockfileWrite {
                path: guard_path.clone(),
                reason: e.to_string(),
            })?;
        guard
            .lock_exclusive()
            .map_err(|e| AilloyError::LockfileWrite {
                path: guard_path.clone(),
                reason: e.to_string(),
            })?;

        let mut lock = Self::read(path)?.unwrap_or_default();
        let result = f(&mut lock);
        lock.write(path)?;

        // Dropping the handle releases the advisory lock
        drop(guard);
        Ok(result)
    }
}

/// `<dir>/.<file name><suffix>` next to `path`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| LOCKFILE_NAME.to_string());
    path.with_file_name(format!(".{}{}", name, suffix))
}
