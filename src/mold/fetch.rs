//! Materializing a resolved version in the cache
//!
//! 1. Make sure the bare clone exists (clone) or is current (fetch).
//! 2. Make sure the version snapshot exists; if not, archive the tag from the
//!    bare clone and extract it.
//! 3. Walk into the subpath and check for a manifest.
//!
//! Snapshots are extracted into a hidden staging directory and renamed into
//! place, so a valid-looking snapshot is always complete. Once a snapshot
//! holds a manifest anywhere it is never archived, extracted, or replaced
//! again, even when a different subpath of it turns out to be missing.

use crate::cache::{extract_tar, safe_join, CacheLayout};
use crate::error::{AilloyError, AilloyResult};
use crate::git::GitRunner;
use crate::mold::reference::Reference;
use crate::mold::version::ResolvedVersion;
use crate::mold::view::MoldView;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Marker file present in every complete bare clone
const BARE_CLONE_MARKER: &str = "HEAD";

/// Fetches resolved versions into a cache
pub struct Fetcher<'a> {
    layout: &'a CacheLayout,
    git: &'a dyn GitRunner,
}

impl<'a> Fetcher<'a> {
    pub fn new(layout: &'a CacheLayout, git: &'a dyn GitRunner) -> Self {
        Self { layout, git }
    }

    /// Ensure `resolved` is cached and return a view of its (sub)directory.
    pub async fn fetch(
        &self,
        reference: &Reference,
        resolved: &ResolvedVersion,
    ) -> AilloyResult<MoldView> {
        self.ensure_bare_clone(reference).await?;
        let version_dir = self.ensure_snapshot(reference, resolved).await?;

        let target = match reference.subpath {
            Some(ref subpath) => safe_join(&version_dir, subpath)?,
            None => version_dir,
        };
        if !target.is_dir() {
            return Err(AilloyError::ManifestNotFound { path: target });
        }
        MoldView::open(target)
    }

    async fn ensure_bare_clone(&self, reference: &Reference) -> AilloyResult<PathBuf> {
        let dir = self.layout.bare_clone_dir(reference)?;

        if dir.join(BARE_CLONE_MARKER).is_file() {
            info!("Updating {}", reference.cache_key());
            self.git.fetch_all(&dir).await?;
            return Ok(dir);
        }

        // Leftovers from an interrupted clone would make git refuse the target
        if dir.exists() {
            debug!("Removing incomplete bare clone {}", dir.display());
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| AilloyError::io(format!("removing {}", dir.display()), e))?;
        }
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AilloyError::io(format!("creating {}", parent.display()), e))?;
        }

        info!("Cloning {}", reference.clone_url());
        self.git.clone_bare(&reference.clone_url(), &dir).await?;
        Ok(dir)
    }

    async fn ensure_snapshot(
        &self,
        reference: &Reference,
        resolved: &ResolvedVersion,
    ) -> AilloyResult<PathBuf> {
        let version_dir = self.layout.version_dir(reference, &resolved.tag)?;
        if self.layout.has_snapshot(reference, &resolved.tag) {
            debug!("Cache hit: {}", version_dir.display());
            return Ok(version_dir);
        }

        let bare = self.layout.bare_clone_dir(reference)?;
        info!("Extracting {}@{}", reference.cache_key(), resolved.tag);
        let bytes = self.git.archive(&bare, &resolved.tag).await?;

        let staging = self
            .layout
            .repo_dir(reference)?
            .join(format!(".staging-{}", Uuid::new_v4().simple()));
        let dest = staging.clone();
        let extracted = tokio::task::spawn_blocking(move || extract_tar(&bytes, &dest))
            .await
            .map_err(|e| AilloyError::Internal(format!("extraction task failed: {}", e)))?;
        if let Err(e) = extracted {
            discard(&staging).await;
            return Err(e);
        }

        // Another process may have finished the same snapshot meanwhile
        if self.layout.has_snapshot(reference, &resolved.tag) {
            debug!("Snapshot appeared while extracting: {}", version_dir.display());
            discard(&staging).await;
            return Ok(version_dir);
        }
        if let Err(e) = promote(&staging, &version_dir).await {
            discard(&staging).await;
            return Err(e);
        }
        Ok(version_dir)
    }
}

/// Move a finished staging directory to its final snapshot location,
/// replacing a stale directory that holds no manifest.
async fn promote(staging: &Path, version_dir: &Path) -> AilloyResult<()> {
    if fs::try_exists(version_dir).await.unwrap_or(false) {
        fs::remove_dir_all(version_dir)
            .await
            .map_err(|e| AilloyError::io(format!("removing {}", version_dir.display()), e))?;
    }
    // Tags such as `release/1.0` nest one level deeper
    if let Some(parent) = version_dir.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AilloyError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::rename(staging, version_dir).await.map_err(|e| {
        AilloyError::io(
            format!("moving {} to {}", staging.display(), version_dir.display()),
            e,
        )
    })
}

async fn discard(staging: &Path) {
    if let Err(e) = fs::remove_dir_all(staging).await {
        debug!("Could not remove {}: {}", staging.display(), e);
    }
}
