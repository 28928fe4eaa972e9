//! Mold resolution entry point
//!
//! Parses a reference, reuses a lock file pin when allowed, otherwise asks
//! the remote, fetches into the cache, and records the result in the lock
//! file. Lock file problems are logged and never fail a resolution.

use crate::cache::CacheLayout;
use crate::error::{AilloyError, AilloyResult};
use crate::git::GitRunner;
use crate::mold::fetch::Fetcher;
use crate::mold::lockfile::{LockEntry, LockFile, LOCKFILE_NAME};
use crate::mold::reference::Reference;
use crate::mold::version::{resolve_version, ResolvedVersion};
use crate::mold::view::MoldView;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything known about a finished resolution
#[derive(Debug, Clone)]
pub struct ResolvedMold {
    pub reference: Reference,
    pub version: ResolvedVersion,
    /// Whether the version came from the lock file rather than the remote
    pub locked: bool,
    pub view: MoldView,
}

/// Resolves references against one cache root and one lock file
pub struct MoldResolver {
    layout: CacheLayout,
    git: Arc<dyn GitRunner>,
    lock_path: Option<PathBuf>,
}

impl MoldResolver {
    /// Resolver using `ailloy.lock` in the current directory
    pub fn new(layout: CacheLayout, git: Arc<dyn GitRunner>) -> Self {
        Self {
            layout,
            git,
            lock_path: Some(PathBuf::from(LOCKFILE_NAME)),
        }
    }

    /// Use a different lock file
    pub fn with_lockfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    /// Never read or write a lock file
    pub fn without_lockfile(mut self) -> Self {
        self.lock_path = None;
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn lock_path(&self) -> Option<&Path> {
        self.lock_path.as_deref()
    }

    /// Resolve `raw` and return a read-only view of the mold.
    pub async fn resolve(&self, raw: &str) -> AilloyResult<MoldView> {
        Ok(self.resolve_detailed(raw).await?.view)
    }

    /// Like [`resolve`](Self::resolve), also reporting the pinned version.
    pub async fn resolve_detailed(&self, raw: &str) -> AilloyResult<ResolvedMold> {
        let reference = Reference::parse(raw)?;
        let source = reference.cache_key();

        let pinned = self
            .read_lock()
            .and_then(|lock| lock.find_entry(&source).cloned())
            .filter(|entry| entry.satisfies(&reference));

        let (version, locked) = match pinned {
            Some(entry) => {
                debug!("Using locked {}@{} ({})", source, entry.version, entry.commit);
                (
                    ResolvedVersion {
                        tag: entry.version,
                        commit: entry.commit,
                    },
                    true,
                )
            }
            None => (resolve_version(&reference, self.git.as_ref()).await?, false),
        };

        let view = Fetcher::new(&self.layout, self.git.as_ref())
            .fetch(&reference, &version)
            .await?;
        info!("Resolved {} to {} at {}", reference, version.tag, version.commit);

        self.record(&reference, &version).await;

        Ok(ResolvedMold {
            reference,
            version,
            locked,
            view,
        })
    }

    /// Best-effort lock file read
    fn read_lock(&self) -> Option<LockFile> {
        let path = self.lock_path.as_deref()?;
        match LockFile::read(path) {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Ignoring lock file: {}", e);
                None
            }
        }
    }

    /// Best-effort lock file update
    async fn record(&self, reference: &Reference, version: &ResolvedVersion) {
        let Some(path) = self.lock_path.clone() else {
            return;
        };
        let entry = LockEntry {
            name: reference.name().to_string(),
            source: reference.cache_key(),
            version: version.tag.clone(),
            commit: version.commit.clone(),
            subpath: reference.subpath.clone(),
            timestamp: Utc::now(),
        };

        let result = tokio::task::spawn_blocking(move || {
            LockFile::update(&path, |lock| lock.upsert_entry(entry))
        })
        .await
        .unwrap_or_else(|e| Err(AilloyError::Internal(format!("lock update task failed: {}", e))));

        if let Err(e) = result {
            warn!("Lock file not updated: {}", e);
        }
    }
}
