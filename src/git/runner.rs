//! Git capability interface
//!
//! The resolver and fetcher only ever talk to git through this trait, so they
//! can be exercised against a fake without network or subprocess access.

use crate::error::AilloyResult;
use async_trait::async_trait;
use std::path::Path;

/// The git operations the mold engine needs
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// `git ls-remote --tags <url>` output
    async fn ls_remote_tags(&self, url: &str) -> AilloyResult<String>;

    /// `git ls-remote` output for `refs/heads/<branch>` only
    async fn ls_remote_branch(&self, url: &str, branch: &str) -> AilloyResult<String>;

    /// Create a bare clone of `url` at `dest`
    async fn clone_bare(&self, url: &str, dest: &Path) -> AilloyResult<()>;

    /// Refresh all branches and tags of an existing bare clone
    async fn fetch_all(&self, repo: &Path) -> AilloyResult<()>;

    /// Tar archive of `treeish` from the bare clone at `repo`
    async fn archive(&self, repo: &Path, treeish: &str) -> AilloyResult<Vec<u8>>;
}
