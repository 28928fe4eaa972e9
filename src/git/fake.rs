//! In-memory [`GitRunner`] for tests

use crate::error::{AilloyError, AilloyResult};
use crate::git::runner::GitRunner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tar::{Builder, EntryType, Header};

/// Canned git responses plus a log of every call made
#[derive(Default)]
pub struct FakeGit {
    pub tags: String,
    pub branches: HashMap<String, String>,
    pub archives: HashMap<String, Vec<u8>>,
    pub fail_clone: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, listing: &str) -> Self {
        self.tags = listing.to_string();
        self
    }

    pub fn with_branch(mut self, name: &str, commit: &str) -> Self {
        self.branches.insert(name.to_string(), commit.to_string());
        self
    }

    pub fn with_archive(mut self, treeish: &str, files: &[(&str, &str)]) -> Self {
        self.archives.insert(treeish.to_string(), build_tar(files));
        self
    }

    pub fn failing_clone(mut self) -> Self {
        self.fail_clone = true;
        self
    }

    /// Names of the operations invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    fn record(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }
}

/// Build an uncompressed tar holding `files` as regular entries
pub fn build_tar(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (name, body) in files {
        let mut header = Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        builder
            .append_data(&mut header, name, body.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap()
}

#[async_trait]
impl GitRunner for FakeGit {
    async fn ls_remote_tags(&self, _url: &str) -> AilloyResult<String> {
        self.record("ls_remote_tags");
        Ok(self.tags.clone())
    }

    async fn ls_remote_branch(&self, _url: &str, branch: &str) -> AilloyResult<String> {
        self.record("ls_remote_branch");
        Ok(self
            .branches
            .get(branch)
            .map(|commit| format!("{}\trefs/heads/{}\n", commit, branch))
            .unwrap_or_default())
    }

    async fn clone_bare(&self, url: &str, dest: &Path) -> AilloyResult<()> {
        self.record("clone_bare");
        if self.fail_clone {
            return Err(AilloyError::git(
                format!("clone --bare {}", url),
                "fatal: repository not found",
            ));
        }
        std::fs::create_dir_all(dest).unwrap();
        std::fs::write(dest.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        Ok(())
    }

    async fn fetch_all(&self, _repo: &Path) -> AilloyResult<()> {
        self.record("fetch_all");
        Ok(())
    }

    async fn archive(&self, _repo: &Path, treeish: &str) -> AilloyResult<Vec<u8>> {
        self.record("archive");
        self.archives
            .get(treeish)
            .cloned()
            .ok_or_else(|| AilloyError::git(format!("archive {}", treeish), "fatal: not a valid object name"))
    }
}
