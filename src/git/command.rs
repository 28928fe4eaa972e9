//! `git` subprocess implementation of [`GitRunner`]

use crate::error::{AilloyError, AilloyResult};
use crate::git::runner::GitRunner;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Max number of output lines to include in git error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Combine stdout and stderr, keeping only the last `ERROR_TAIL_LINES` lines.
pub(crate) fn error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Runs the system `git` binary
#[derive(Debug, Clone)]
pub struct CommandGit {
    binary: PathBuf,
}

impl CommandGit {
    /// Use the given git executable
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run<I, S>(&self, args: I) -> AilloyResult<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        let command_line = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Running: git {}", command_line);

        let output = Command::new(&self.binary)
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AilloyError::command_failed(format!("git {}", command_line), e))?;

        if output.status.success() {
            Ok(output)
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(AilloyError::git(command_line, error_output(&stdout, &stderr)))
        }
    }
}

impl Default for CommandGit {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl GitRunner for CommandGit {
    async fn ls_remote_tags(&self, url: &str) -> AilloyResult<String> {
        let output = self.run(["ls-remote", "--tags", url]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn ls_remote_branch(&self, url: &str, branch: &str) -> AilloyResult<String> {
        let refname = format!("refs/heads/{}", branch);
        let output = self.run(["ls-remote", url, refname.as_str()]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn clone_bare(&self, url: &str, dest: &Path) -> AilloyResult<()> {
        self.run([
            OsStr::new("clone"),
            OsStr::new("--bare"),
            OsStr::new("--quiet"),
            OsStr::new(url),
            dest.as_os_str(),
        ])
        .await?;
        Ok(())
    }

    async fn fetch_all(&self, repo: &Path) -> AilloyResult<()> {
        // A bare clone has no fetch refspec, so spell out heads and tags
        self.run([
            OsStr::new("-C"),
            repo.as_os_str(),
            OsStr::new("fetch"),
            OsStr::new("--quiet"),
            OsStr::new("--force"),
            OsStr::new("--prune"),
            OsStr::new("origin"),
            OsStr::new("+refs/heads/*:refs/heads/*"),
            OsStr::new("+refs/tags/*:refs/tags/*"),
        ])
        .await?;
        Ok(())
    }

    async fn archive(&self, repo: &Path, treeish: &str) -> AilloyResult<Vec<u8>> {
        let output = self
            .run([
                OsStr::new("-C"),
                repo.as_os_str(),
                OsStr::new("archive"),
                OsStr::new("--format=tar"),
                OsStr::new(treeish),
            ])
            .await?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn error_output_keeps_tail() {
        let stdout: String = (0..60).map(|i| format!("line {}\n", i)).collect();
        let out = error_output(&stdout, "fatal: boom");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), ERROR_TAIL_LINES);
        assert_eq!(*lines.last().unwrap(), "fatal: boom");
        assert_eq!(lines[0], "line 11");
    }

    #[tokio::test]
    async fn missing_binary_is_remote_error() {
        let git = CommandGit::new("/nonexistent/git-binary");
        let err = git
            .ls_remote_tags("https://example.invalid/a/b.git")
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Remote);
        assert!(err.to_string().contains("ls-remote"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_names_command_line() {
        // `false` exits non-zero without output
        let git = CommandGit::new("false");
        let err = git
            .ls_remote_branch("https://example.invalid/a/b.git", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, AilloyError::Git { .. }));
        assert!(err
            .to_string()
            .contains("ls-remote https://example.invalid/a/b.git refs/heads/main"));
    }
}
