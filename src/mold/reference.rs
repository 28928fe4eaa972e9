//! Mold reference parsing
//!
//! A reference names a mold by its origin repository plus an optional version
//! specifier and subpath:
//!
//! ```text
//! [https://|git@]<host>[:/]<owner>/<repo>[.git][@<version>][//<subpath>]
//! ```

use crate::error::{AilloyError, AilloyResult};
use std::fmt;
use std::str::FromStr;

/// How a version specifier should be resolved against the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// No version, or the literal `latest`: highest semver tag
    Latest,
    /// A semver range such as `^1.0.0` or `>=1.2.0, <2.0.0`
    Constraint,
    /// A concrete version such as `v1.2.3`
    Exact,
    /// Anything else: a branch name
    Branch,
    /// A 7 to 40 character lowercase hex commit hash
    Sha,
}

impl SpecifierKind {
    /// Classify a raw version specifier.
    pub fn classify(version: &str) -> Self {
        if version.is_empty() || version == "latest" {
            Self::Latest
        } else if is_sha(version) {
            Self::Sha
        } else if version.starts_with(['~', '^', '>', '=', '<', '!']) {
            Self::Constraint
        } else if is_exact(version) {
            Self::Exact
        } else {
            Self::Branch
        }
    }
}

impl fmt::Display for SpecifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Latest => "latest",
            Self::Constraint => "constraint",
            Self::Exact => "exact",
            Self::Branch => "branch",
            Self::Sha => "sha",
        };
        write!(f, "{}", name)
    }
}

fn is_sha(s: &str) -> bool {
    (7..=40).contains(&s.len()) && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Optional `v`, then `digits.digits.digits`; anything after that is ignored.
fn is_exact(s: &str) -> bool {
    let mut rest = s.strip_prefix('v').unwrap_or(s);
    for i in 0..3 {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return false;
        }
        rest = &rest[digits..];
        if i < 2 {
            match rest.strip_prefix('.') {
                Some(r) => rest = r,
                None => return false,
            }
        }
    }
    true
}

/// A parsed mold reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub host: String,
    pub owner: String,
    /// Repository path; may contain `/` for nested groups
    pub repo: String,
    /// Version specifier as written (possibly empty)
    pub version: String,
    /// Directory inside the repository holding the manifest
    pub subpath: Option<String>,
    pub kind: SpecifierKind,
}

impl Reference {
    /// Parse a raw reference string.
    pub fn parse(raw: &str) -> AilloyResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AilloyError::invalid_reference(raw, "reference is empty"));
        }

        let mut rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed)
            .to_string();

        if let Some(ssh) = rest.strip_prefix("git@") {
            rest = ssh.replacen(':', "/", 1);
        }

        // Subpath first, so `//` never reaches version extraction
        let mut subpath = None;
        if let Some(idx) = rest.find("//") {
            let sub = rest[idx + 2..].trim_matches('/').to_string();
            rest.truncate(idx);
            if !sub.is_empty() {
                subpath = Some(sub);
            }
        }

        let mut version = String::new();
        if let Some(idx) = rest.rfind('@') {
            version = rest[idx + 1..].to_string();
            rest.truncate(idx);
        }

        let location = rest.strip_suffix(".git").unwrap_or(&rest);

        let segments: Vec<&str> = location.split('/').collect();
        if segments.len() < 3 {
            return Err(AilloyError::invalid_reference(
                raw,
                "expected <host>/<owner>/<repo>",
            ));
        }
        let host = segments[0];
        let owner = segments[1];
        let repo = segments[2..].join("/");
        if host.is_empty() || owner.is_empty() || repo.is_empty() {
            return Err(AilloyError::invalid_reference(
                raw,
                "host, owner and repo must be non-empty",
            ));
        }

        let kind = SpecifierKind::classify(&version);
        Ok(Self {
            host: host.to_string(),
            owner: owner.to_string(),
            repo,
            version,
            subpath,
            kind,
        })
    }

    /// HTTPS clone URL of the origin repository
    pub fn clone_url(&self) -> String {
        format!("https://{}/{}/{}.git", self.host, self.owner, self.repo)
    }

    /// `host/owner/repo`, identical for every version of the same origin
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.host, self.owner, self.repo)
    }

    /// Short display name: the last subpath segment, else the last repo segment
    pub fn name(&self) -> &str {
        self.subpath
            .as_deref()
            .and_then(|s| s.rsplit('/').find(|p| !p.is_empty()))
            .or_else(|| self.repo.rsplit('/').next())
            .unwrap_or(&self.repo)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cache_key())?;
        if !self.version.is_empty() {
            write!(f, "@{}", self.version)?;
        }
        if let Some(ref subpath) = self.subpath {
            write!(f, "//{}", subpath)?;
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = AilloyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `s` names a remote mold rather than a local directory.
pub fn is_remote_reference(s: &str) -> bool {
    if s.starts_with(['/', '.', '~']) {
        return false;
    }
    if ["https://", "http://", "git@"]
        .iter()
        .any(|prefix| s.starts_with(prefix))
    {
        return true;
    }
    s.split('/').next().is_some_and(|first| first.contains('.'))
}
