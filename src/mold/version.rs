//! Version resolution against the origin repository
//!
//! Turns a reference's version specifier into a concrete `(tag, commit)` pair
//! by querying the remote's tags or branch heads.

use crate::error::{AilloyError, AilloyResult};
use crate::git::GitRunner;
use crate::mold::reference::{Reference, SpecifierKind};
use semver::{Version, VersionReq};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Suffix git appends to the dereferenced line of an annotated tag
const DEREF_SUFFIX: &str = "^{}";

/// The outcome of resolving a version specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Tag name, branch name, or (for SHA pins) the hash itself
    pub tag: String,
    /// Full commit hash the tag points at
    pub commit: String,
}

/// Build a tag name to commit map from `git ls-remote --tags` output.
///
/// Annotated tags appear twice: once with the tag object's hash and once as
/// `<name>^{}` with the commit it points to. The dereferenced commit always
/// wins, whatever order the lines arrive in.
pub fn parse_tag_listing(listing: &str) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for line in listing.lines() {
        let mut fields = line.split_whitespace();
        let (Some(commit), Some(refname)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Some(name) = refname.strip_prefix("refs/tags/") else {
            continue;
        };
        match name.strip_suffix(DEREF_SUFFIX) {
            Some(name) => {
                tags.insert(name.to_string(), commit.to_string());
            }
            None => {
                tags.entry(name.to_string())
                    .or_insert_with(|| commit.to_string());
            }
        }
    }
    tags
}

/// Parse a tag as semver, ignoring a leading `v`
pub fn parse_semver(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

/// A semver range: `semver` comparators plus `!=` exclusions
#[derive(Debug, Clone)]
pub struct Constraint {
    req: VersionReq,
    excluded: Vec<Version>,
}

impl Constraint {
    /// Parse a range expression.
    ///
    /// Comparators may be separated by commas or whitespace, an operator may
    /// be detached from its version (`>= 1.0.0`), and versions may carry a
    /// leading `v`.
    pub fn parse(raw: &str) -> AilloyResult<Self> {
        let invalid = |reason: String| AilloyError::InvalidConstraint {
            raw: raw.to_string(),
            reason,
        };

        let mut comparators = Vec::new();
        let mut excluded = Vec::new();
        let mut pending_op = String::new();

        for token in raw.replace(',', " ").split_whitespace() {
            if token.chars().all(is_operator_char) {
                pending_op.push_str(token);
                continue;
            }
            let token = std::mem::take(&mut pending_op) + token;
            let split = token
                .find(|c: char| !is_operator_char(c))
                .unwrap_or(token.len());
            let (op, version) = token.split_at(split);
            let version = version.strip_prefix('v').unwrap_or(version);

            if op == "!=" {
                let v = Version::parse(version)
                    .map_err(|e| invalid(format!("bad excluded version '{}': {}", version, e)))?;
                excluded.push(v);
            } else {
                comparators.push(format!("{}{}", op, version));
            }
        }

        if !pending_op.is_empty() {
            return Err(invalid(format!("operator '{}' has no version", pending_op)));
        }
        if comparators.is_empty() && excluded.is_empty() {
            return Err(invalid("no comparators".to_string()));
        }

        let req = if comparators.is_empty() {
            VersionReq::STAR
        } else {
            VersionReq::parse(&comparators.join(", ")).map_err(|e| invalid(e.to_string()))?
        };

        Ok(Self { req, excluded })
    }

    /// Whether `version` satisfies every comparator and no exclusion
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.contains(version)
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '~' | '^' | '!')
}

/// Highest semver tag accepted by `filter`. Equal versions keep the first tag
/// in name order, so `1.0.0` beats `v1.0.0`.
fn max_tag<'a>(
    tags: &'a BTreeMap<String, String>,
    filter: impl Fn(&Version) -> bool,
) -> Option<(&'a String, &'a String)> {
    let mut best: Option<(Version, &String, &String)> = None;
    for (tag, commit) in tags {
        let Some(version) = parse_semver(tag) else {
            continue;
        };
        if !filter(&version) {
            continue;
        }
        if best.as_ref().is_none_or(|(current, _, _)| version > *current) {
            best = Some((version, tag, commit));
        }
    }
    best.map(|(_, tag, commit)| (tag, commit))
}

/// Resolve `reference`'s version specifier to a concrete tag and commit.
pub async fn resolve_version(
    reference: &Reference,
    git: &dyn GitRunner,
) -> AilloyResult<ResolvedVersion> {
    let url = reference.clone_url();
    let version = &reference.version;

    let resolved = match reference.kind {
        SpecifierKind::Sha => ResolvedVersion {
            tag: version.clone(),
            commit: version.clone(),
        },
        SpecifierKind::Latest => {
            let tags = parse_tag_listing(&git.ls_remote_tags(&url).await?);
            let (tag, commit) =
                max_tag(&tags, |_| true).ok_or(AilloyError::NoSemverTags { url })?;
            ResolvedVersion {
                tag: tag.clone(),
                commit: commit.clone(),
            }
        }
        SpecifierKind::Exact => {
            let tags = parse_tag_listing(&git.ls_remote_tags(&url).await?);
            let candidates = [
                version.clone(),
                format!("v{}", version),
                version.strip_prefix('v').unwrap_or(version).to_string(),
            ];
            candidates
                .iter()
                .find_map(|candidate| {
                    tags.get(candidate).map(|commit| ResolvedVersion {
                        tag: candidate.clone(),
                        commit: commit.clone(),
                    })
                })
                .ok_or_else(|| AilloyError::TagNotFound {
                    version: version.clone(),
                    url,
                })?
        }
        SpecifierKind::Constraint => {
            let constraint = Constraint::parse(version)?;
            let tags = parse_tag_listing(&git.ls_remote_tags(&url).await?);
            let (tag, commit) = max_tag(&tags, |v| constraint.matches(v)).ok_or_else(|| {
                AilloyError::ConstraintUnsatisfied {
                    constraint: version.clone(),
                    url,
                }
            })?;
            ResolvedVersion {
                tag: tag.clone(),
                commit: commit.clone(),
            }
        }
        SpecifierKind::Branch => {
            let listing = git.ls_remote_branch(&url, version).await?;
            let commit = listing
                .lines()
                .find_map(|line| line.split_whitespace().next())
                .ok_or_else(|| AilloyError::BranchNotFound {
                    branch: version.clone(),
                    url,
                })?;
            warn!(
                "{} is pinned to branch '{}'; branch pins are mutable, pin a tag or commit for reproducible builds",
                reference.cache_key(),
                version
            );
            ResolvedVersion {
                tag: version.clone(),
                commit: commit.to_string(),
            }
        }
    };

    debug!(
        "Resolved {} ({}) to {} at {}",
        reference, reference.kind, resolved.tag, resolved.commit
    );
    Ok(resolved)
}
