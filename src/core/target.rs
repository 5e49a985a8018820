//! Build target resolution
//!
//! Derives the package name, version, release, and the commit to build
//! from a tag string of the form `name-version-release`, plus the
//! test-build and offline flags.

use thiserror::Error;

use crate::infra::git::{GitError, GitRepo};

/// Target resolution errors
#[derive(Error, Debug)]
pub enum TargetError {
    /// Tag string is not of the `name-version-release` form
    #[error("Malformed build tag '{tag}': expected name-version-release")]
    MalformedTag { tag: String },

    /// Underlying git failure (tag or commit lookup)
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Everything a builder needs to know about what to build
///
/// Resolved once per invocation; immutable afterwards.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    /// Package name parsed from the tag
    pub project_name: String,
    /// The full build tag, e.g. `foo-1.2-3`
    pub build_tag: String,
    /// Commit id the build is pinned to
    pub commit: String,
    /// Subproject directory relative to the repository root (`"/"` for root)
    pub relative_project_dir: String,
    /// Version component of the tag
    pub version: String,
    /// Release component of the tag
    pub release: String,
    /// Whether this is a test build of the working tree HEAD
    pub test_build: bool,
}

impl BuildTarget {
    /// Version string used in file names and messages
    ///
    /// Test builds are suffixed with the short commit id so repeated
    /// test builds of different HEADs stay distinguishable.
    pub fn display_version(&self) -> String {
        if self.test_build {
            let short = &self.commit[..self.commit.len().min(7)];
            format!("{}.git.{}", self.version, short)
        } else {
            self.version.clone()
        }
    }

    /// Directory prefix used for archives and git copies
    pub fn archive_prefix(&self) -> String {
        format!("{}-{}", self.project_name, self.display_version())
    }
}

/// Split a `name-version-release` build tag into its components
pub fn parse_build_tag(tag: &str) -> Result<(String, String, String), TargetError> {
    let mut parts = tag.rsplitn(3, '-');
    let release = parts.next();
    let version = parts.next();
    let name = parts.next();
    match (name, version, release) {
        (Some(n), Some(v), Some(r)) if !n.is_empty() && !v.is_empty() && !r.is_empty() => {
            Ok((n.to_string(), v.to_string(), r.to_string()))
        }
        _ => Err(TargetError::MalformedTag {
            tag: tag.to_string(),
        }),
    }
}

/// Resolve a build tag into a [`BuildTarget`]
///
/// Test builds are pinned to the current HEAD and skip the tag lookup
/// entirely. Non-test builds require the tag to exist unless `offline`
/// is set, in which case the tag name itself is used as the committish.
pub fn resolve_target(
    repo: &GitRepo,
    tag: &str,
    relative_project_dir: String,
    test_build: bool,
    offline: bool,
) -> Result<BuildTarget, TargetError> {
    let (project_name, version, release) = parse_build_tag(tag)?;

    let commit = if test_build {
        repo.head_commit()?
    } else if offline {
        tracing::debug!("Offline: skipping existence check for tag [{tag}]");
        tag.to_string()
    } else {
        repo.resolve_tag(tag)?
    };

    Ok(BuildTarget {
        project_name,
        build_tag: tag.to_string(),
        commit,
        relative_project_dir,
        version,
        release,
        test_build,
    })
}
