//! Git repository access
//!
//! Read-only repository queries (discovery, tag and commit resolution)
//! go through the gix crate. Tree export and diffing use the git CLI via
//! the process runner, which is the only place `git archive`-grade
//! plumbing exists.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::infra::process::{CommandLine, ProcessError};

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not inside a git repository
    #[error("Invalid repository at '{path}': {error}")]
    InvalidRepository { path: PathBuf, error: String },

    /// Tag missing from the repository
    #[error("Tag '{tag}' does not exist in this repository. Did you tag the release first?")]
    TagNotFound { tag: String },

    /// Commit reference missing from the repository
    #[error("Commit '{commit}' does not exist in this repository")]
    CommitNotFound { commit: String },

    /// A subproject path does not exist in the tree at a commit
    #[error("Path '{path}' does not exist at commit '{commit}'")]
    PathNotFound { commit: String, path: String },

    /// Failed to resolve a reference to a commit
    #[error("Failed to resolve '{reference}': {error}")]
    ResolveFailed { reference: String, error: String },

    /// An invoked git/tar command failed
    #[error(transparent)]
    Tool(#[from] ProcessError),

    /// IO error while handling an archive
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// A compressed tree snapshot produced by [`GitRepo::archive`]
#[derive(Debug, Clone)]
pub struct SourceArchive {
    /// File name of the archive
    pub filename: String,
    /// Absolute path of the archive on disk
    pub path: PathBuf,
    /// Top-level directory entries are renamed to
    pub prefix: String,
    /// SHA256 digest of the archive contents
    pub sha256: String,
}

/// Handle to a local git repository
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Discover the repository containing `path`
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let repo = gix::discover(path).map_err(|e| GitError::InvalidRepository {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let root = repo
            .work_dir()
            .ok_or_else(|| GitError::InvalidRepository {
                path: path.to_path_buf(),
                error: "bare repositories are not supported".to_string(),
            })?
            .to_path_buf();
        Ok(Self { root })
    }

    /// Wrap an already-known working tree root without discovery
    pub fn at_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Repository working tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `dir` relative to the repository root, as a string
    ///
    /// Returns `"/"` for the root itself, mirroring how subproject
    /// directories are recorded.
    pub fn relative_dir(&self, dir: &Path) -> String {
        match dir.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => "/".to_string(),
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => "/".to_string(),
        }
    }

    fn open(&self) -> Result<gix::Repository, GitError> {
        gix::open(&self.root).map_err(|e| GitError::InvalidRepository {
            path: self.root.clone(),
            error: e.to_string(),
        })
    }

    /// Check whether an annotated or lightweight tag exists
    pub fn tag_exists(&self, tag: &str) -> Result<bool, GitError> {
        let repo = self.open()?;
        Ok(repo.find_reference(&format!("refs/tags/{tag}")).is_ok())
    }

    /// Resolve a tag to the commit id it points at
    pub fn resolve_tag(&self, tag: &str) -> Result<String, GitError> {
        let repo = self.open()?;
        let mut reference = repo
            .find_reference(&format!("refs/tags/{tag}"))
            .map_err(|_| GitError::TagNotFound {
                tag: tag.to_string(),
            })?;
        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::ResolveFailed {
                reference: tag.to_string(),
                error: e.to_string(),
            })?;
        Ok(commit.id().to_hex().to_string())
    }

    /// Commit id of the current HEAD
    pub fn head_commit(&self) -> Result<String, GitError> {
        let repo = self.open()?;
        let id = repo.head_id().map_err(|e| GitError::ResolveFailed {
            reference: "HEAD".to_string(),
            error: e.to_string(),
        })?;
        Ok(id.to_hex().to_string())
    }

    /// Resolve any committish to a full commit id
    pub fn rev_parse(&self, committish: &str) -> Result<String, GitError> {
        let repo = self.open()?;
        let spec = repo
            .rev_parse_single(committish)
            .map_err(|_| GitError::CommitNotFound {
                commit: committish.to_string(),
            })?;
        Ok(spec.to_hex().to_string())
    }

    /// Check whether a committish resolves to an existing object
    pub fn commit_exists(&self, committish: &str) -> bool {
        self.rev_parse(committish).is_ok()
    }

    /// Check whether `subdir` exists in the tree at `commit`
    ///
    /// `git cat-file -e` answers with its exit code; gix has no direct
    /// equivalent for the `<rev>:<path>` form.
    pub fn path_exists_at(&self, commit: &str, subdir: &str) -> Result<bool, GitError> {
        let out = CommandLine::new("git")
            .arg("cat-file")
            .arg("-e")
            .arg(format!("{commit}:{subdir}"))
            .current_dir(&self.root)
            .run_unchecked()?;
        Ok(out.code == 0)
    }

    /// Produce a compressed archive of `subdir` at `commit`
    ///
    /// Top-level entries are renamed under `prefix`. The output is
    /// reproducible for a fixed (commit, subdir, prefix): git embeds the
    /// commit timestamp rather than the wall clock.
    pub fn archive(
        &self,
        commit: &str,
        subdir: &str,
        prefix: &str,
        dest: &Path,
    ) -> Result<SourceArchive, GitError> {
        if !self.commit_exists(commit) {
            return Err(GitError::CommitNotFound {
                commit: commit.to_string(),
            });
        }

        let treeish = if subdir.is_empty() || subdir == "/" || subdir == "." {
            commit.to_string()
        } else {
            if !self.path_exists_at(commit, subdir)? {
                return Err(GitError::PathNotFound {
                    commit: commit.to_string(),
                    path: subdir.to_string(),
                });
            }
            format!("{commit}:{subdir}")
        };

        CommandLine::new("git")
            .arg("archive")
            .arg("--format=tar.gz")
            .arg(format!("--prefix={prefix}/"))
            .arg("-o")
            .arg(dest.to_string_lossy().into_owned())
            .arg(&treeish)
            .current_dir(&self.root)
            .run()?;

        let data = std::fs::read(dest).map_err(|e| GitError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;
        let sha256 = hex::encode(Sha256::digest(&data));

        let filename = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::debug!("Archived {treeish} as {filename} (sha256 {sha256})");

        Ok(SourceArchive {
            filename,
            path: dest.to_path_buf(),
            prefix: prefix.to_string(),
            sha256,
        })
    }

    /// Extract a gzipped tar archive into `dest_dir`
    pub fn extract_archive(&self, archive: &Path, dest_dir: &Path) -> Result<(), GitError> {
        CommandLine::new("tar")
            .arg("xzf")
            .arg(archive.to_string_lossy().into_owned())
            .current_dir(dest_dir)
            .run()?;
        Ok(())
    }

    /// Diff `from..to`, with paths relative to `dir`
    pub fn diff_relative(&self, from: &str, to: &str, dir: &Path) -> Result<String, GitError> {
        let out = CommandLine::new("git")
            .arg("diff")
            .arg("--relative")
            .arg(format!("{from}..{to}"))
            .current_dir(dir)
            .run()?;
        Ok(out.stdout)
    }
}
