//! Build workspace management
//!
//! One [`Workspace`] per build invocation: a private `rpmbuild-<name>-*`
//! root under the shared output directory, holding the rpmbuild
//! `SOURCES`/`BUILD` tree and the exported git copy. The root is removed
//! on cleanup (or kept for inspection) regardless of build outcome; the
//! shared output directory outlives it and is where artifacts land.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::defaults::{BUILD_DIR, SOURCES_DIR};
use crate::error::WorkspaceError;

/// Private directory tree for one build invocation
#[derive(Debug)]
pub struct Workspace {
    output_dir: PathBuf,
    root: Option<TempDir>,
    source_dir: PathBuf,
    build_dir: PathBuf,
    git_copy_dir: PathBuf,
    keep: bool,
}

impl Workspace {
    /// Create the build root under `output_dir`
    ///
    /// `archive_prefix` names the git copy directory inside `SOURCES`.
    pub fn create(
        output_dir: &Path,
        project_name: &str,
        archive_prefix: &str,
        keep: bool,
    ) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(output_dir).map_err(|e| WorkspaceError::CreateRoot {
            path: output_dir.to_path_buf(),
            error: e.to_string(),
        })?;

        let root = tempfile::Builder::new()
            .prefix(&format!("rpmbuild-{project_name}-"))
            .tempdir_in(output_dir)
            .map_err(|e| WorkspaceError::CreateRoot {
                path: output_dir.to_path_buf(),
                error: e.to_string(),
            })?;

        let source_dir = root.path().join(SOURCES_DIR);
        let build_dir = root.path().join(BUILD_DIR);
        let git_copy_dir = source_dir.join(archive_prefix);

        let workspace = Self {
            output_dir: output_dir.to_path_buf(),
            root: Some(root),
            source_dir,
            build_dir,
            git_copy_dir,
            keep,
        };
        workspace.prepare()?;
        Ok(workspace)
    }

    /// Create the directory tree; safe to call repeatedly
    pub fn prepare(&self) -> Result<(), WorkspaceError> {
        for dir in [&self.source_dir, &self.build_dir] {
            std::fs::create_dir_all(dir).map_err(|e| WorkspaceError::CreateDir {
                path: dir.clone(),
                error: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Build root directory
    pub fn root_dir(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.path().to_path_buf(),
            None => self.output_dir.clone(),
        }
    }

    /// Shared output directory; survives cleanup
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// rpmbuild SOURCES directory
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// rpmbuild BUILD directory
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Exported git copy directory inside SOURCES
    pub fn git_copy_dir(&self) -> &Path {
        &self.git_copy_dir
    }

    /// Whether the root is retained after cleanup
    pub fn keeps_root(&self) -> bool {
        self.keep
    }

    /// Remove the build root, or keep it for inspection
    ///
    /// Called by the build pipeline on every exit path. Idempotent.
    pub fn cleanup(&mut self) -> Result<(), WorkspaceError> {
        let Some(root) = self.root.take() else {
            return Ok(());
        };
        if self.keep {
            let path = root.into_path();
            tracing::info!("Leaving build root for inspection: {}", path.display());
            return Ok(());
        }
        let path = root.path().to_path_buf();
        root.close().map_err(|e| WorkspaceError::Remove {
            path,
            error: e.to_string(),
        })
    }
}
