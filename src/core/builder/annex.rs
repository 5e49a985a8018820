//! External large-file strategy
//!
//! For packages whose tarballs are checked in through git-annex, with
//! the real content stored out-of-band. The export leaves placeholder
//! links in the git copy; this variant unlocks the annexed files,
//! fetches their content, and substitutes the real files before the
//! package build. Cleanup re-locks so the working tree returns to its
//! placeholder state even when the build fails.

use std::path::Path;

use crate::config::defaults::ANNEX_FORCE_LOCK_VERSION;
use crate::core::artifact::Artifact;
use crate::core::builder::base::NoArchiveBuilder;
use crate::core::builder::{Builder, BuilderInputs};
use crate::core::version::at_least;
use crate::error::ForgeError;
use crate::infra::filesystem;
use crate::infra::process::{run_in, tool_available};

/// Builder for packages with git-annex tracked sources
pub struct GitAnnexBuilder {
    inner: NoArchiveBuilder,
    unlocked: bool,
}

impl GitAnnexBuilder {
    /// Construct for the given inputs
    pub fn new(inputs: &BuilderInputs<'_>) -> Result<Self, ForgeError> {
        Ok(Self {
            inner: NoArchiveBuilder::new(inputs)?,
            unlocked: false,
        })
    }

    /// Fetch annexed content and substitute it into the git copy
    fn materialize_annexed_files(&mut self) -> Result<(), ForgeError> {
        if !tool_available("git-annex") {
            return Err(ForgeError::Generic(
                "git-annex not found on PATH; install git-annex to build this package".to_string(),
            ));
        }

        let ctx = self.inner.context_mut();
        let project_dir = ctx.project_dir();

        run_in(&project_dir, "git-annex", &["lock"])?;
        let annexed: Vec<String> = run_in(&project_dir, "git-annex", &["find", "--include=*"])?
            .stdout
            .lines()
            .map(str::to_string)
            .filter(|l| !l.is_empty())
            .collect();
        tracing::debug!("Annexed files: {annexed:?}");

        run_in(&project_dir, "git-annex", &["get"])?;
        run_in(&project_dir, "git-annex", &["unlock"])?;
        self.unlocked = true;

        let ctx = self.inner.context_mut();
        for name in &annexed {
            tracing::debug!("Copying unlocked file {name}");
            let placeholder = ctx.workspace.git_copy_dir().join(name);
            if placeholder.exists() {
                std::fs::remove_file(&placeholder).map_err(|e| {
                    ForgeError::Generic(format!(
                        "Failed to remove placeholder '{}': {e}",
                        placeholder.display()
                    ))
                })?;
            }
            filesystem::copy_file(&project_dir.join(name), &placeholder)?;
        }
        Ok(())
    }

    /// Installed git-annex version, if it can be determined
    fn annex_version(&mut self) -> Option<String> {
        let project_dir = self.inner.context_mut().project_dir();
        let out = run_in(&project_dir, "git-annex", &["version"]).ok()?;
        let first = out.stdout.lines().next()?;
        if first.starts_with("git-annex version") {
            first.split_whitespace().last().map(str::to_string)
        } else {
            None
        }
    }

    /// Restore the placeholder state of the working tree
    fn relock(&mut self) -> Result<(), ForgeError> {
        if !self.unlocked || !tool_available("git-annex") {
            return Ok(());
        }
        let force_supported = self
            .annex_version()
            .is_some_and(|v| at_least(&v, ANNEX_FORCE_LOCK_VERSION));
        let project_dir = self.inner.context_mut().project_dir();
        if force_supported {
            run_in(&project_dir, "git-annex", &["lock", "--force"])?;
        } else {
            run_in(&project_dir, "git-annex", &["lock"])?;
        }
        self.unlocked = false;
        Ok(())
    }
}

impl Builder for GitAnnexBuilder {
    fn setup_sources(&mut self) -> Result<(), ForgeError> {
        self.inner.setup_sources()?;
        self.materialize_annexed_files()
    }

    fn tgz(&mut self) -> Result<(), ForgeError> {
        self.inner.tgz()
    }

    fn srpm(&mut self, dist: Option<&str>) -> Result<(), ForgeError> {
        self.inner.srpm(dist)
    }

    fn rpm(&mut self) -> Result<(), ForgeError> {
        self.inner.rpm()
    }

    fn cleanup(&mut self) -> Result<(), ForgeError> {
        // Relocking is paired with the unlock in setup: it must happen
        // on failure paths too, before the workspace goes away.
        let relocked = self.relock();
        let inner = self.inner.cleanup();
        relocked?;
        inner?;
        Ok(())
    }

    fn artifacts(&self) -> &[Artifact] {
        self.inner.artifacts()
    }

    fn srpm_path(&self) -> Option<&Path> {
        self.inner.srpm_path()
    }
}
