//! Shared build state and the two plain strategies
//!
//! [`BuildContext`] carries everything a variant needs: the repository,
//! the resolved target, the workspace, and the accumulated artifact
//! list. Step implementations common to several variants live here as
//! context methods; variants compose them instead of inheriting.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::artifact::{Artifact, ArtifactKind};
use crate::core::builder::{Builder, BuilderInputs};
use crate::core::config::BuildConfig;
use crate::core::specfile;
use crate::core::target::BuildTarget;
use crate::core::workspace::Workspace;
use crate::error::ForgeError;
use crate::infra::git::{GitRepo, SourceArchive};
use crate::infra::process::CommandLine;

fn wrote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^Wrote:\s*(.+\.rpm)\s*$").unwrap())
}

/// State shared by every builder variant
#[derive(Debug)]
pub struct BuildContext {
    /// Repository the build reads from
    pub repo: GitRepo,
    /// What is being built
    pub target: BuildTarget,
    /// Project configuration
    pub config: BuildConfig,
    /// Private directory tree for this invocation
    pub workspace: Workspace,
    /// Source files registered for the package build
    pub sources: Vec<PathBuf>,
    /// Produced packages, append-only
    pub artifacts: Vec<Artifact>,
    /// Spec file the package build uses
    pub spec_file: Option<PathBuf>,
    /// Built source package, once one exists
    pub srpm_path: Option<PathBuf>,
    /// Suppress tag-existence checks
    pub offline: bool,
}

impl BuildContext {
    /// Create the context and its workspace
    pub fn new(inputs: &BuilderInputs<'_>) -> Result<Self, ForgeError> {
        let workspace = Workspace::create(
            inputs.output_dir,
            &inputs.target.project_name,
            &inputs.target.archive_prefix(),
            inputs.keep_workspace,
        )?;
        Ok(Self {
            repo: inputs.repo.clone(),
            target: inputs.target.clone(),
            config: inputs.config.clone(),
            workspace,
            sources: Vec::new(),
            artifacts: Vec::new(),
            spec_file: None,
            srpm_path: None,
            offline: inputs.offline,
        })
    }

    /// Absolute path of the subproject inside the working tree
    pub fn project_dir(&self) -> PathBuf {
        if self.target.relative_project_dir == "/" {
            self.repo.root().to_path_buf()
        } else {
            self.repo.root().join(&self.target.relative_project_dir)
        }
    }

    /// Subdirectory argument for tree exports (`""` for the root)
    pub fn archive_subdir(&self) -> &str {
        if self.target.relative_project_dir == "/" {
            ""
        } else {
            &self.target.relative_project_dir
        }
    }

    /// Archive the build commit into `SOURCES` and register it
    pub fn export_archive(&mut self) -> Result<SourceArchive, ForgeError> {
        let prefix = self.target.archive_prefix();
        let filename = format!("{prefix}.tar.gz");
        let dest = self.workspace.source_dir().join(&filename);
        tracing::info!(
            "Creating {filename} from git commit: {}...",
            self.target.commit
        );
        let archive =
            self.repo
                .archive(&self.target.commit, self.archive_subdir(), &prefix, &dest)?;
        self.sources.push(dest);
        Ok(archive)
    }

    /// Extract an archive into `SOURCES`, materializing the git copy
    pub fn extract_git_copy(&self, archive: &SourceArchive) -> Result<(), ForgeError> {
        tracing::debug!(
            "Extracting git copy to: {}",
            self.workspace.git_copy_dir().display()
        );
        self.repo
            .extract_archive(&archive.path, self.workspace.source_dir())?;
        Ok(())
    }

    /// Export the tree at the build commit without keeping a tarball
    ///
    /// The transport archive lands in the build root, outside `SOURCES`,
    /// so it is never registered as a package source.
    pub fn export_verbatim_copy(&mut self) -> Result<(), ForgeError> {
        let prefix = self.target.archive_prefix();
        let transport = self.workspace.root_dir().join(format!("{prefix}.tar.gz"));
        let archive =
            self.repo
                .archive(&self.target.commit, self.archive_subdir(), &prefix, &transport)?;
        self.extract_git_copy(&archive)?;
        Ok(())
    }

    /// Locate the spec file in the exported git copy and remember it
    pub fn locate_spec(&mut self) -> Result<PathBuf, ForgeError> {
        let spec = specfile::find_spec_file(self.workspace.git_copy_dir())?;
        tracing::debug!("Using spec file: {}", spec.display());
        self.spec_file = Some(spec.clone());
        Ok(spec)
    }

    fn rpmbuild_command(&self, sourcedir: &Path, dist: Option<&str>) -> CommandLine {
        let mut cmd = CommandLine::new("rpmbuild")
            .arg("--define")
            .arg(format!("_topdir {}", self.workspace.root_dir().display()))
            .arg("--define")
            .arg(format!("_sourcedir {}", sourcedir.display()))
            .arg("--define")
            .arg(format!("_builddir {}", self.workspace.build_dir().display()))
            .arg("--define")
            .arg(format!(
                "_srcrpmdir {}",
                self.workspace.output_dir().display()
            ))
            .arg("--define")
            .arg(format!("_rpmdir {}", self.workspace.output_dir().display()));
        if let Some(dist) = dist {
            let dist = if dist.starts_with('.') {
                dist.to_string()
            } else {
                format!(".{dist}")
            };
            cmd = cmd.arg("--define").arg(format!("dist {dist}"));
        }
        cmd
    }

    /// Paths reported by the package build tool's `Wrote:` lines
    pub fn parse_wrote(output: &str) -> Vec<PathBuf> {
        wrote_re()
            .captures_iter(output)
            .map(|c| PathBuf::from(c[1].trim()))
            .collect()
    }

    /// Build the source package with `sourcedir` as the sources location
    pub fn build_srpm(&mut self, dist: Option<&str>, sourcedir: &Path) -> Result<(), ForgeError> {
        let spec = self.require_spec()?;
        tracing::info!(
            "Building source package for {}-{}",
            self.target.project_name,
            self.target.display_version()
        );
        let out = self
            .rpmbuild_command(sourcedir, dist)
            .arg("-bs")
            .arg(spec.to_string_lossy().into_owned())
            .run()?;

        for path in Self::parse_wrote(&out.stdout) {
            if self.srpm_path.is_none() {
                self.srpm_path = Some(path.clone());
            }
            self.artifacts.push(Artifact {
                path,
                kind: ArtifactKind::SourcePackage,
            });
        }
        Ok(())
    }

    /// Build binary packages with `sourcedir` as the sources location
    pub fn build_rpm(&mut self, sourcedir: &Path) -> Result<(), ForgeError> {
        let spec = self.require_spec()?;
        tracing::info!(
            "Building binary packages for {}-{}",
            self.target.project_name,
            self.target.display_version()
        );
        let out = self
            .rpmbuild_command(sourcedir, None)
            .arg("-bb")
            .arg(spec.to_string_lossy().into_owned())
            .run()?;

        for path in Self::parse_wrote(&out.stdout) {
            self.artifacts.push(Artifact::from_path(path));
        }
        Ok(())
    }

    fn require_spec(&self) -> Result<PathBuf, ForgeError> {
        self.spec_file
            .clone()
            .ok_or_else(|| ForgeError::Generic("No spec file located before package build".into()))
    }
}

/// Default strategy: build from an archive of the tagged commit
#[derive(Debug)]
pub struct ReleaseBuilder {
    ctx: BuildContext,
    archive: Option<SourceArchive>,
}

impl ReleaseBuilder {
    /// Construct for the given inputs
    pub fn new(inputs: &BuilderInputs<'_>) -> Result<Self, ForgeError> {
        Ok(Self {
            ctx: BuildContext::new(inputs)?,
            archive: None,
        })
    }
}

impl Builder for ReleaseBuilder {
    fn setup_sources(&mut self) -> Result<(), ForgeError> {
        let archive = self.ctx.export_archive()?;
        self.ctx.extract_git_copy(&archive)?;
        self.archive = Some(archive);
        self.ctx.locate_spec()?;
        Ok(())
    }

    fn tgz(&mut self) -> Result<(), ForgeError> {
        match &self.archive {
            Some(archive) => {
                tracing::info!("Wrote: {}", archive.path.display());
                Ok(())
            }
            None => Err(ForgeError::Generic(
                "Source archive was not created during setup".into(),
            )),
        }
    }

    fn srpm(&mut self, dist: Option<&str>) -> Result<(), ForgeError> {
        let sourcedir = self.ctx.workspace.source_dir().to_path_buf();
        self.ctx.build_srpm(dist, &sourcedir)
    }

    fn rpm(&mut self) -> Result<(), ForgeError> {
        let sourcedir = self.ctx.workspace.source_dir().to_path_buf();
        self.ctx.build_rpm(&sourcedir)
    }

    fn cleanup(&mut self) -> Result<(), ForgeError> {
        self.ctx.workspace.cleanup()?;
        Ok(())
    }

    fn artifacts(&self) -> &[Artifact] {
        &self.ctx.artifacts
    }

    fn srpm_path(&self) -> Option<&Path> {
        self.ctx.srpm_path.as_deref()
    }
}

/// Strategy for packages whose sources are tracked verbatim
///
/// No tarball is synthesized; the exported git copy doubles as the
/// rpmbuild sources directory.
#[derive(Debug)]
pub struct NoArchiveBuilder {
    ctx: BuildContext,
}

impl NoArchiveBuilder {
    /// Construct for the given inputs
    pub fn new(inputs: &BuilderInputs<'_>) -> Result<Self, ForgeError> {
        Ok(Self {
            ctx: BuildContext::new(inputs)?,
        })
    }

    pub(crate) fn context_mut(&mut self) -> &mut BuildContext {
        &mut self.ctx
    }
}

impl Builder for NoArchiveBuilder {
    fn setup_sources(&mut self) -> Result<(), ForgeError> {
        self.ctx.export_verbatim_copy()?;
        self.ctx.locate_spec()?;
        Ok(())
    }

    fn tgz(&mut self) -> Result<(), ForgeError> {
        tracing::debug!("Sources are tracked verbatim; skipping tarball");
        Ok(())
    }

    fn srpm(&mut self, dist: Option<&str>) -> Result<(), ForgeError> {
        let sourcedir = self.ctx.workspace.git_copy_dir().to_path_buf();
        self.ctx.build_srpm(dist, &sourcedir)
    }

    fn rpm(&mut self) -> Result<(), ForgeError> {
        let sourcedir = self.ctx.workspace.git_copy_dir().to_path_buf();
        self.ctx.build_rpm(&sourcedir)
    }

    fn cleanup(&mut self) -> Result<(), ForgeError> {
        self.ctx.workspace.cleanup()?;
        Ok(())
    }

    fn artifacts(&self) -> &[Artifact] {
        &self.ctx.artifacts
    }

    fn srpm_path(&self) -> Option<&Path> {
        self.ctx.srpm_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrote_lines() {
        let output = "\
Processing files: foo-1.2-3
Wrote: /tmp/out/foo-1.2-3.src.rpm
Checking for unpackaged file(s)
Wrote: /tmp/out/foo-1.2-3.x86_64.rpm
";
        let paths = BuildContext::parse_wrote(output);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/out/foo-1.2-3.src.rpm"),
                PathBuf::from("/tmp/out/foo-1.2-3.x86_64.rpm"),
            ]
        );
    }

    #[test]
    fn test_parse_wrote_ignores_non_rpm_lines() {
        let output = "Wrote: /tmp/build.log\nWrote some text\n";
        assert!(BuildContext::parse_wrote(output).is_empty());
    }
}
