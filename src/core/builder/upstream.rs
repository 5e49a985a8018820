//! Upstream-baseline strategy
//!
//! For packages carried downstream of an upstream project: the tarball
//! is synthesized from the *upstream* tag's commit, and every commit
//! between that baseline and the downstream build commit becomes a
//! patch declared and applied in an exported copy of the spec file.
//!
//! e.g. `satellite-java-0.4.0-5` built from `spacewalk-java-0.4.0-1`
//! plus whatever was committed downstream since.

use std::path::{Path, PathBuf};

use crate::core::artifact::Artifact;
use crate::core::builder::base::NoArchiveBuilder;
use crate::core::builder::{Builder, BuilderInputs};
use crate::core::specfile::{self, SpecError};
use crate::error::ForgeError;
use crate::infra::filesystem;

/// Builder for packages based off an upstream git tag
#[derive(Debug)]
pub struct UpstreamBuilder {
    inner: NoArchiveBuilder,
    upstream_name: String,
    upstream_tag: Option<String>,
}

impl UpstreamBuilder {
    /// Construct for the given inputs
    ///
    /// The upstream project name comes from `[buildconfig]
    /// upstream_name`; without one the project is assumed to keep its
    /// own name upstream.
    pub fn new(inputs: &BuilderInputs<'_>) -> Result<Self, ForgeError> {
        let upstream_name = inputs
            .config
            .upstream_name()
            .unwrap_or(&inputs.target.project_name)
            .to_string();
        Ok(Self {
            inner: NoArchiveBuilder::new(inputs)?,
            upstream_name,
            upstream_tag: None,
        })
    }

    /// Upstream version: the spec's `upstreamversion` marker if set,
    /// else the version being built
    fn resolve_upstream_version(&mut self) -> Result<String, ForgeError> {
        let ctx = self.inner.context_mut();
        let spec = ctx
            .spec_file
            .clone()
            .ok_or_else(|| ForgeError::Generic("Spec file not exported yet".into()))?;
        let lines = specfile::split_lines(&filesystem::read_file(&spec)?);
        if let Some(version) = specfile::upstream_version(&lines) {
            return Ok(version);
        }
        if ctx.target.test_build {
            Ok(ctx.target.version.clone())
        } else {
            Ok(ctx.target.display_version())
        }
    }

    /// Copy the exported spec into `SOURCES` and point the build at it
    ///
    /// The copy is the one that gets patch lines spliced in; the
    /// repository's own spec file is never touched.
    fn stage_spec_copy(&mut self) -> Result<PathBuf, ForgeError> {
        let ctx = self.inner.context_mut();
        let exported = ctx
            .spec_file
            .clone()
            .ok_or_else(|| ForgeError::Generic("Spec file not exported yet".into()))?;
        let staged = ctx
            .workspace
            .source_dir()
            .join(exported.file_name().unwrap_or_default());
        filesystem::copy_file(&exported, &staged)?;
        ctx.spec_file = Some(staged.clone());
        Ok(staged)
    }

    /// Generate the patch between the upstream tag and the build commit
    /// and splice it into the staged spec copy
    fn patch_upstream(&mut self, upstream_commit: &str) -> Result<(), ForgeError> {
        let upstream_tag = self
            .upstream_tag
            .clone()
            .ok_or_else(|| ForgeError::Generic("Upstream tag not resolved yet".into()))?;

        let ctx = self.inner.context_mut();
        let patch_filename = format!(
            "{upstream_tag}-to-{}-{}.patch",
            ctx.target.project_name,
            ctx.target.display_version()
        );
        tracing::info!("Generating patch [{patch_filename}]");

        let patch_dir = ctx.project_dir();
        let diff = ctx
            .repo
            .diff_relative(upstream_commit, &ctx.target.commit, &patch_dir)?;

        if specfile::is_binary_diff(&diff) {
            return Err(SpecError::BinaryPatch {
                from: upstream_tag,
                to: ctx.target.commit.clone(),
            }
            .into());
        }

        // Both the git copy and SOURCES get a copy; some package builds
        // look for patches next to the spec, others in the sources dir.
        let in_git_copy = ctx.workspace.git_copy_dir().join(&patch_filename);
        filesystem::write_file(&in_git_copy, &diff)?;
        let in_sources = ctx.workspace.source_dir().join(&patch_filename);
        filesystem::copy_file(&in_git_copy, &in_sources)?;

        let spec = ctx
            .spec_file
            .clone()
            .ok_or_else(|| ForgeError::Generic("Spec file not staged yet".into()))?;
        let lines = specfile::split_lines(&filesystem::read_file(&spec)?);
        let plan = specfile::plan_patch_insertion(&lines)?;
        let patched = specfile::insert_patch(&lines, &plan, &patch_filename);
        filesystem::write_file(&spec, &specfile::join_lines(&patched))?;
        Ok(())
    }
}

impl Builder for UpstreamBuilder {
    fn setup_sources(&mut self) -> Result<(), ForgeError> {
        self.inner.setup_sources()
    }

    fn tgz(&mut self) -> Result<(), ForgeError> {
        let upstream_version = self.resolve_upstream_version()?;
        let upstream_tag = format!("{}-{upstream_version}-1", self.upstream_name);
        self.upstream_tag = Some(upstream_tag.clone());

        self.stage_spec_copy()?;

        let ctx = self.inner.context_mut();
        tracing::info!("Building upstream tgz for tag [{upstream_tag}]");

        // A tag matching our own build tag originated here; the archive
        // still comes from it, but nothing needs patching.
        let upstream_commit = if upstream_tag == ctx.target.build_tag {
            ctx.target.commit.clone()
        } else if ctx.offline {
            upstream_tag.clone()
        } else {
            ctx.repo.resolve_tag(&upstream_tag)?
        };

        let prefix = format!("{}-{upstream_version}", self.upstream_name);
        let filename = format!("{prefix}.tar.gz");
        let dest = ctx.workspace.source_dir().join(&filename);
        tracing::info!("Creating {filename} from git tag: {upstream_commit}...");
        let subdir = ctx.archive_subdir().to_string();
        ctx.repo.archive(&upstream_commit, &subdir, &prefix, &dest)?;
        ctx.sources.push(dest);

        if upstream_tag == ctx.target.build_tag && !ctx.target.test_build {
            return Ok(());
        }
        self.patch_upstream(&upstream_commit)
    }

    fn srpm(&mut self, dist: Option<&str>) -> Result<(), ForgeError> {
        // Tarball and patches live in SOURCES, unlike the plain
        // no-archive strategy.
        let ctx = self.inner.context_mut();
        let sourcedir = ctx.workspace.source_dir().to_path_buf();
        ctx.build_srpm(dist, &sourcedir)
    }

    fn rpm(&mut self) -> Result<(), ForgeError> {
        let ctx = self.inner.context_mut();
        let sourcedir = ctx.workspace.source_dir().to_path_buf();
        ctx.build_rpm(&sourcedir)
    }

    fn cleanup(&mut self) -> Result<(), ForgeError> {
        self.inner.cleanup()
    }

    fn artifacts(&self) -> &[Artifact] {
        self.inner.artifacts()
    }

    fn srpm_path(&self) -> Option<&Path> {
        self.inner.srpm_path()
    }
}
