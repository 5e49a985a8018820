//! Remote-fetch strategy
//!
//! Skips local compilation entirely: the build system already built the
//! packages, so this variant downloads the finished build identified by
//! `<build_tag>.<disttag>` from koji and collects the binary packages.
//! Useful when assembling repositories during a release.

use std::path::{Path, PathBuf};

use crate::core::artifact::{is_package_file, is_source_package, Artifact};
use crate::core::builder::{Builder, BuilderArgs, BuilderInputs};
use crate::core::workspace::Workspace;
use crate::error::ForgeError;
use crate::infra::filesystem;
use crate::infra::process::CommandLine;

/// Arguments this variant refuses to construct without
pub const REQUIRED_ARGS: &[&str] = &["disttag"];

/// Builder that downloads a pre-built package set
pub struct KojiDownloadBuilder {
    workspace: Workspace,
    artifacts: Vec<Artifact>,
    build_tag: String,
    dist_tag: String,
}

impl KojiDownloadBuilder {
    /// Construct for the given inputs; requires `disttag`
    pub fn new(inputs: &BuilderInputs<'_>, args: &BuilderArgs) -> Result<Self, ForgeError> {
        args.require_all("koji", REQUIRED_ARGS)?;
        let dist_tag = args.get("disttag").unwrap_or_default().to_string();

        let workspace = Workspace::create(
            inputs.output_dir,
            &inputs.target.project_name,
            &inputs.target.archive_prefix(),
            inputs.keep_workspace,
        )?;

        Ok(Self {
            workspace,
            artifacts: Vec::new(),
            build_tag: inputs.target.build_tag.clone(),
            dist_tag,
        })
    }

    /// The NVR the remote service knows this build as
    fn download_identifier(&self) -> String {
        format!("{}.{}", self.build_tag, self.dist_tag)
    }

    fn fetch(&mut self) -> Result<(), ForgeError> {
        let nvr = self.download_identifier();
        tracing::debug!("Koji NVR: {nvr}");

        let download_dir = self.workspace.root_dir();
        CommandLine::new("koji")
            .arg("download-build")
            .arg(&nvr)
            .current_dir(&download_dir)
            .run()?;

        self.collect_packages(&download_dir)
    }

    /// Copy downloaded binary packages into the output directory
    ///
    /// The source package is rebuilt locally when needed; only binary
    /// packages are collected.
    fn collect_packages(&mut self, download_dir: &Path) -> Result<(), ForgeError> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(download_dir)
            .map_err(|e| ForgeError::Generic(format!("Failed to list downloads: {e}")))?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries {
            if !is_package_file(&path) || is_source_package(&path) {
                continue;
            }
            let dest = self
                .workspace
                .output_dir()
                .join(path.file_name().unwrap_or_default());
            filesystem::copy_file(&path, &dest)?;
            tracing::info!("Wrote: {}", dest.display());
            self.artifacts.push(Artifact::from_path(dest));
        }
        Ok(())
    }
}

impl Builder for KojiDownloadBuilder {
    fn setup_sources(&mut self) -> Result<(), ForgeError> {
        // Nothing to export; the build already happened remotely.
        Ok(())
    }

    fn tgz(&mut self) -> Result<(), ForgeError> {
        Ok(())
    }

    fn srpm(&mut self, _dist: Option<&str>) -> Result<(), ForgeError> {
        Ok(())
    }

    fn rpm(&mut self) -> Result<(), ForgeError> {
        tracing::info!(
            "Fetching rpms for {}.{} from koji:",
            self.build_tag,
            self.dist_tag
        );
        self.fetch()
    }

    fn cleanup(&mut self) -> Result<(), ForgeError> {
        self.workspace.cleanup()?;
        Ok(())
    }

    fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    fn srpm_path(&self) -> Option<&Path> {
        None
    }
}
