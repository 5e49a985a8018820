//! Chroot-delegating strategy
//!
//! Uses the mock tool to build binary packages inside a chroot for a
//! different OS environment than the host. The source package still has
//! to be produced the normal way first, so this variant composes the
//! project's normally configured builder and delegates the early
//! pipeline steps to it.

use std::path::{Path, PathBuf};

use crate::config::defaults::{MOCK_CHROOT_RESULT_DIR, MOCK_OUTPUT_DIR};
use crate::core::artifact::{is_package_file, Artifact};
use crate::core::builder::{self, Builder, BuilderArgs, BuilderInputs};
use crate::core::workspace::Workspace;
use crate::error::{ArgsError, ForgeError};
use crate::infra::filesystem;
use crate::infra::process::{tool_available, CommandLine};

/// Arguments this variant refuses to construct without
pub const REQUIRED_ARGS: &[&str] = &["mock"];

/// Builder that compiles inside a mock chroot
pub struct MockBuilder {
    delegate: Box<dyn Builder>,
    workspace: Workspace,
    artifacts: Vec<Artifact>,
    srpm_path: Option<PathBuf>,
    project_label: String,
    mock_root: String,
    mock_args: Vec<String>,
    speedup: bool,
}

impl MockBuilder {
    /// Construct for the given inputs
    ///
    /// Required: `mock` (the chroot config name). Optional:
    /// `mock_config_dir` (relative paths are anchored below the git
    /// root and must exist), `speedup` (skip `--init`, leave the chroot
    /// dirty), `mock_args` (free-form extra arguments).
    pub fn new(inputs: &BuilderInputs<'_>, args: &BuilderArgs) -> Result<Self, ForgeError> {
        args.require_all("mock", REQUIRED_ARGS)?;

        let mut mock_args: Vec<String> = Vec::new();
        if let Some(config_dir) = args.get("mock_config_dir") {
            let config_dir = if Path::new(config_dir).is_absolute() {
                PathBuf::from(config_dir)
            } else {
                inputs.repo.root().join(config_dir)
            };
            if !config_dir.exists() {
                return Err(ArgsError::NoSuchPath {
                    what: "mock config dir".to_string(),
                    path: config_dir,
                }
                .into());
            }
            mock_args.push(format!("--configdir={}", config_dir.display()));
        }

        let speedup = args.contains("speedup");
        if speedup {
            mock_args.push("--no-clean".to_string());
            mock_args.push("--no-cleanup-after".to_string());
        }
        if let Some(extra) = args.get("mock_args") {
            mock_args.extend(extra.split_whitespace().map(String::from));
        }

        if !tool_available("mock") {
            return Err(ForgeError::Generic(
                "mock not found on PATH; install mock to use this builder".to_string(),
            ));
        }

        // The project's normal builder produces the SRPM we feed into
        // the chroot.
        let delegate = builder::create_delegate(inputs, args)?;

        let workspace = Workspace::create(
            inputs.output_dir,
            &inputs.target.project_name,
            &inputs.target.archive_prefix(),
            inputs.keep_workspace,
        )?;

        Ok(Self {
            delegate,
            workspace,
            artifacts: Vec::new(),
            srpm_path: None,
            project_label: format!(
                "{}-{}",
                inputs.target.project_name,
                inputs.target.display_version()
            ),
            mock_root: args.get("mock").unwrap_or_default().to_string(),
            mock_args,
            speedup,
        })
    }

    fn mock_command(&self) -> CommandLine {
        CommandLine::new("mock")
            .args(self.mock_args.iter().cloned())
            .arg("-r")
            .arg(self.mock_root.clone())
    }

    fn build_in_mock(&mut self) -> Result<(), ForgeError> {
        let srpm = self
            .srpm_path
            .clone()
            .ok_or_else(|| ForgeError::Generic("No source package to feed into mock".into()))?;

        if self.speedup {
            tracing::info!("Skipping mock --init due to speedup option");
        } else {
            tracing::info!("Initializing mock...");
            self.mock_command().arg("--init").run()?;
        }

        tracing::info!("Building RPMs in mock...");
        self.mock_command()
            .arg("--rebuild")
            .arg(srpm.to_string_lossy().into_owned())
            .run()?;

        let mock_output_dir = self.workspace.root_dir().join(MOCK_OUTPUT_DIR);
        filesystem::create_dir_all(&mock_output_dir)?;
        self.mock_command()
            .arg("--copyout")
            .arg(MOCK_CHROOT_RESULT_DIR)
            .arg(mock_output_dir.to_string_lossy().into_owned())
            .run()?;

        // Everything mock wrote out moves to the shared output dir.
        for entry in walkdir::WalkDir::new(&mock_output_dir)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if !is_package_file(path) {
                continue;
            }
            let dest = self
                .workspace
                .output_dir()
                .join(path.file_name().unwrap_or_default());
            filesystem::copy_file(path, &dest)?;
            tracing::info!("Wrote: {}", dest.display());
            self.artifacts.push(Artifact::from_path(dest));
        }
        Ok(())
    }
}

impl Builder for MockBuilder {
    fn setup_sources(&mut self) -> Result<(), ForgeError> {
        self.delegate.setup_sources()
    }

    fn tgz(&mut self) -> Result<(), ForgeError> {
        self.delegate.tgz()
    }

    fn srpm(&mut self, dist: Option<&str>) -> Result<(), ForgeError> {
        self.delegate.srpm(dist)?;
        let srpm = self.delegate.srpm_path().map(Path::to_path_buf);
        if let Some(srpm) = srpm {
            self.artifacts.push(Artifact::from_path(srpm.clone()));
            self.srpm_path = Some(srpm);
        }
        Ok(())
    }

    fn rpm(&mut self) -> Result<(), ForgeError> {
        tracing::info!(
            "Creating rpms for {} in mock: {}",
            self.project_label,
            self.mock_root
        );
        if self.srpm_path.is_none() {
            self.srpm(None)?;
        }
        self.build_in_mock()
    }

    fn cleanup(&mut self) -> Result<(), ForgeError> {
        // Both the delegate's workspace and ours must go, even if one
        // removal fails.
        let delegate = self.delegate.cleanup();
        let own = self.workspace.cleanup();
        delegate?;
        own?;
        Ok(())
    }

    fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    fn srpm_path(&self) -> Option<&Path> {
        self.srpm_path.as_deref()
    }
}
