//! Build command implementation
//!
//! Implements `tagforge build`: resolves the target, constructs the
//! configured builder through the factory, and runs the pipeline.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::config::defaults::DEFAULT_OUTPUT_DIR;
use crate::core::builder::{self, BuildOptions, BuilderArgs, BuilderInputs};
use crate::core::config::{BuildConfig, UserConfig};
use crate::core::target::resolve_target;
use crate::infra::git::GitRepo;

/// Parsed build command
#[derive(Debug)]
pub struct BuildCommand {
    /// Build tag, name-version-release
    pub tag: String,
    /// Build the current HEAD
    pub test: bool,
    /// Skip tag-existence checks
    pub offline: bool,
    /// Builder override
    pub builder: Option<String>,
    /// key=value builder arguments
    pub args: Vec<String>,
    /// Distribution tag
    pub dist: Option<String>,
    /// Stop after the source package
    pub srpm_only: bool,
    /// Output directory override
    pub output: Option<PathBuf>,
    /// Keep the build root
    pub keep: bool,
    /// JSON artifact listing
    pub json: bool,
}

/// Split `--arg key=value` pairs; a bare key becomes a present-but-empty
/// argument (e.g. `--arg speedup`)
fn parse_builder_args(pairs: &[String]) -> BuilderArgs {
    let mut args = BuilderArgs::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) => args.insert(key, value),
            None => args.insert(pair.as_str(), ""),
        }
    }
    args
}

/// Execute the build command from `start_dir`
pub fn execute(start_dir: &Path, command: BuildCommand) -> Result<()> {
    let user_config = UserConfig::load().context("Failed to load user configuration")?;
    let config = BuildConfig::load(start_dir).context("Failed to load project configuration")?;

    let repo = GitRepo::discover(start_dir)
        .context("The build command must run inside a git working tree")?;
    let relative_project_dir = repo.relative_dir(start_dir);

    if command.tag.is_empty() {
        bail!("A build tag of the form name-version-release is required");
    }

    let offline = command.offline || user_config.offline.unwrap_or(false);
    let target = resolve_target(
        &repo,
        &command.tag,
        relative_project_dir,
        command.test,
        offline,
    )?;
    tracing::info!(
        "Building {}-{} from {}",
        target.project_name,
        target.display_version(),
        &target.commit[..target.commit.len().min(7)]
    );

    let output_dir = command
        .output
        .or(user_config.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let keep_workspace = command.keep || user_config.keep_workspace.unwrap_or(false);

    let builder_args = parse_builder_args(&command.args);
    let inputs = BuilderInputs {
        target: &target,
        repo: &repo,
        config: &config,
        output_dir: &output_dir,
        keep_workspace,
        offline,
    };

    let mut strategy = builder::create_builder(command.builder.as_deref(), &inputs, &builder_args)?;
    let artifacts = builder::run(
        strategy.as_mut(),
        &BuildOptions {
            dist: command.dist,
            srpm_only: command.srpm_only,
        },
    )?;

    output::print_artifacts(&artifacts, command.json);
    Ok(())
}
