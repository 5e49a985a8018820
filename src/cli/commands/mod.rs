//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build packages from a tagged revision
    Build {
        /// Build tag of the form name-version-release
        tag: String,

        /// Build the current HEAD instead of an existing tag
        #[arg(long)]
        test: bool,

        /// Skip tag-existence checks against the repository
        #[arg(long)]
        offline: bool,

        /// Builder strategy to use (overrides the project config)
        #[arg(short, long)]
        builder: Option<String>,

        /// Builder-specific argument, key=value (repeatable)
        #[arg(long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,

        /// Distribution tag to define for the build (e.g. el8)
        #[arg(long)]
        dist: Option<String>,

        /// Stop after building the source package
        #[arg(long)]
        srpm_only: bool,

        /// Directory to write packages to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the build root for inspection
        #[arg(long)]
        keep: bool,
    },
}

impl Commands {
    /// Dispatch to the command implementation
    pub fn run(self, json: bool) -> Result<()> {
        match self {
            Commands::Build {
                tag,
                test,
                offline,
                builder,
                args,
                dist,
                srpm_only,
                output,
                keep,
            } => {
                let cwd = std::env::current_dir()?;
                build::execute(
                    &cwd,
                    build::BuildCommand {
                        tag,
                        test,
                        offline,
                        builder,
                        args,
                        dist,
                        srpm_only,
                        output,
                        keep,
                        json,
                    },
                )
            }
        }
    }
}
