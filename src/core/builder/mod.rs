//! Builder strategy family
//!
//! A [`Builder`] turns a resolved [`BuildTarget`](crate::core::target::BuildTarget)
//! into package artifacts through a fixed pipeline: prepare sources,
//! synthesize the archive, build the source package, build binary
//! packages, clean up. Variants override individual steps; the factory
//! maps a configured name to a concrete strategy.

pub mod annex;
pub mod base;
pub mod gem;
pub mod koji;
pub mod mock;
pub mod upstream;

pub use annex::GitAnnexBuilder;
pub use base::{BuildContext, NoArchiveBuilder, ReleaseBuilder};
pub use gem::GemBuilder;
pub use koji::KojiDownloadBuilder;
pub use mock::MockBuilder;
pub use upstream::UpstreamBuilder;

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::artifact::Artifact;
use crate::core::config::BuildConfig;
use crate::core::target::BuildTarget;
use crate::error::{ArgsError, FactoryError, ForgeError};
use crate::infra::git::GitRepo;

/// Options for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Distribution tag to define for the build (e.g. `el8`)
    pub dist: Option<String>,
    /// Stop after the source package
    pub srpm_only: bool,
}

/// A build strategy
///
/// Steps are invoked in a fixed order by [`run`]; `cleanup` is invoked
/// on every exit path.
pub trait Builder {
    /// Populate the exported git copy and/or archive sources
    fn setup_sources(&mut self) -> Result<(), ForgeError>;

    /// Produce (or skip) the compressed source archive
    fn tgz(&mut self) -> Result<(), ForgeError>;

    /// Build the source package
    fn srpm(&mut self, dist: Option<&str>) -> Result<(), ForgeError>;

    /// Build binary packages
    fn rpm(&mut self) -> Result<(), ForgeError>;

    /// Release the workspace and any held external state
    fn cleanup(&mut self) -> Result<(), ForgeError>;

    /// Artifacts accumulated so far
    fn artifacts(&self) -> &[Artifact];

    /// Path of the built source package, once one exists
    fn srpm_path(&self) -> Option<&Path>;
}

/// Run the full pipeline on `builder`
///
/// Cleanup runs whether the steps succeed or not; a step error takes
/// precedence over a cleanup error when both occur.
pub fn run(
    builder: &mut dyn Builder,
    options: &BuildOptions,
) -> Result<Vec<Artifact>, ForgeError> {
    let outcome = run_steps(builder, options);
    let cleaned = builder.cleanup();
    outcome?;
    cleaned?;
    Ok(builder.artifacts().to_vec())
}

fn run_steps(builder: &mut dyn Builder, options: &BuildOptions) -> Result<(), ForgeError> {
    builder.setup_sources()?;
    builder.tgz()?;
    builder.srpm(options.dist.as_deref())?;
    if !options.srpm_only {
        builder.rpm()?;
    }
    Ok(())
}

/// Free-form keyword arguments passed to a builder variant
#[derive(Debug, Clone, Default)]
pub struct BuilderArgs {
    map: BTreeMap<String, String>,
}

impl BuilderArgs {
    /// Empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set one argument
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    /// Look up an argument
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Whether an argument is present (value may be empty)
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Validate that every declared-required key is present
    ///
    /// Variants call this first in their constructors, before any
    /// filesystem or process side effect.
    pub fn require_all(&self, builder: &str, required: &[&str]) -> Result<(), ArgsError> {
        for key in required {
            if !self.contains(key) {
                return Err(ArgsError::Missing {
                    builder: builder.to_string(),
                    key: (*key).to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Everything the factory needs to construct a variant
#[derive(Debug, Clone)]
pub struct BuilderInputs<'a> {
    /// Resolved build target
    pub target: &'a BuildTarget,
    /// Repository the target lives in
    pub repo: &'a GitRepo,
    /// Project configuration
    pub config: &'a BuildConfig,
    /// Shared output directory artifacts land in
    pub output_dir: &'a Path,
    /// Keep build roots after the run
    pub keep_workspace: bool,
    /// Suppress tag-existence checks
    pub offline: bool,
}

/// Known builder strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderKind {
    Release,
    NoArchive,
    Upstream,
    Gem,
    Mock,
    KojiDownload,
    GitAnnex,
}

fn builder_kind(name: &str) -> Option<BuilderKind> {
    // Accept short names and class-style names, including dotted paths
    // carried over from older configs.
    let tail = name.rsplit(['.', ':']).next().unwrap_or(name);
    match tail {
        "release" | "default" | "Builder" | "ReleaseBuilder" => Some(BuilderKind::Release),
        "noarchive" | "no-archive" | "NoArchiveBuilder" | "NoTgzBuilder" => {
            Some(BuilderKind::NoArchive)
        }
        "upstream" | "UpstreamBuilder" => Some(BuilderKind::Upstream),
        "gem" | "GemBuilder" => Some(BuilderKind::Gem),
        "mock" | "MockBuilder" => Some(BuilderKind::Mock),
        "koji" | "koji-download" | "KojiDownloadBuilder" => Some(BuilderKind::KojiDownload),
        "annex" | "git-annex" | "GitAnnexBuilder" => Some(BuilderKind::GitAnnex),
        _ => None,
    }
}

/// Construct the builder selected by `name_override`, the project
/// config, or the default release strategy, in that order
pub fn create_builder(
    name_override: Option<&str>,
    inputs: &BuilderInputs<'_>,
    args: &BuilderArgs,
) -> Result<Box<dyn Builder>, ForgeError> {
    let name = name_override
        .or_else(|| inputs.config.builder())
        .unwrap_or("release");
    let kind = builder_kind(name).ok_or_else(|| FactoryError::UnknownBuilder {
        name: name.to_string(),
    })?;

    tracing::debug!("Selected builder: {kind:?}");
    match kind {
        BuilderKind::Release => Ok(Box::new(ReleaseBuilder::new(inputs)?)),
        BuilderKind::NoArchive => Ok(Box::new(NoArchiveBuilder::new(inputs)?)),
        BuilderKind::Upstream => Ok(Box::new(UpstreamBuilder::new(inputs)?)),
        BuilderKind::Gem => Ok(Box::new(GemBuilder::new(inputs)?)),
        BuilderKind::Mock => Ok(Box::new(MockBuilder::new(inputs, args)?)),
        BuilderKind::KojiDownload => Ok(Box::new(KojiDownloadBuilder::new(inputs, args)?)),
        BuilderKind::GitAnnex => Ok(Box::new(GitAnnexBuilder::new(inputs)?)),
    }
}

/// Construct the builder a wrapping variant delegates to
///
/// Uses the project's configured builder, but never another wrapper;
/// a config that names one falls back to the release strategy.
pub(crate) fn create_delegate(
    inputs: &BuilderInputs<'_>,
    args: &BuilderArgs,
) -> Result<Box<dyn Builder>, ForgeError> {
    let configured = inputs.config.builder().and_then(builder_kind);
    let name = match configured {
        Some(BuilderKind::Mock | BuilderKind::KojiDownload) | None => Some("release"),
        _ => None,
    };
    create_builder(name, inputs, args)
}
