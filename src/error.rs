//! Error types for tagforge
//!
//! Domain-specific error types using thiserror. Module-local errors
//! (git, process, spec file, target resolution) live next to their code
//! and convert into [`ForgeError`] at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Builder argument validation errors
///
/// Raised at construction time, before any filesystem or process side
/// effect occurs.
#[derive(Error, Debug)]
pub enum ArgsError {
    /// A required builder argument was not supplied
    #[error("Builder '{builder}' requires argument '{key}' (pass --arg {key}=...)")]
    Missing { builder: String, key: String },

    /// An argument referenced a path that does not exist
    #[error("No such {what}: {path}")]
    NoSuchPath { what: String, path: PathBuf },
}

/// Builder factory errors
#[derive(Error, Debug)]
pub enum FactoryError {
    /// The configured builder name does not map to a known strategy
    #[error("Unknown builder '{name}'")]
    UnknownBuilder { name: String },
}

/// Workspace setup and teardown errors
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Failed to create the build root
    #[error("Failed to create build root under '{path}': {error}")]
    CreateRoot { path: PathBuf, error: String },

    /// Failed to create a directory inside the workspace
    #[error("Failed to create workspace directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove the build root
    #[error("Failed to remove build root '{path}': {error}")]
    Remove { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: String, error: String },
}

/// Top-level tagforge error type
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Builder argument error
    #[error(transparent)]
    Args(#[from] ArgsError),

    /// Builder factory error
    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// Workspace error
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] crate::infra::git::GitError),

    /// External process error
    #[error(transparent)]
    Process(#[from] crate::infra::process::ProcessError),

    /// Spec file error
    #[error("Spec file error: {0}")]
    Spec(#[from] crate::core::specfile::SpecError),

    /// Target resolution error
    #[error(transparent)]
    Target(#[from] crate::core::target::TargetError),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}
