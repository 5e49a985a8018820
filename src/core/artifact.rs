//! Build artifacts
//!
//! The artifact list is the externally observable output of a build:
//! appended to as pipeline steps produce packages, never mutated once
//! appended.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Kind of package an artifact is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Source package (`.src.rpm`)
    SourcePackage,
    /// Binary package
    BinaryPackage,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourcePackage => write!(f, "source-package"),
            Self::BinaryPackage => write!(f, "binary-package"),
        }
    }
}

/// One produced package file
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Path of the package on disk
    pub path: PathBuf,
    /// Source or binary
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Classify a package file by its name
    pub fn from_path(path: PathBuf) -> Self {
        let kind = if is_source_package(&path) {
            ArtifactKind::SourcePackage
        } else {
            ArtifactKind::BinaryPackage
        };
        Self { path, kind }
    }
}

/// Whether `path` names a source package
pub fn is_source_package(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".src.rpm")
}

/// Whether `path` names any package file
pub fn is_package_file(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "rpm")
}
