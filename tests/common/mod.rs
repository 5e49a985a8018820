//! Common test utilities and helpers
//!
//! Provides scratch git repositories for integration tests. Tests that
//! need the git CLI call [`git_available`] first and return early when
//! it is missing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Whether the git CLI is present on this machine
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Whether tar is present on this machine
pub fn tar_available() -> bool {
    Command::new("tar")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A scratch git repository
pub struct GitFixture {
    dir: TempDir,
}

impl GitFixture {
    /// Initialize an empty repository
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let fixture = Self { dir };
        fixture.git(&["init", "-q"]);
        fixture
    }

    /// Repository root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run a git command in the repository, panicking on failure
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-c")
            .arg("user.name=Test")
            .arg("-c")
            .arg("user.email=test@example.com")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Write a file relative to the repository root
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Stage everything and commit
    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Create a lightweight tag at HEAD
    pub fn tag(&self, name: &str) {
        self.git(&["tag", name]);
    }

    /// Commit id of HEAD
    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }
}

/// A minimal spec file for a package named `foo`
pub const FOO_SPEC: &str = "\
Name: foo
Version: 1.2
Release: 3%{?dist}
Summary: Test package
License: GPL-2.0-or-later
Source0: foo-1.2.tar.gz

%description
Test package.

%prep
%setup -q

%build
true

%files
";

/// Create a repository holding the `foo` package, committed and tagged
/// `foo-1.2-3`
pub fn foo_package_repo() -> GitFixture {
    let repo = GitFixture::new();
    repo.create_file("foo.spec", FOO_SPEC);
    repo.create_file("src/main.c", "int main(void) { return 0; }\n");
    repo.commit_all("Initial import");
    repo.tag("foo-1.2-3");
    repo
}

/// Output directory for a test, as a `TempDir`
pub fn output_dir() -> TempDir {
    TempDir::new().expect("Failed to create output directory")
}

/// Paths of all files under `dir`, relative to it, sorted
pub fn relative_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}
