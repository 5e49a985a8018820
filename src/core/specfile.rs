//! Spec file scanning and editing
//!
//! The upstream builder declares generated patches inside an exported
//! copy of the package's spec file. Editing is two-phase: a scan over
//! the unmodified lines computes the insertion plan, then a pure
//! function produces a new line sequence with the declaration and apply
//! directive spliced in.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::config::defaults::UPSTREAM_VERSION_MARKER;

/// Spec file errors
#[derive(Error, Debug)]
pub enum SpecError {
    /// No spec file in the exported sources
    #[error("No spec file found in '{dir}'")]
    NotFound { dir: PathBuf },

    /// Nowhere to declare or apply a patch
    #[error(
        "Unable to insert patch lines into spec file \
         (declaration index {declaration_index}, apply index {apply_index})"
    )]
    PatchInsertion {
        declaration_index: usize,
        apply_index: usize,
    },

    /// The generated diff contains binary content
    #[error("Diff between '{from}' and '{to}' contains binary files; binary patches are not supported")]
    BinaryPatch { from: String, to: String },
}

fn patch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Patch(\d+):").unwrap())
}

fn source_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Source(\d+)?:").unwrap())
}

fn binary_diff_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Binary files .* differ").unwrap())
}

/// Where a new patch goes in a spec file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchInsertion {
    /// Number for the new `Patch<N>:` line, one past the highest existing
    pub patch_number: u32,
    /// Line index the declaration is inserted at
    pub declaration_index: usize,
    /// Line index the `%patch` directive is inserted at, computed so it
    /// lands directly after `%setup` (or `%prep`) once the declaration
    /// has shifted the tail by one
    pub apply_index: usize,
}

/// Find the single `.spec` file in `dir`
pub fn find_spec_file(dir: &Path) -> Result<PathBuf, SpecError> {
    let mut specs: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|_| SpecError::NotFound {
            dir: dir.to_path_buf(),
        })?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "spec"))
        .collect();
    specs.sort();
    specs.into_iter().next().ok_or_else(|| SpecError::NotFound {
        dir: dir.to_path_buf(),
    })
}

/// Value of the `%define upstreamversion <v>` marker, if present
pub fn upstream_version(lines: &[String]) -> Option<String> {
    for line in lines {
        if !line.contains(UPSTREAM_VERSION_MARKER) {
            continue;
        }
        let mut words = line.split_whitespace();
        let directive = words.next()?;
        if (directive == "%define" || directive == "%global")
            && words.next() == Some(UPSTREAM_VERSION_MARKER)
        {
            return words.next().map(str::to_string);
        }
    }
    None
}

/// Scan `lines` and compute where a new patch must be declared and applied
///
/// The declaration goes one past the last `Source<N>:` or `Patch<N>:`
/// line; the patch number continues one past the highest existing
/// `Patch<N>`. The apply directive goes two lines past `%setup` if one
/// exists, else two lines past `%prep`. Both locations must be found.
pub fn plan_patch_insertion(lines: &[String]) -> Result<PatchInsertion, SpecError> {
    let mut patch_number = 0u32;
    let mut declaration_index = 0usize;
    let mut apply_index = 0usize;

    for (i, line) in lines.iter().enumerate() {
        if source_re().is_match(line) {
            declaration_index = i + 1;
        }
        if let Some(caps) = patch_re().captures(line) {
            declaration_index = i + 1;
            if let Ok(n) = caps[1].parse::<u32>() {
                patch_number = n + 1;
            }
        }
        if line.starts_with("%prep") {
            apply_index = i + 2;
        } else if line.starts_with("%setup") {
            apply_index = i + 2;
        }
    }

    tracing::debug!("declaration_index = {declaration_index}");
    tracing::debug!("apply_index = {apply_index}");
    if declaration_index == 0 || apply_index == 0 {
        return Err(SpecError::PatchInsertion {
            declaration_index,
            apply_index,
        });
    }

    Ok(PatchInsertion {
        patch_number,
        declaration_index,
        apply_index,
    })
}

/// Produce a new line sequence with the patch declared and applied
///
/// The declaration is inserted first; `plan.apply_index` already accounts
/// for the one-line shift that causes.
pub fn insert_patch(lines: &[String], plan: &PatchInsertion, patch_filename: &str) -> Vec<String> {
    let mut out: Vec<String> = lines.to_vec();
    out.insert(
        plan.declaration_index,
        format!("Patch{}: {}", plan.patch_number, patch_filename),
    );
    out.insert(
        plan.apply_index,
        format!("%patch{} -p1", plan.patch_number),
    );
    out
}

/// Whether a generated diff contains binary content
pub fn is_binary_diff(diff: &str) -> bool {
    binary_diff_re().is_match(diff)
}

/// Split file content into lines, preserving everything but the `\n`s
pub fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(str::to_string).collect()
}

/// Inverse of [`split_lines`]
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_lines(content: &str) -> Vec<String> {
        split_lines(content)
    }

    const BASIC_SPEC: &str = "\
Name: foo
Version: 1.2
Release: 3%{?dist}
Source0: foo-1.2.tar.gz
Source3: extra.conf

%description
Test package.

%prep
%setup -q

%build
make
";

    #[test]
    fn test_plan_after_highest_source_and_setup() {
        let lines = spec_lines(BASIC_SPEC);
        let plan = plan_patch_insertion(&lines).unwrap();
        // Declaration directly after the Source3 line
        assert_eq!(plan.declaration_index, 5);
        assert_eq!(plan.patch_number, 0);
        // Apply two past %setup, compensating for the declaration shift
        assert_eq!(plan.apply_index, 12);
    }

    #[test]
    fn test_insert_lands_adjacent_to_anchors() {
        let lines = spec_lines(BASIC_SPEC);
        let plan = plan_patch_insertion(&lines).unwrap();
        let out = insert_patch(&lines, &plan, "fix.patch");

        let decl = out.iter().position(|l| l == "Patch0: fix.patch").unwrap();
        assert!(out[decl - 1].starts_with("Source3:"));

        let apply = out.iter().position(|l| l == "%patch0 -p1").unwrap();
        assert!(out[apply - 1].starts_with("%setup"));
    }

    #[test]
    fn test_patch_number_continues_from_highest() {
        let content = "\
Name: foo
Source0: foo.tar.gz
Patch0: a.patch
Patch7: b.patch

%prep
%setup -q
%patch0 -p1
%patch7 -p1
";
        let lines = spec_lines(content);
        let plan = plan_patch_insertion(&lines).unwrap();
        assert_eq!(plan.patch_number, 8);
        // Declaration directly after Patch7
        assert_eq!(plan.declaration_index, 4);
    }

    #[test]
    fn test_prep_without_setup_applies_after_prep() {
        let content = "\
Name: foo
Source0: foo.tar.gz

%prep
echo nothing

%build
";
        let lines = spec_lines(content);
        let plan = plan_patch_insertion(&lines).unwrap();
        let out = insert_patch(&lines, &plan, "fix.patch");
        let apply = out.iter().position(|l| l == "%patch0 -p1").unwrap();
        assert!(out[apply - 1].starts_with("%prep"));
    }

    #[test]
    fn test_missing_prep_and_setup_fails() {
        let content = "Name: foo\nSource0: foo.tar.gz\n\n%build\nmake\n";
        let lines = spec_lines(content);
        match plan_patch_insertion(&lines) {
            Err(SpecError::PatchInsertion {
                declaration_index,
                apply_index,
            }) => {
                assert!(declaration_index > 0);
                assert_eq!(apply_index, 0);
            }
            other => panic!("Expected PatchInsertion error, got: {other:?}"),
        }
    }

    #[test]
    fn test_missing_source_lines_fails() {
        let content = "Name: foo\n\n%prep\n%setup -q\n";
        let lines = spec_lines(content);
        match plan_patch_insertion(&lines) {
            Err(SpecError::PatchInsertion {
                declaration_index, ..
            }) => assert_eq!(declaration_index, 0),
            other => panic!("Expected PatchInsertion error, got: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_insertion_stacks_after_previous_patch() {
        let lines = spec_lines(BASIC_SPEC);
        let plan = plan_patch_insertion(&lines).unwrap();
        let once = insert_patch(&lines, &plan, "first.patch");

        let plan2 = plan_patch_insertion(&once).unwrap();
        assert_eq!(plan2.patch_number, 1);
        let twice = insert_patch(&once, &plan2, "second.patch");

        let decl1 = twice.iter().position(|l| l == "Patch0: first.patch").unwrap();
        let decl2 = twice.iter().position(|l| l == "Patch1: second.patch").unwrap();
        assert_eq!(decl2, decl1 + 1);

        // The second apply directive lands right after %setup, ahead of
        // the first one; the apply offset is anchored to %setup, not to
        // previously inserted %patch lines.
        let apply1 = twice.iter().position(|l| l == "%patch0 -p1").unwrap();
        let apply2 = twice.iter().position(|l| l == "%patch1 -p1").unwrap();
        assert_eq!(apply2 + 1, apply1);
        assert!(twice[apply2 - 1].starts_with("%setup"));
    }

    #[test]
    fn test_upstream_version_marker() {
        let lines = spec_lines("%define upstreamversion 9.9\nName: foo\n");
        assert_eq!(upstream_version(&lines), Some("9.9".to_string()));
    }

    #[test]
    fn test_upstream_version_global_form() {
        let lines = spec_lines("%global upstreamversion 2.0.1\n");
        assert_eq!(upstream_version(&lines), Some("2.0.1".to_string()));
    }

    #[test]
    fn test_upstream_version_absent() {
        let lines = spec_lines("Name: foo\nVersion: 1.2\n");
        assert_eq!(upstream_version(&lines), None);
    }

    #[test]
    fn test_binary_diff_detection() {
        assert!(is_binary_diff(
            "diff --git a/x b/x\nBinary files a/x and b/x differ\n"
        ));
        assert!(!is_binary_diff("--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n"));
    }

    #[test]
    fn test_split_join_preserves_content() {
        let content = "a\nb\n\nc\n";
        assert_eq!(join_lines(&split_lines(content)), content);
    }

    #[test]
    fn test_find_spec_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("foo.spec"), "Name: foo\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x\n").unwrap();
        let found = find_spec_file(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "foo.spec");
    }

    #[test]
    fn test_find_spec_file_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            find_spec_file(dir.path()),
            Err(SpecError::NotFound { .. })
        ));
    }
}
