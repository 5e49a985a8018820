//! Source archiver integration tests
//!
//! These exercise real git repositories and are skipped when the git
//! CLI is not installed.

mod common;

use common::{foo_package_repo, git_available, tar_available, GitFixture};
use tagforge::infra::git::{GitError, GitRepo};

#[test]
fn test_archive_reproduces_tracked_files() {
    if !git_available() || !tar_available() {
        eprintln!("git/tar not available, skipping");
        return;
    }
    let fixture = foo_package_repo();
    let repo = GitRepo::discover(fixture.path()).unwrap();
    let commit = repo.resolve_tag("foo-1.2-3").unwrap();

    let out = tempfile::TempDir::new().unwrap();
    let dest = out.path().join("foo-1.2.tar.gz");
    let archive = repo.archive(&commit, "", "foo-1.2", &dest).unwrap();
    assert!(dest.is_file());
    assert_eq!(archive.prefix, "foo-1.2");

    // Extract and compare against the tracked file set
    let extracted = tempfile::TempDir::new().unwrap();
    repo.extract_archive(&dest, extracted.path()).unwrap();
    let files = common::relative_files(&extracted.path().join("foo-1.2"));
    assert_eq!(
        files,
        vec![
            std::path::PathBuf::from("foo.spec"),
            std::path::PathBuf::from("src/main.c"),
        ]
    );
    let spec = std::fs::read_to_string(extracted.path().join("foo-1.2/foo.spec")).unwrap();
    assert_eq!(spec, common::FOO_SPEC);
}

#[test]
fn test_archive_is_byte_reproducible() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let fixture = foo_package_repo();
    let repo = GitRepo::discover(fixture.path()).unwrap();
    let commit = repo.resolve_tag("foo-1.2-3").unwrap();

    let out = tempfile::TempDir::new().unwrap();
    let first = repo
        .archive(&commit, "", "foo-1.2", &out.path().join("a.tar.gz"))
        .unwrap();
    let second = repo
        .archive(&commit, "", "foo-1.2", &out.path().join("b.tar.gz"))
        .unwrap();
    assert_eq!(first.sha256, second.sha256);
}

#[test]
fn test_archive_of_subdir() {
    if !git_available() || !tar_available() {
        eprintln!("git/tar not available, skipping");
        return;
    }
    let fixture = GitFixture::new();
    fixture.create_file("pkg/foo/foo.spec", common::FOO_SPEC);
    fixture.create_file("pkg/foo/data.txt", "payload\n");
    fixture.create_file("unrelated.txt", "elsewhere\n");
    fixture.commit_all("layout");
    let repo = GitRepo::discover(fixture.path()).unwrap();
    let head = fixture.head();

    let out = tempfile::TempDir::new().unwrap();
    let dest = out.path().join("foo-1.2.tar.gz");
    repo.archive(&head, "pkg/foo", "foo-1.2", &dest).unwrap();

    let extracted = tempfile::TempDir::new().unwrap();
    repo.extract_archive(&dest, extracted.path()).unwrap();
    let files = common::relative_files(extracted.path());
    assert_eq!(
        files,
        vec![
            std::path::PathBuf::from("foo-1.2/data.txt"),
            std::path::PathBuf::from("foo-1.2/foo.spec"),
        ]
    );
}

#[test]
fn test_archive_missing_commit_fails() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let fixture = foo_package_repo();
    let repo = GitRepo::discover(fixture.path()).unwrap();
    let out = tempfile::TempDir::new().unwrap();
    let result = repo.archive(
        "0000000000000000000000000000000000000000",
        "",
        "foo-1.2",
        &out.path().join("x.tar.gz"),
    );
    assert!(matches!(result, Err(GitError::CommitNotFound { .. })));
}

#[test]
fn test_archive_missing_subdir_fails() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let fixture = foo_package_repo();
    let repo = GitRepo::discover(fixture.path()).unwrap();
    let head = fixture.head();
    let out = tempfile::TempDir::new().unwrap();
    let result = repo.archive(&head, "no/such/dir", "foo-1.2", &out.path().join("x.tar.gz"));
    match result {
        Err(GitError::PathNotFound { path, .. }) => assert_eq!(path, "no/such/dir"),
        other => panic!("Expected PathNotFound, got: {other:?}"),
    }
}

#[test]
fn test_diff_relative_between_tags() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let fixture = foo_package_repo();
    fixture.create_file("src/main.c", "int main(void) { return 1; }\n");
    fixture.commit_all("change exit code");
    fixture.tag("foo-1.2-4");
    let repo = GitRepo::discover(fixture.path()).unwrap();

    let from = repo.resolve_tag("foo-1.2-3").unwrap();
    let to = repo.resolve_tag("foo-1.2-4").unwrap();
    let diff = repo.diff_relative(&from, &to, fixture.path()).unwrap();
    assert!(diff.contains("-int main(void) { return 0; }"));
    assert!(diff.contains("+int main(void) { return 1; }"));
}
