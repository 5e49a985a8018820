//! Workspace manager integration tests

use assert_fs::prelude::*;
use predicates::prelude::*;
use tagforge::core::workspace::Workspace;

#[test]
fn test_workspace_layout() {
    let base = assert_fs::TempDir::new().unwrap();
    let ws = Workspace::create(base.path(), "foo", "foo-1.2", false).unwrap();

    let root = ws.root_dir();
    let root_name = root.file_name().unwrap().to_string_lossy().into_owned();
    base.child(&root_name).assert(predicate::path::is_dir());
    base.child(format!("{root_name}/SOURCES"))
        .assert(predicate::path::is_dir());
    base.child(format!("{root_name}/BUILD"))
        .assert(predicate::path::is_dir());

    assert_eq!(ws.output_dir(), base.path());
    assert_eq!(ws.git_copy_dir(), ws.source_dir().join("foo-1.2"));
}

#[test]
fn test_cleanup_removes_only_the_build_root() {
    let base = assert_fs::TempDir::new().unwrap();
    base.child("existing.rpm").write_str("not really an rpm").unwrap();

    let mut ws = Workspace::create(base.path(), "foo", "foo-1.2", false).unwrap();
    let root = ws.root_dir();
    ws.cleanup().unwrap();

    assert!(!root.exists());
    base.child("existing.rpm").assert(predicate::path::is_file());
}

#[test]
fn test_keep_flag_preserves_root_contents() {
    let base = assert_fs::TempDir::new().unwrap();
    let mut ws = Workspace::create(base.path(), "foo", "foo-1.2", true).unwrap();
    std::fs::write(ws.source_dir().join("foo-1.2.tar.gz"), "tarball").unwrap();
    let root = ws.root_dir();
    ws.cleanup().unwrap();

    assert!(root.join("SOURCES/foo-1.2.tar.gz").is_file());
}

#[test]
fn test_two_workspaces_do_not_collide() {
    let base = assert_fs::TempDir::new().unwrap();
    let ws1 = Workspace::create(base.path(), "foo", "foo-1.2", false).unwrap();
    let ws2 = Workspace::create(base.path(), "foo", "foo-1.2", false).unwrap();
    assert_ne!(ws1.root_dir(), ws2.root_dir());
}
