//! CLI parsing tests

use clap::Parser;
use tagforge::cli::commands::Commands;
use tagforge::cli::Cli;

#[test]
fn test_build_command_parses() {
    let cli = Cli::try_parse_from([
        "tagforge",
        "build",
        "foo-1.2-3",
        "--builder",
        "mock",
        "--arg",
        "mock=fedora-39-x86_64",
        "--arg",
        "speedup",
        "--dist",
        "el8",
        "--keep",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Build {
            tag,
            builder,
            args,
            dist,
            keep,
            test,
            offline,
            srpm_only,
            ..
        }) => {
            assert_eq!(tag, "foo-1.2-3");
            assert_eq!(builder.as_deref(), Some("mock"));
            assert_eq!(args, vec!["mock=fedora-39-x86_64", "speedup"]);
            assert_eq!(dist.as_deref(), Some("el8"));
            assert!(keep);
            assert!(!test);
            assert!(!offline);
            assert!(!srpm_only);
        }
        other => panic!("Expected Build command, got: {other:?}"),
    }
}

#[test]
fn test_build_requires_tag() {
    let result = Cli::try_parse_from(["tagforge", "build"]);
    assert!(result.is_err());
}

#[test]
fn test_global_flags() {
    let cli = Cli::try_parse_from(["tagforge", "-vv", "--json", "build", "foo-1.2-3"]).unwrap();
    assert_eq!(cli.verbose, 2);
    assert!(cli.json);
    assert!(!cli.quiet);
}

#[test]
fn test_no_subcommand_is_allowed() {
    let cli = Cli::try_parse_from(["tagforge"]).unwrap();
    assert!(cli.command.is_none());
}
