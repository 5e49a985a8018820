//! Default values and well-known names used across the crate

/// Project configuration file, looked up in the project directory
pub const CONFIG_FILENAME: &str = "tagforge.toml";

/// User configuration file, under the platform config directory
pub const USER_CONFIG_DIR: &str = "tagforge";

/// User configuration file name
pub const USER_CONFIG_FILENAME: &str = "config.toml";

/// Default directory binary and source packages are written to
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/tagforge";

/// rpmbuild sources directory inside a workspace
pub const SOURCES_DIR: &str = "SOURCES";

/// rpmbuild build directory inside a workspace
pub const BUILD_DIR: &str = "BUILD";

/// Directory mock copies chroot results into, inside a workspace
pub const MOCK_OUTPUT_DIR: &str = "mockoutput";

/// Path inside the mock chroot where built packages accumulate
pub const MOCK_CHROOT_RESULT_DIR: &str = "/builddir/build/RPMS/";

/// Spec file marker naming the upstream version a package is based on
pub const UPSTREAM_VERSION_MARKER: &str = "upstreamversion";

/// First git-annex version whose `lock` subcommand accepts `--force`
pub const ANNEX_FORCE_LOCK_VERSION: &str = "5.20131213";
