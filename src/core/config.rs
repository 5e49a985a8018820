//! Build configuration
//!
//! Two layers: the project's `tagforge.toml` next to the packaging
//! sources (section `[buildconfig]` selects the builder and carries
//! free-form keys like `upstream_name`), and an optional per-user
//! `config.toml` under the platform config directory with defaults for
//! output location and workspace retention. CLI flags override both.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::defaults::{CONFIG_FILENAME, USER_CONFIG_DIR, USER_CONFIG_FILENAME};
use crate::error::ConfigError;

/// Name of the table builder settings live in
const BUILDCONFIG_SECTION: &str = "buildconfig";

/// Project configuration backed by a toml table
///
/// Kept as a table rather than a fixed struct: builder variants read
/// their own keys out of `[buildconfig]`.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    table: toml::Table,
}

impl BuildConfig {
    /// Load from `dir/tagforge.toml`; absent file means empty config
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            error: e,
        })
    }

    /// Parse from a toml string
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let table: toml::Table = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
        Ok(Self { table })
    }

    /// Look up a string value in a section
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.table
            .get(section)?
            .as_table()?
            .get(key)?
            .as_str()
    }

    /// Configured builder name, if any
    pub fn builder(&self) -> Option<&str> {
        self.get(BUILDCONFIG_SECTION, "builder")
    }

    /// Configured upstream project name, if any
    pub fn upstream_name(&self) -> Option<&str> {
        self.get(BUILDCONFIG_SECTION, "upstream_name")
    }
}

/// Per-user defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Directory packages are written to
    pub output_dir: Option<PathBuf>,

    /// Keep build roots for inspection instead of removing them
    pub keep_workspace: Option<bool>,

    /// Skip tag-existence checks against the repository
    pub offline: Option<bool>,
}

impl UserConfig {
    /// Load from the platform config directory; absent file means defaults
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path; absent file means defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Location of the user config file, if a config dir exists
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(USER_CONFIG_DIR).join(USER_CONFIG_FILENAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig::load(dir.path()).unwrap();
        assert!(config.builder().is_none());
        assert!(config.upstream_name().is_none());
    }

    #[test]
    fn test_buildconfig_lookup() {
        let config = BuildConfig::from_toml(
            "[buildconfig]\nbuilder = \"upstream\"\nupstream_name = \"spacewalk-java\"\n",
        )
        .unwrap();
        assert_eq!(config.builder(), Some("upstream"));
        assert_eq!(config.upstream_name(), Some("spacewalk-java"));
        assert_eq!(config.get("buildconfig", "missing"), None);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "not [ valid").unwrap();
        assert!(matches!(
            BuildConfig::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_user_config_defaults() {
        let dir = TempDir::new().unwrap();
        let config = UserConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.output_dir.is_none());
        assert!(config.keep_workspace.is_none());
    }

    #[test]
    fn test_user_config_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output_dir = \"/var/tmp/out\"\nkeep_workspace = true\n").unwrap();
        let config = UserConfig::load_from(&path).unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("/var/tmp/out")));
        assert_eq!(config.keep_workspace, Some(true));
    }
}
