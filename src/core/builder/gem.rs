//! Gem-source strategy
//!
//! For packages whose sources are managed as a gem source structure and
//! whose upstream does not keep built `.gem` files in git. The tree is
//! exported like the release strategy, then `gem build` produces the
//! gem that becomes the package source.

use std::path::{Path, PathBuf};

use crate::core::artifact::Artifact;
use crate::core::builder::base::BuildContext;
use crate::core::builder::{Builder, BuilderInputs};
use crate::error::ForgeError;
use crate::infra::filesystem;
use crate::infra::process::CommandLine;

/// Builder for gem-structured sources
#[derive(Debug)]
pub struct GemBuilder {
    ctx: BuildContext,
}

impl GemBuilder {
    /// Construct for the given inputs
    pub fn new(inputs: &BuilderInputs<'_>) -> Result<Self, ForgeError> {
        Ok(Self {
            ctx: BuildContext::new(inputs)?,
        })
    }

    fn find_gemspec(&self) -> Result<PathBuf, ForgeError> {
        let dir = self.ctx.workspace.git_copy_dir();
        let mut gemspecs: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| ForgeError::Generic(format!("Failed to list '{}': {e}", dir.display())))?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == "gemspec"))
            .collect();
        gemspecs.sort();
        gemspecs.into_iter().next().ok_or_else(|| {
            ForgeError::Generic(format!("No .gemspec file found in '{}'", dir.display()))
        })
    }

    /// Build the gem and copy it into `SOURCES`
    fn build_gem(&mut self) -> Result<(), ForgeError> {
        let gemspec = self.find_gemspec()?;
        let git_copy = self.ctx.workspace.git_copy_dir().to_path_buf();
        tracing::debug!("Building gem: {} in {}", gemspec.display(), git_copy.display());

        let out = CommandLine::new("gem")
            .arg("build")
            .arg(gemspec.to_string_lossy().into_owned())
            .current_dir(&git_copy)
            .run()?;
        let gem_name = parse_gem_build_output(&out.stdout).ok_or_else(|| {
            ForgeError::Generic("gem build did not report a built file".to_string())
        })?;

        let built = git_copy.join(&gem_name);
        let dest = self.ctx.workspace.source_dir().join(&gem_name);
        filesystem::copy_file(&built, &dest)?;
        self.ctx.sources.push(dest);
        Ok(())
    }
}

/// File name reported by `gem build`
fn parse_gem_build_output(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("File:"))
        .map(|name| name.trim().to_string())
}

impl Builder for GemBuilder {
    fn setup_sources(&mut self) -> Result<(), ForgeError> {
        let archive = self.ctx.export_archive()?;
        self.ctx.extract_git_copy(&archive)?;
        self.build_gem()?;
        self.ctx.locate_spec()?;
        Ok(())
    }

    fn tgz(&mut self) -> Result<(), ForgeError> {
        Ok(())
    }

    fn srpm(&mut self, dist: Option<&str>) -> Result<(), ForgeError> {
        let sourcedir = self.ctx.workspace.source_dir().to_path_buf();
        self.ctx.build_srpm(dist, &sourcedir)
    }

    fn rpm(&mut self) -> Result<(), ForgeError> {
        let sourcedir = self.ctx.workspace.source_dir().to_path_buf();
        self.ctx.build_rpm(&sourcedir)
    }

    fn cleanup(&mut self) -> Result<(), ForgeError> {
        self.ctx.workspace.cleanup()?;
        Ok(())
    }

    fn artifacts(&self) -> &[Artifact] {
        &self.ctx.artifacts
    }

    fn srpm_path(&self) -> Option<&Path> {
        self.ctx.srpm_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gem_build_output() {
        let output = "\
  Successfully built RubyGem
  Name: tagfoo
  Version: 1.2.0
  File: tagfoo-1.2.0.gem
";
        assert_eq!(
            parse_gem_build_output(output),
            Some("tagfoo-1.2.0.gem".to_string())
        );
    }

    #[test]
    fn test_parse_gem_build_output_missing_file_line() {
        assert_eq!(parse_gem_build_output("nothing useful\n"), None);
    }
}
