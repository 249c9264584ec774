use super::{
    read_current_version, write_current_version, BumpPart, VersionTool, BV_CURRENT_VER_OPTION,
    BV_NEW_VER_OPTION,
};
use crate::error::{CommandFailure, Result, VersionFlowError};
use crate::git::Repository;
use log::debug;
use std::path::{Path, PathBuf};

/// In-process version-file tool: ini rewrite plus semver arithmetic.
pub struct BumpVersion {
    config_file: PathBuf,
    current_version: String,
}

impl BumpVersion {
    /// Read an existing version file.
    ///
    /// # Returns
    /// * `Some(tool)` - the file has a `[bumpversion]` `current_version`
    /// * `None` - the file is missing or unusable
    pub fn from_existing<P: AsRef<Path>>(config_file: P) -> Option<Self> {
        let config_file = config_file.as_ref().to_path_buf();
        let current_version = read_current_version(&config_file)?;

        Some(BumpVersion {
            config_file,
            current_version,
        })
    }

    /// Write `start_version` into the version file and return the tool for it
    pub fn initialize<P: AsRef<Path>>(config_file: P, start_version: &str) -> Result<Self> {
        let config_file = config_file.as_ref().to_path_buf();
        write_current_version(&config_file, start_version)?;
        debug!(
            "wrote {} with {}={}",
            config_file.display(),
            BV_CURRENT_VER_OPTION,
            start_version
        );

        Ok(BumpVersion {
            config_file,
            current_version: start_version.to_string(),
        })
    }

    fn failure(&self, part: BumpPart, message: impl Into<String>) -> CommandFailure {
        CommandFailure::new(
            format!("bump {} in {}", part, self.config_file.display()),
            1,
        )
        .with_stderr(message)
    }

    fn compute(&self, part: BumpPart) -> Option<String> {
        let current = semver::Version::parse(&self.current_version).ok()?;
        Some(part.apply(&current).to_string())
    }
}

impl VersionTool for BumpVersion {
    fn current_version(&self) -> &str {
        &self.current_version
    }

    fn dry_run(&self, part: BumpPart) -> Result<String> {
        let mut listing = format!("{}={}\n", BV_CURRENT_VER_OPTION, self.current_version);
        if let Some(new_version) = self.compute(part) {
            listing.push_str(&format!("{}={}\n", BV_NEW_VER_OPTION, new_version));
        }

        Ok(listing)
    }

    fn bump_and_commit(&mut self, part: BumpPart, repo: &dyn Repository) -> Result<String> {
        let new_version = self.compute(part).ok_or_else(|| {
            VersionFlowError::CommitVersion(self.failure(
                part,
                format!("'{}' is not a semantic version", self.current_version),
            ))
        })?;

        write_current_version(&self.config_file, &new_version).map_err(|e| {
            VersionFlowError::CommitVersion(self.failure(part, e.to_string()))
        })?;

        let message = format!("Bump version: {} → {}", self.current_version, new_version);
        repo.commit_paths(&[self.config_file.as_path()], &message)
            .map_err(|e| {
                let stderr = e
                    .failure()
                    .map(|f| f.stderr.clone())
                    .unwrap_or_else(|| e.to_string());
                VersionFlowError::CommitVersion(self.failure(part, stderr))
            })?;
        debug!("{}", message);

        self.current_version = new_version.clone();
        Ok(new_version)
    }
}
