use super::{read_current_version, write_current_version, BumpPart, VersionTool};
use crate::error::{CommandFailure, Result, VersionFlowError};
use crate::git::Repository;
use crate::process;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

const BUMPVERSION: &str = "bumpversion";

/// Drives the external `bumpversion` tool.
///
/// The current version is still read from the file directly; only the dry
/// run and the bump itself go through the subprocess.
pub struct BumpVersionCommand {
    config_file: PathBuf,
    repo_dir: PathBuf,
    current_version: String,
}

impl BumpVersionCommand {
    /// Read an existing version file, running the tool from `repo_dir`
    pub fn from_existing<P: AsRef<Path>, R: AsRef<Path>>(config_file: P, repo_dir: R) -> Option<Self> {
        let config_file = config_file.as_ref().to_path_buf();
        let current_version = read_current_version(&config_file)?;

        Some(BumpVersionCommand {
            config_file,
            repo_dir: repo_dir.as_ref().to_path_buf(),
            current_version,
        })
    }

    /// Write `start_version` into the version file.
    ///
    /// `bumpversion` cannot create its own configuration, so this part is
    /// always done in process.
    pub fn initialize<P: AsRef<Path>, R: AsRef<Path>>(
        config_file: P,
        repo_dir: R,
        start_version: &str,
    ) -> Result<Self> {
        let config_file = config_file.as_ref().to_path_buf();
        write_current_version(&config_file, start_version)?;

        Ok(BumpVersionCommand {
            config_file,
            repo_dir: repo_dir.as_ref().to_path_buf(),
            current_version: start_version.to_string(),
        })
    }

    fn bumpversion(&self, args: &[&str], part: BumpPart) -> Command {
        let mut cmd = Command::new(BUMPVERSION);
        cmd.arg("--config-file")
            .arg(&self.config_file)
            .args(args)
            .arg(part.as_str())
            .current_dir(&self.repo_dir);
        cmd
    }

    fn reload(&mut self) -> std::result::Result<(), CommandFailure> {
        match read_current_version(&self.config_file) {
            Some(version) => {
                self.current_version = version;
                Ok(())
            }
            None => Err(CommandFailure::new(
                format!("read {}", self.config_file.display()),
                1,
            )
            .with_stderr("version file has no current_version after the bump")),
        }
    }
}

impl VersionTool for BumpVersionCommand {
    fn current_version(&self) -> &str {
        &self.current_version
    }

    fn dry_run(&self, part: BumpPart) -> Result<String> {
        let mut cmd = self.bumpversion(&["--list", "--dry-run", "--allow-dirty"], part);
        process::run(&mut cmd).map_err(VersionFlowError::ComputeNextVersion)
    }

    fn bump_and_commit(&mut self, part: BumpPart, _repo: &dyn Repository) -> Result<String> {
        let mut cmd = self.bumpversion(&["--commit"], part);
        process::run(&mut cmd).map_err(VersionFlowError::CommitVersion)?;

        self.reload().map_err(VersionFlowError::CommitVersion)?;
        debug!("bumpversion moved {} to {}", self.config_file.display(), self.current_version);

        Ok(self.current_version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup(content: &str) -> (TempDir, BumpVersionCommand) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("setup.cfg");
        fs::write(&path, content).unwrap();
        let tool = BumpVersionCommand::from_existing(&path, dir.path()).unwrap();
        (dir, tool)
    }

    #[test]
    fn test_from_existing_reads_version() {
        let (_dir, tool) = setup("[bumpversion]\ncurrent_version = 1.0.2\n");
        assert_eq!(tool.current_version(), "1.0.2");
    }

    #[test]
    fn test_from_existing_without_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("setup.cfg");
        fs::write(&path, "[metadata]\nname = thing\n").unwrap();
        assert!(BumpVersionCommand::from_existing(&path, dir.path()).is_none());
    }

    #[test]
    fn test_dry_run_command_line() {
        let (dir, tool) = setup("[bumpversion]\ncurrent_version = 1.0.2\n");
        let cmd = tool.bumpversion(&["--list", "--dry-run", "--allow-dirty"], BumpPart::Minor);

        assert_eq!(
            process::command_line(&cmd),
            format!(
                "bumpversion --config-file {} --list --dry-run --allow-dirty minor",
                dir.path().join("setup.cfg").display()
            )
        );
    }

    #[test]
    fn test_initialize_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".bumpversion.cfg");
        let tool = BumpVersionCommand::initialize(&path, dir.path(), "0.0.0").unwrap();

        assert_eq!(tool.current_version(), "0.0.0");
        assert_eq!(read_current_version(&path), Some("0.0.0".to_string()));
    }
}
