//! Engine factory
//!
//! The pipeline never names a concrete engine. It asks an [Engines]
//! implementation to open or create each resource and works with the
//! returned trait objects.
//!
//! - [DefaultEngines]: picks libgit2 plus the native or command-line
//!   workflow and version tool according to [Settings]
//! - [mock::MockEngines]: in-memory engines for tests

pub mod mock;

use crate::bump::{BumpVersion, BumpVersionCommand, VersionTool};
use crate::config::{Settings, VersionToolKind, WorkflowEngineKind};
use crate::error::Result;
use crate::git::{Git2Repository, Repository};
use crate::workflow::{GitFlow, GitFlowCommand, Workflow};
use log::debug;
use std::path::Path;

/// Opens and creates the engine handles a pipeline run needs
pub trait Engines {
    /// Open the repository at `dir`; `Ok(None)` when there is none
    fn open_repository(&self, dir: &Path) -> Result<Option<Box<dyn Repository>>>;

    /// Create a repository at `dir` whose first branch is `initial_branch`
    fn init_repository(&self, dir: &Path, initial_branch: &str) -> Result<Box<dyn Repository>>;

    /// Open the branching workflow for the repository at `dir`
    fn open_workflow(&self, dir: &Path) -> Result<Box<dyn Workflow>>;

    /// Read the version file; `Ok(None)` when it is missing or has no version
    fn open_version_tool(&self, version_file: &Path) -> Result<Option<Box<dyn VersionTool>>>;

    /// Write `start_version` to the version file and open it
    fn init_version_tool(
        &self,
        version_file: &Path,
        start_version: &str,
    ) -> Result<Box<dyn VersionTool>>;
}

/// Real engines selected from settings
pub struct DefaultEngines {
    settings: Settings,
}

impl DefaultEngines {
    pub fn new(settings: &Settings) -> Self {
        DefaultEngines {
            settings: settings.clone(),
        }
    }

    fn tool_dir(version_file: &Path) -> &Path {
        version_file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl Engines for DefaultEngines {
    fn open_repository(&self, dir: &Path) -> Result<Option<Box<dyn Repository>>> {
        Ok(Git2Repository::open(dir)?.map(|repo| Box::new(repo) as Box<dyn Repository>))
    }

    fn init_repository(&self, dir: &Path, initial_branch: &str) -> Result<Box<dyn Repository>> {
        Ok(Box::new(Git2Repository::init(dir, initial_branch)?))
    }

    fn open_workflow(&self, dir: &Path) -> Result<Box<dyn Workflow>> {
        debug!("workflow engine: {:?}", self.settings.engines.workflow);
        match self.settings.engines.workflow {
            WorkflowEngineKind::Native => Ok(Box::new(GitFlow::open(dir, &self.settings)?)),
            WorkflowEngineKind::GitFlow => Ok(Box::new(GitFlowCommand::new(dir))),
        }
    }

    fn open_version_tool(&self, version_file: &Path) -> Result<Option<Box<dyn VersionTool>>> {
        debug!("version tool: {:?}", self.settings.engines.version_tool);
        let tool: Option<Box<dyn VersionTool>> = match self.settings.engines.version_tool {
            VersionToolKind::Native => {
                BumpVersion::from_existing(version_file).map(|t| Box::new(t) as Box<dyn VersionTool>)
            }
            VersionToolKind::Bumpversion => {
                BumpVersionCommand::from_existing(version_file, Self::tool_dir(version_file))
                    .map(|t| Box::new(t) as Box<dyn VersionTool>)
            }
        };

        Ok(tool)
    }

    fn init_version_tool(
        &self,
        version_file: &Path,
        start_version: &str,
    ) -> Result<Box<dyn VersionTool>> {
        match self.settings.engines.version_tool {
            VersionToolKind::Native => {
                Ok(Box::new(BumpVersion::initialize(version_file, start_version)?))
            }
            VersionToolKind::Bumpversion => Ok(Box::new(BumpVersionCommand::initialize(
                version_file,
                Self::tool_dir(version_file),
                start_version,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_repository_missing() {
        let dir = TempDir::new().unwrap();
        let engines = DefaultEngines::new(&Settings::default());
        assert!(engines.open_repository(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_init_then_open_repository() {
        let dir = TempDir::new().unwrap();
        let engines = DefaultEngines::new(&Settings::default());
        engines.init_repository(dir.path(), "master").unwrap();

        let repo = engines.open_repository(dir.path()).unwrap().unwrap();
        assert!(!repo.is_dirty().unwrap());
    }

    #[test]
    fn test_version_tool_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".bumpversion.cfg");
        let engines = DefaultEngines::new(&Settings::default());

        assert!(engines.open_version_tool(&path).unwrap().is_none());
        engines.init_version_tool(&path, "0.0.0").unwrap();

        let tool = engines.open_version_tool(&path).unwrap().unwrap();
        assert_eq!(tool.current_version(), "0.0.0");
    }

    #[test]
    fn test_command_workflow_selected() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.engines.workflow = WorkflowEngineKind::GitFlow;

        // the command engine does not touch the repository until used
        let engines = DefaultEngines::new(&settings);
        assert!(engines.open_workflow(dir.path()).is_ok());
    }
}
