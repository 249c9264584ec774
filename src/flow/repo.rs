use crate::bump::{BumpPart, VersionTool};
use crate::config::Config;
use crate::engines::{DefaultEngines, Engines};
use crate::error::{Result, VersionFlowError};
use crate::flow::Versions;
use crate::git::Repository;
use crate::ui;
use crate::workflow::{FlowKind, Workflow, WorkflowError};
use log::debug;

/// A repository that passed every check, with its engines held open.
///
/// Fields drop in declaration order, the reverse of the order the checks
/// open them: version tool, then workflow, then repository.
pub struct VersionFlowRepo {
    version_tool: Box<dyn VersionTool>,
    workflow: Box<dyn Workflow>,
    repo: Box<dyn Repository>,
}

impl VersionFlowRepo {
    pub(crate) fn new(
        version_tool: Box<dyn VersionTool>,
        workflow: Box<dyn Workflow>,
        repo: Box<dyn Repository>,
    ) -> Self {
        VersionFlowRepo {
            version_tool,
            workflow,
            repo,
        }
    }

    /// Run the checks with the engines chosen by the config's settings
    pub fn create_checked(config: &Config, create: bool) -> Result<Self> {
        let engines = DefaultEngines::new(&config.settings);
        Self::create_checked_with(config, &engines, create)
    }

    pub fn create_checked_with(config: &Config, engines: &dyn Engines, create: bool) -> Result<Self> {
        config.run_pipeline(engines, create)
    }

    pub fn version_tool(&self) -> &dyn VersionTool {
        self.version_tool.as_ref()
    }

    pub fn current_version(&self) -> &str {
        self.version_tool.current_version()
    }

    /// Release `versions.new`: start a branch of `kind`, bump and commit the
    /// version file by `part`, then finish the branch with a tag.
    ///
    /// Nothing is undone on failure. A branch that was started stays in place.
    ///
    /// # Returns
    /// * `Ok(String)` - the released version
    /// * `Err(VersionFlowError::AlreadyReleasing)` - a branch of `kind` is already open
    /// * `Err(VersionFlowError::CommitVersion)` - the bump failed
    /// * `Err(VersionFlowError::VcsCommand)` - any other workflow failure
    pub fn process_action(
        &mut self,
        versions: &Versions,
        part: BumpPart,
        kind: FlowKind,
    ) -> Result<String> {
        ui::display_status(&format!("Starting {} {}", kind, versions.new));
        self.workflow
            .start(kind, &versions.new)
            .map_err(|e| match e {
                WorkflowError::BranchExists(branch) => {
                    debug!("{} branch {} is still open", kind, branch);
                    VersionFlowError::AlreadyReleasing
                }
                WorkflowError::Failed(failure) => VersionFlowError::VcsCommand(failure),
            })?;

        ui::display_status(&format!(
            "Bumping version from {} to {}",
            versions.current, versions.new
        ));
        let bumped = self
            .version_tool
            .bump_and_commit(part, self.repo.as_ref())?;
        if bumped != versions.new {
            debug!("version tool bumped to {}, expected {}", bumped, versions.new);
        }

        ui::display_status(&format!("Finishing {} {}", kind, versions.new));
        self.workflow
            .finish(kind, &versions.new, &versions.new, &versions.new)?;

        ui::display_success(&format!("Released version {}", versions.new));
        Ok(versions.new.clone())
    }
}
