use super::Engines;
use crate::bump::{BumpPart, VersionTool, BV_CURRENT_VER_OPTION, BV_NEW_VER_OPTION};
use crate::error::{CommandFailure, Result, VersionFlowError};
use crate::git::Repository;
use crate::workflow::{FlowKind, Workflow, WorkflowError, WorkflowResult};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const MAIN: &str = "master";
const DEVELOP: &str = "develop";

/// Repository, workflow and version-file state shared by the mock engines
#[derive(Debug, Default)]
pub struct MockState {
    pub repo_exists: bool,
    pub dirty: bool,
    pub workflow_initialized: bool,
    pub version: Option<String>,
    pub version_tracked: bool,
    /// Tags in creation order with the branches that contain them
    pub tags: Vec<(String, Vec<String>)>,
    /// Open release and hotfix branches
    pub open_branches: Vec<String>,
    /// Make the version tool's dry run fail
    pub fail_dry_run: bool,
    /// Make the version tool's bump fail
    pub fail_bump: bool,
    /// Every mutating engine call, in order
    pub mutations: Vec<String>,
    /// Engine handles in the order they were dropped
    pub released: Vec<&'static str>,
}

type Shared = Rc<RefCell<MockState>>;

/// In-memory engines recording every mutating call
#[derive(Clone, Default)]
pub struct MockEngines {
    state: Shared,
}

impl MockEngines {
    /// An empty directory: no repository, nothing else
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(self) -> Self {
        self.state.borrow_mut().repo_exists = true;
        self
    }

    pub fn dirty(self) -> Self {
        self.state.borrow_mut().dirty = true;
        self
    }

    pub fn with_workflow(self) -> Self {
        self.state.borrow_mut().workflow_initialized = true;
        self
    }

    /// A version file holding `version`, committed when `tracked`
    pub fn with_version(self, version: &str, tracked: bool) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.version = Some(version.to_string());
            state.version_tracked = tracked;
        }
        self
    }

    /// A tag contained in `branches`
    pub fn with_tag(self, tag: &str, branches: &[&str]) -> Self {
        self.state.borrow_mut().tags.push((
            tag.to_string(),
            branches.iter().map(|b| b.to_string()).collect(),
        ));
        self
    }

    pub fn with_open_branch(self, branch: &str) -> Self {
        self.state.borrow_mut().open_branches.push(branch.to_string());
        self
    }

    pub fn failing_dry_run(self) -> Self {
        self.state.borrow_mut().fail_dry_run = true;
        self
    }

    pub fn failing_bump(self) -> Self {
        self.state.borrow_mut().fail_bump = true;
        self
    }

    /// Repository, workflow and version file all valid at `version`
    pub fn valid(version: &str) -> Self {
        Self::new()
            .with_repository()
            .with_workflow()
            .with_version(version, true)
            .with_tag(version, &[MAIN, DEVELOP])
    }

    pub fn mutations(&self) -> Vec<String> {
        self.state.borrow().mutations.clone()
    }

    pub fn released(&self) -> Vec<&'static str> {
        self.state.borrow().released.clone()
    }

    pub fn state(&self) -> std::cell::Ref<'_, MockState> {
        self.state.borrow()
    }
}

fn record(state: &Shared, mutation: String) {
    state.borrow_mut().mutations.push(mutation);
}

impl Engines for MockEngines {
    fn open_repository(&self, _dir: &Path) -> Result<Option<Box<dyn Repository>>> {
        if !self.state.borrow().repo_exists {
            return Ok(None);
        }

        Ok(Some(Box::new(MockRepository {
            state: self.state.clone(),
        })))
    }

    fn init_repository(&self, _dir: &Path, initial_branch: &str) -> Result<Box<dyn Repository>> {
        self.state.borrow_mut().repo_exists = true;
        record(&self.state, format!("init repository on {}", initial_branch));

        Ok(Box::new(MockRepository {
            state: self.state.clone(),
        }))
    }

    fn open_workflow(&self, _dir: &Path) -> Result<Box<dyn Workflow>> {
        Ok(Box::new(MockWorkflow {
            state: self.state.clone(),
        }))
    }

    fn open_version_tool(&self, version_file: &Path) -> Result<Option<Box<dyn VersionTool>>> {
        let current = self.state.borrow().version.clone();
        Ok(current.map(|current| {
            Box::new(MockVersionTool {
                version_file: version_file.to_path_buf(),
                current,
                state: self.state.clone(),
            }) as Box<dyn VersionTool>
        }))
    }

    fn init_version_tool(
        &self,
        version_file: &Path,
        start_version: &str,
    ) -> Result<Box<dyn VersionTool>> {
        self.state.borrow_mut().version = Some(start_version.to_string());
        record(&self.state, format!("write version {}", start_version));

        Ok(Box::new(MockVersionTool {
            version_file: version_file.to_path_buf(),
            current: start_version.to_string(),
            state: self.state.clone(),
        }))
    }
}

/// In-memory repository over [MockState]
pub struct MockRepository {
    state: Shared,
}

impl Repository for MockRepository {
    fn is_dirty(&self) -> Result<bool> {
        Ok(self.state.borrow().dirty)
    }

    fn is_tracked(&self, _path: &Path) -> Result<bool> {
        Ok(self.state.borrow().version_tracked)
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()> {
        self.state.borrow_mut().version_tracked = true;
        record(
            &self.state,
            format!("commit {} file(s): {}", paths.len(), message),
        );
        Ok(())
    }

    fn last_tag(&self) -> Result<Option<String>> {
        Ok(self.state.borrow().tags.last().map(|(tag, _)| tag.clone()))
    }

    fn branches_containing_tag(&self, tag: &str) -> Result<Vec<String>> {
        let branches = self
            .state
            .borrow()
            .tags
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, branches)| branches.clone());

        branches.ok_or_else(|| {
            VersionFlowError::vcs(
                CommandFailure::new("mock branches --contains", 1)
                    .with_stderr(format!("no such tag '{}'", tag)),
            )
        })
    }

    fn create_tag(&self, name: &str, branch: &str) -> Result<()> {
        let mut branches = vec![branch.to_string()];
        if branch == MAIN {
            branches.push(DEVELOP.to_string());
        }
        self.state
            .borrow_mut()
            .tags
            .push((name.to_string(), branches));
        record(&self.state, format!("tag {} on {}", name, branch));
        Ok(())
    }

    fn describe(&self) -> Result<String> {
        let state = self.state.borrow();
        let mut description = state
            .tags
            .last()
            .map(|(tag, _)| tag.clone())
            .unwrap_or_else(|| "0000000".to_string());
        if state.dirty {
            description.push_str("-dirty");
        }
        Ok(description)
    }
}

impl Drop for MockRepository {
    fn drop(&mut self) {
        self.state.borrow_mut().released.push("repository");
    }
}

/// In-memory branching workflow over [MockState]
pub struct MockWorkflow {
    state: Shared,
}

impl Workflow for MockWorkflow {
    fn is_initialized(&self) -> WorkflowResult<bool> {
        Ok(self.state.borrow().workflow_initialized)
    }

    fn initialize(&mut self) -> WorkflowResult<()> {
        self.state.borrow_mut().workflow_initialized = true;
        record(&self.state, "init workflow".to_string());
        Ok(())
    }

    fn start(&mut self, kind: FlowKind, name: &str) -> WorkflowResult<()> {
        let prefix = format!("{}/", kind.name());
        let existing = self
            .state
            .borrow()
            .open_branches
            .iter()
            .find(|b| b.starts_with(&prefix))
            .cloned();
        if let Some(branch) = existing {
            return Err(WorkflowError::BranchExists(branch));
        }

        self.state
            .borrow_mut()
            .open_branches
            .push(format!("{}{}", prefix, name));
        record(&self.state, format!("start {} {}", kind, name));
        Ok(())
    }

    fn finish(
        &mut self,
        kind: FlowKind,
        name: &str,
        tag: &str,
        message: &str,
    ) -> WorkflowResult<()> {
        let branch = format!("{}/{}", kind.name(), name);
        {
            let mut state = self.state.borrow_mut();
            let Some(pos) = state.open_branches.iter().position(|b| *b == branch) else {
                return Err(WorkflowError::Failed(
                    CommandFailure::new(format!("mock {} finish {}", kind, name), 1)
                        .with_stderr(format!("branch '{}' does not exist", branch)),
                ));
            };
            state.open_branches.remove(pos);
            state
                .tags
                .push((tag.to_string(), vec![DEVELOP.to_string(), MAIN.to_string()]));
        }
        record(
            &self.state,
            format!("finish {} {} tag {} message {}", kind, name, tag, message),
        );
        Ok(())
    }
}

impl Drop for MockWorkflow {
    fn drop(&mut self) {
        self.state.borrow_mut().released.push("workflow");
    }
}

impl Drop for MockVersionTool {
    fn drop(&mut self) {
        self.state.borrow_mut().released.push("version tool");
    }
}

/// In-memory version tool over [MockState], bumping with semver
pub struct MockVersionTool {
    version_file: PathBuf,
    current: String,
    state: Shared,
}

impl MockVersionTool {
    fn next(&self, part: BumpPart) -> Option<String> {
        semver::Version::parse(&self.current)
            .ok()
            .map(|v| part.apply(&v).to_string())
    }
}

impl VersionTool for MockVersionTool {
    fn current_version(&self) -> &str {
        &self.current
    }

    fn dry_run(&self, part: BumpPart) -> Result<String> {
        if self.state.borrow().fail_dry_run {
            return Err(VersionFlowError::ComputeNextVersion(CommandFailure::new(
                format!("mock bump --dry-run {}", part),
                2,
            )));
        }

        let mut listing = format!("{}={}\n", BV_CURRENT_VER_OPTION, self.current);
        if let Some(next) = self.next(part) {
            listing.push_str(&format!("{}={}\n", BV_NEW_VER_OPTION, next));
        }
        Ok(listing)
    }

    fn bump_and_commit(&mut self, part: BumpPart, repo: &dyn Repository) -> Result<String> {
        let failure = CommandFailure::new(format!("mock bump --commit {}", part), 1);
        if self.state.borrow().fail_bump {
            return Err(VersionFlowError::CommitVersion(failure));
        }
        let next = self
            .next(part)
            .ok_or(VersionFlowError::CommitVersion(failure))?;

        self.state.borrow_mut().version = Some(next.clone());
        record(&self.state, format!("bump {} to {}", part, next));
        repo.commit_paths(
            &[self.version_file.as_path()],
            &format!("Bump version: {} → {}", self.current, next),
        )?;

        self.current = next.clone();
        Ok(next)
    }
}
