//! Branching-workflow engine
//!
//! The workflow follows git-flow conventions: a main branch carrying release
//! tags, a develop branch, and short-lived `release/` and `hotfix/` branches
//! that are started from one of them and finished back into both.
//!
//! - [native::GitFlow]: the conventions implemented directly over libgit2
//! - [command::GitFlowCommand]: the external `git flow` tool

pub mod command;
pub mod native;

pub use command::GitFlowCommand;
pub use native::GitFlow;

use crate::config::PrefixesConfig;
use crate::error::{CommandFailure, VersionFlowError};
use std::fmt;

/// Kind of short-lived workflow branch a version bump goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Release,
    Hotfix,
}

impl FlowKind {
    /// The name git-flow uses for this kind
    pub fn name(&self) -> &'static str {
        match self {
            FlowKind::Release => "release",
            FlowKind::Hotfix => "hotfix",
        }
    }

    /// Branch name prefix for this kind
    pub fn prefix<'a>(&self, prefixes: &'a PrefixesConfig) -> &'a str {
        match self {
            FlowKind::Release => &prefixes.release,
            FlowKind::Hotfix => &prefixes.hotfix,
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures reported by a workflow engine
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// A branch of the requested kind already exists
    BranchExists(String),
    /// Any other engine failure
    Failed(CommandFailure),
}

impl From<VersionFlowError> for WorkflowError {
    fn from(err: VersionFlowError) -> Self {
        match err {
            VersionFlowError::VcsCommand(failure) => WorkflowError::Failed(failure),
            other => WorkflowError::Failed(
                CommandFailure::new("workflow", -1).with_stderr(other.to_string()),
            ),
        }
    }
}

impl From<git2::Error> for WorkflowError {
    fn from(err: git2::Error) -> Self {
        VersionFlowError::from(err).into()
    }
}

impl From<WorkflowError> for VersionFlowError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::BranchExists(branch) => VersionFlowError::VcsCommand(
                CommandFailure::new("workflow", 1)
                    .with_stderr(format!("branch '{}' already exists", branch)),
            ),
            WorkflowError::Failed(failure) => VersionFlowError::VcsCommand(failure),
        }
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

/// Branching-workflow operations versionflow relies on
pub trait Workflow {
    /// Whether the workflow has been set up in this repository
    fn is_initialized(&self) -> WorkflowResult<bool>;

    /// Set up the workflow with its default branches and prefixes
    fn initialize(&mut self) -> WorkflowResult<()>;

    /// Start a branch of `kind` named `name` and switch to it.
    ///
    /// # Returns
    /// * `Err(WorkflowError::BranchExists)` - a branch of this kind is already open
    fn start(&mut self, kind: FlowKind, name: &str) -> WorkflowResult<()>;

    /// Finish the branch of `kind` named `name`, tagging the result as `tag`
    /// with `message`
    fn finish(&mut self, kind: FlowKind, name: &str, tag: &str, message: &str)
        -> WorkflowResult<()>;
}
