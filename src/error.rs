use std::fmt;

use thiserror::Error;

/// Diagnostics captured from a failed engine call.
///
/// Subprocess engines fill in the real command line, exit status and output.
/// libgit2 and I/O failures record the operation and the raw error code, with
/// the underlying message in `stderr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub command: String,
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandFailure {
    pub fn new(command: impl Into<String>, status: i32) -> Self {
        CommandFailure {
            command: command.into(),
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Attach captured standard output
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Attach captured standard error
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} returned status {}", self.command, self.status)
    }
}

/// Every failure versionflow reports to the user.
///
/// The set is closed and each message is fixed, so output can be matched
/// exactly. Variant payloads are diagnostics only and never reach `Display`.
#[derive(Error, Debug)]
pub enum VersionFlowError {
    #[error("This is not a git repository.")]
    NoRepo,

    #[error("The git repository is dirty: versionflow can only run on a clean repository.")]
    DirtyRepo,

    #[error("git flow has not been initialised for this repository.")]
    NoWorkflow,

    #[error("No version file with a current_version was found.")]
    NoVersionFile,

    #[error("The version file is not tracked by git.")]
    VersionFileNotTracked,

    #[error("No version tags were found.")]
    NoVersionTags,

    #[error("The latest version tag does not match the current version.")]
    BadVersionTags,

    #[error("The latest version tag is not on the main branch.")]
    VersionTagOnWrongBranch,

    #[error("A release is already in progress: finish it before starting another.")]
    AlreadyReleasing,

    #[error("A git command failed.")]
    VcsCommand(CommandFailure),

    #[error("Failed to get the next version number.")]
    GetVersion,

    #[error("Failed to compute the next version number.")]
    ComputeNextVersion(CommandFailure),

    #[error("Failed to bump and commit the version number.")]
    CommitVersion(CommandFailure),
}

/// Convenience type alias for Results in versionflow
pub type Result<T> = std::result::Result<T, VersionFlowError>;

impl VersionFlowError {
    /// Engine diagnostics carried by this error, if any
    pub fn failure(&self) -> Option<&CommandFailure> {
        match self {
            VersionFlowError::VcsCommand(failure)
            | VersionFlowError::ComputeNextVersion(failure)
            | VersionFlowError::CommitVersion(failure) => Some(failure),
            _ => None,
        }
    }

    pub(crate) fn vcs(failure: CommandFailure) -> Self {
        VersionFlowError::VcsCommand(failure)
    }
}

impl From<git2::Error> for VersionFlowError {
    fn from(err: git2::Error) -> Self {
        VersionFlowError::VcsCommand(
            CommandFailure::new(format!("libgit2 ({:?})", err.class()), err.raw_code())
                .with_stderr(err.message()),
        )
    }
}

impl From<std::io::Error> for VersionFlowError {
    fn from(err: std::io::Error) -> Self {
        VersionFlowError::VcsCommand(
            CommandFailure::new(
                format!("io ({:?})", err.kind()),
                err.raw_os_error().unwrap_or(-1),
            )
            .with_stderr(err.to_string()),
        )
    }
}
