use super::{FlowKind, Workflow, WorkflowError, WorkflowResult};
use crate::error::CommandFailure;
use crate::process;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment that stops git from opening an editor for merge messages
const MERGE_AUTOEDIT: (&str, &str) = ("GIT_MERGE_AUTOEDIT", "no");

/// Drives the external `git flow` tool inside the repository directory.
pub struct GitFlowCommand {
    repo_dir: PathBuf,
}

impl GitFlowCommand {
    pub fn new<P: AsRef<Path>>(repo_dir: P) -> Self {
        GitFlowCommand {
            repo_dir: repo_dir.as_ref().to_path_buf(),
        }
    }

    fn git_flow(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("flow").args(args).current_dir(&self.repo_dir);
        cmd
    }
}

/// Whether `git flow ... start` refused because a branch is already open.
///
/// Returns the offending branch name, empty when the tool did not print one.
fn existing_branch(failure: &CommandFailure) -> Option<String> {
    let output = format!("{}\n{}", failure.stdout, failure.stderr);
    if !output.contains("already exists") && !output.contains("There is an existing") {
        return None;
    }

    let branch = Regex::new(r#"(?:existing \w+ branch|Branch) [('"]?([^'")\s]+)"#)
        .ok()
        .and_then(|re| re.captures(&output).map(|caps| caps[1].to_string()));

    Some(branch.unwrap_or_default())
}

impl Workflow for GitFlowCommand {
    fn is_initialized(&self) -> WorkflowResult<bool> {
        Ok(process::run(&mut self.git_flow(&["config"])).is_ok())
    }

    fn initialize(&mut self) -> WorkflowResult<()> {
        process::run(&mut self.git_flow(&["init", "-d"])).map_err(WorkflowError::Failed)?;
        Ok(())
    }

    fn start(&mut self, kind: FlowKind, name: &str) -> WorkflowResult<()> {
        match process::run(&mut self.git_flow(&[kind.name(), "start", name])) {
            Ok(_) => Ok(()),
            Err(failure) => match existing_branch(&failure) {
                Some(branch) => Err(WorkflowError::BranchExists(branch)),
                None => Err(WorkflowError::Failed(failure)),
            },
        }
    }

    fn finish(
        &mut self,
        kind: FlowKind,
        name: &str,
        tag: &str,
        message: &str,
    ) -> WorkflowResult<()> {
        let mut cmd = self.git_flow(&[kind.name(), "finish", "-m", message, "-T", tag, name]);
        cmd.env(MERGE_AUTOEDIT.0, MERGE_AUTOEDIT.1);

        process::run(&mut cmd).map_err(WorkflowError::Failed)?;
        Ok(())
    }
}
