use super::{FlowKind, Workflow, WorkflowError, WorkflowResult};
use crate::config::{PrefixesConfig, Settings};
use crate::error::{CommandFailure, Result};
use crate::git::repository::{head_commit, signature};
use git2::build::CheckoutBuilder;
use git2::{BranchType, Commit, ConfigLevel, ErrorCode, Oid, Repository as Git2Repo};
use log::debug;
use std::path::Path;

/// git-flow conventions implemented over libgit2.
///
/// Holds its own handle on the repository, separate from the one used for
/// version-control checks, and stores its setup under the same `gitflow.*`
/// config keys the `git flow` tool uses so the two stay interchangeable.
pub struct GitFlow {
    repo: Git2Repo,
    main: String,
    develop: String,
    prefixes: PrefixesConfig,
}

impl GitFlow {
    /// Open the workflow for the repository at `path`
    pub fn open<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<Self> {
        let repo = Git2Repo::open(path.as_ref())?;

        Ok(GitFlow {
            repo,
            main: settings.main_branch.clone(),
            develop: settings.develop_branch.clone(),
            prefixes: settings.prefixes.clone(),
        })
    }

    fn branch_exists(&self, name: &str) -> WorkflowResult<bool> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn branch_commit(&self, name: &str) -> WorkflowResult<Commit<'_>> {
        Ok(self
            .repo
            .find_branch(name, BranchType::Local)?
            .get()
            .peel_to_commit()?)
    }

    fn branches_with_prefix(&self, prefix: &str) -> WorkflowResult<Vec<String>> {
        let mut names = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                if name.starts_with(prefix) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Check out `branch` and point HEAD at it
    fn switch_to(&self, branch: &str, force: bool) -> WorkflowResult<()> {
        let commit = self.branch_commit(branch)?;

        let mut builder = CheckoutBuilder::new();
        if force {
            builder.force();
        } else {
            builder.safe();
        }

        self.repo
            .checkout_tree(commit.as_object(), Some(&mut builder))?;
        self.repo.set_head(&format!("refs/heads/{}", branch))?;
        debug!("switched to {}", branch);

        Ok(())
    }

    /// Merge `theirs` into `target` with a merge commit and return the new head.
    ///
    /// Nothing is committed when `target` already contains `theirs`.
    fn merge_into(&self, target: &str, theirs: Oid, message: &str) -> WorkflowResult<Oid> {
        let ours = self.branch_commit(target)?;
        if ours.id() == theirs || self.repo.graph_descendant_of(ours.id(), theirs)? {
            return Ok(ours.id());
        }

        let theirs = self.repo.find_commit(theirs)?;
        let mut index = self.repo.merge_commits(&ours, &theirs, None)?;
        if index.has_conflicts() {
            return Err(WorkflowError::Failed(
                CommandFailure::new(format!("merge {} into {}", theirs.id(), target), 1)
                    .with_stderr("automatic merge failed; fix conflicts and finish manually"),
            ));
        }

        let tree = self.repo.find_tree(index.write_tree_to(&self.repo)?)?;
        let sig = signature(&self.repo)?;
        let oid = self.repo.commit(
            Some(&format!("refs/heads/{}", target)),
            &sig,
            &sig,
            message,
            &tree,
            &[&ours, &theirs],
        )?;
        debug!("merged {} into {} as {}", theirs.id(), target, oid);

        Ok(oid)
    }

    /// Create the main branch, from HEAD or as an empty root commit
    fn create_main(&self) -> WorkflowResult<()> {
        match head_commit(&self.repo)? {
            Some(commit) => {
                self.repo.branch(&self.main, &commit, false)?;
            }
            None => {
                let tree = self.repo.find_tree(self.repo.treebuilder(None)?.write()?)?;
                let sig = signature(&self.repo)?;
                self.repo.commit(
                    Some(&format!("refs/heads/{}", self.main)),
                    &sig,
                    &sig,
                    "Initial commit",
                    &tree,
                    &[],
                )?;
            }
        }

        Ok(())
    }
}

impl Workflow for GitFlow {
    fn is_initialized(&self) -> WorkflowResult<bool> {
        let config = self.repo.config()?;
        let (Ok(main), Ok(develop)) = (
            config.get_string("gitflow.branch.master"),
            config.get_string("gitflow.branch.develop"),
        ) else {
            return Ok(false);
        };

        Ok(main != develop && self.branch_exists(&main)? && self.branch_exists(&develop)?)
    }

    fn initialize(&mut self) -> WorkflowResult<()> {
        if !self.branch_exists(&self.main)? {
            self.create_main()?;
        }
        if !self.branch_exists(&self.develop)? {
            let main = self.branch_commit(&self.main)?;
            self.repo.branch(&self.develop, &main, false)?;
        }

        let mut local = self.repo.config()?.open_level(ConfigLevel::Local)?;
        local.set_str("gitflow.branch.master", &self.main)?;
        local.set_str("gitflow.branch.develop", &self.develop)?;
        local.set_str("gitflow.prefix.feature", &self.prefixes.feature)?;
        local.set_str("gitflow.prefix.release", &self.prefixes.release)?;
        local.set_str("gitflow.prefix.hotfix", &self.prefixes.hotfix)?;
        local.set_str("gitflow.prefix.support", &self.prefixes.support)?;
        // tags are named by the bare version
        local.set_str("gitflow.prefix.versiontag", "")?;

        self.switch_to(&self.develop, false)?;
        debug!("initialised git flow ({} / {})", self.main, self.develop);

        Ok(())
    }

    fn start(&mut self, kind: FlowKind, name: &str) -> WorkflowResult<()> {
        let prefix = kind.prefix(&self.prefixes);
        if let Some(existing) = self.branches_with_prefix(prefix)?.into_iter().next() {
            return Err(WorkflowError::BranchExists(existing));
        }

        let base = match kind {
            FlowKind::Release => &self.develop,
            FlowKind::Hotfix => &self.main,
        };
        let branch = format!("{}{}", prefix, name);
        let base_commit = self.branch_commit(base)?;

        match self.repo.branch(&branch, &base_commit, false) {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::Exists => {
                return Err(WorkflowError::BranchExists(branch))
            }
            Err(e) => return Err(e.into()),
        }

        self.switch_to(&branch, false)
    }

    fn finish(
        &mut self,
        kind: FlowKind,
        name: &str,
        tag: &str,
        message: &str,
    ) -> WorkflowResult<()> {
        let branch = format!("{}{}", kind.prefix(&self.prefixes), name);
        let head = self.branch_commit(&branch)?.id();

        let merged = self.merge_into(&self.main, head, &format!("Merge branch '{}'", branch))?;

        let sig = signature(&self.repo)?;
        let target = self.repo.find_object(merged, None)?;
        self.repo.tag(tag, &target, &sig, message, false)?;

        self.merge_into(
            &self.develop,
            merged,
            &format!("Merge tag '{}' into {}", tag, self.develop),
        )?;

        self.switch_to(&self.develop, true)?;
        self.repo.find_branch(&branch, BranchType::Local)?.delete()?;
        debug!("finished {} {} as tag {}", kind, name, tag);

        Ok(())
    }
}
