//! Verification and repair of a repository's release state.
//!
//! Five checks run strictly in order and stop at the first failure:
//! repository, clean tree, workflow, version file, version tag. With
//! `create` set, a missing repository, workflow, version file or first tag
//! is created instead of reported. A version file created by this run ends
//! the checks early: it only gets a first tag when the repository has none.
//! A dirty tree, a tag off the main branch and a tag that disagrees with the
//! version file are never repaired.

use crate::bump::VersionTool;
use crate::config::Config;
use crate::engines::Engines;
use crate::error::{Result, VersionFlowError};
use crate::flow::VersionFlowRepo;
use crate::git::Repository;
use crate::ui;
use crate::workflow::Workflow;
use log::debug;

impl Config {
    /// Run every check and return the validated handle.
    ///
    /// # Arguments
    /// * `engines` - opens or creates each engine resource
    /// * `create` - repair missing prerequisites instead of failing
    ///
    /// # Returns
    /// * `Ok(VersionFlowRepo)` - every prerequisite holds
    /// * `Err(VersionFlowError)` - the first prerequisite that does not
    pub fn run_pipeline(&self, engines: &dyn Engines, create: bool) -> Result<VersionFlowRepo> {
        debug!(
            "pipeline on {} (create={})",
            self.repo_dir.display(),
            create
        );

        let repo = self.check_repo(engines, create)?;
        self.check_clean(repo.as_ref())?;
        let workflow = self.check_workflow(engines, create)?;
        let (version_tool, created) = self.check_version_file(engines, repo.as_ref(), create)?;
        if created {
            self.tag_new_version_file(repo.as_ref(), version_tool.as_ref())?;
        } else {
            self.check_version_tag(repo.as_ref(), version_tool.as_ref(), create)?;
        }

        Ok(VersionFlowRepo::new(
            version_tool,
            workflow,
            repo,
        ))
    }

    fn check_repo(&self, engines: &dyn Engines, create: bool) -> Result<Box<dyn Repository>> {
        ui::display_status("Checking if this is a git repo...");
        match engines.open_repository(&self.repo_dir)? {
            Some(repo) => {
                ui::display_success("Confirmed that this is a git repo");
                Ok(repo)
            }
            None if create => {
                let repo = engines.init_repository(&self.repo_dir, self.main_branch())?;
                ui::display_success("Initialised this directory as a git repo");
                Ok(repo)
            }
            None => Err(VersionFlowError::NoRepo),
        }
    }

    fn check_clean(&self, repo: &dyn Repository) -> Result<()> {
        if repo.is_dirty()? {
            return Err(VersionFlowError::DirtyRepo);
        }

        ui::display_success("git repo is clean");
        Ok(())
    }

    fn check_workflow(&self, engines: &dyn Engines, create: bool) -> Result<Box<dyn Workflow>> {
        ui::display_status("Checking if this is a git flow repo...");
        let mut workflow = engines.open_workflow(&self.repo_dir)?;

        if workflow.is_initialized()? {
            ui::display_success("Confirmed that this is a git flow repo");
        } else if create {
            workflow.initialize()?;
            ui::display_success("Initialised this directory as a git flow repo");
        } else {
            return Err(VersionFlowError::NoWorkflow);
        }

        Ok(workflow)
    }

    /// Open the version file, creating or committing it under `create`.
    ///
    /// The flag is set when the file was created by this call.
    fn check_version_file(
        &self,
        engines: &dyn Engines,
        repo: &dyn Repository,
        create: bool,
    ) -> Result<(Box<dyn VersionTool>, bool)> {
        ui::display_status("Checking if the version file is initialised...");

        let Some(tool) = engines.open_version_tool(&self.version_file)? else {
            if !create {
                return Err(VersionFlowError::NoVersionFile);
            }

            let tool = engines.init_version_tool(&self.version_file, &self.settings.start_version)?;
            repo.commit_paths(
                &[self.version_file.as_path()],
                &format!("Initialise version file at {}", tool.current_version()),
            )?;
            ui::display_success(&format!(
                "Version file created with current version set to {}",
                tool.current_version()
            ));
            return Ok((tool, true));
        };

        ui::display_success(&format!(
            "Version file configured; version is at {}",
            tool.current_version()
        ));

        if !repo.is_tracked(&self.version_file)? {
            if !create {
                return Err(VersionFlowError::VersionFileNotTracked);
            }

            repo.commit_paths(&[self.version_file.as_path()], "Track version file")?;
            ui::display_success("Committed the version file");
        }

        Ok((tool, false))
    }

    /// Give a just-created version file its first tag, leaving any existing
    /// tags alone
    fn tag_new_version_file(&self, repo: &dyn Repository, tool: &dyn VersionTool) -> Result<()> {
        if let Some(tag) = repo.last_tag()? {
            debug!("new version file; keeping existing tag {}", tag);
            return Ok(());
        }

        self.create_first_tag(repo, tool.current_version())
    }

    fn create_first_tag(&self, repo: &dyn Repository, version: &str) -> Result<()> {
        repo.create_tag(version, self.main_branch())?;
        ui::display_success(&format!(
            "Tagged {} as version {}",
            self.main_branch(),
            version
        ));
        Ok(())
    }

    fn check_version_tag(
        &self,
        repo: &dyn Repository,
        tool: &dyn VersionTool,
        create: bool,
    ) -> Result<()> {
        ui::display_status("Checking the version tag...");
        let current = tool.current_version();

        let Some(tag) = repo.last_tag()? else {
            if !create {
                return Err(VersionFlowError::NoVersionTags);
            }

            return self.create_first_tag(repo, current);
        };

        let branches = repo.branches_containing_tag(&tag)?;
        debug!("tag {} is on {:?}", tag, branches);
        if !branches.iter().any(|b| b == self.main_branch()) {
            return Err(VersionFlowError::VersionTagOnWrongBranch);
        }
        if tag != current {
            return Err(VersionFlowError::BadVersionTags);
        }

        ui::display_success(&format!("Version tag {} matches the version file", tag));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::MockEngines;

    fn config() -> Config {
        Config::with_defaults("/mock")
    }

    fn run(engines: &MockEngines, create: bool) -> Result<VersionFlowRepo> {
        config().run_pipeline(engines, create)
    }

    #[test]
    fn test_check_valid_repository() {
        let engines = MockEngines::valid("1.0.2");
        let repo = run(&engines, false).unwrap();

        assert_eq!(repo.current_version(), "1.0.2");
        assert!(engines.mutations().is_empty());
    }

    #[test]
    fn test_check_empty_directory() {
        let engines = MockEngines::new();
        assert!(matches!(run(&engines, false), Err(VersionFlowError::NoRepo)));
        assert!(engines.mutations().is_empty());
    }

    #[test]
    fn test_dirty_dominates_in_both_modes() {
        for create in [false, true] {
            let engines = MockEngines::new().with_repository().dirty();
            assert!(matches!(
                run(&engines, create),
                Err(VersionFlowError::DirtyRepo)
            ));
            assert!(engines.mutations().is_empty());
        }
    }

    #[test]
    fn test_check_without_workflow() {
        let engines = MockEngines::new().with_repository();
        assert!(matches!(
            run(&engines, false),
            Err(VersionFlowError::NoWorkflow)
        ));
    }

    #[test]
    fn test_check_without_version_file() {
        let engines = MockEngines::new().with_repository().with_workflow();
        assert!(matches!(
            run(&engines, false),
            Err(VersionFlowError::NoVersionFile)
        ));
    }

    #[test]
    fn test_check_untracked_version_file() {
        let engines = MockEngines::new()
            .with_repository()
            .with_workflow()
            .with_version("1.0.2", false);
        assert!(matches!(
            run(&engines, false),
            Err(VersionFlowError::VersionFileNotTracked)
        ));
        assert!(engines.mutations().is_empty());
    }

    #[test]
    fn test_check_without_tags() {
        let engines = MockEngines::new()
            .with_repository()
            .with_workflow()
            .with_version("1.0.2", true);
        assert!(matches!(
            run(&engines, false),
            Err(VersionFlowError::NoVersionTags)
        ));
    }

    #[test]
    fn test_bad_tag_in_both_modes() {
        for create in [false, true] {
            let engines = MockEngines::new()
                .with_repository()
                .with_workflow()
                .with_version("1.0.2", true)
                .with_tag("0.0.2", &["master", "develop"]);
            assert!(matches!(
                run(&engines, create),
                Err(VersionFlowError::BadVersionTags)
            ));
            assert!(engines.mutations().is_empty());
        }
    }

    #[test]
    fn test_wrong_branch_tag_in_both_modes() {
        for create in [false, true] {
            let engines = MockEngines::new()
                .with_repository()
                .with_workflow()
                .with_version("1.0.2", true)
                .with_tag("1.0.2", &["develop"]);
            assert!(matches!(
                run(&engines, create),
                Err(VersionFlowError::VersionTagOnWrongBranch)
            ));
        }
    }

    #[test]
    fn test_wrong_branch_checked_before_value() {
        let engines = MockEngines::new()
            .with_repository()
            .with_workflow()
            .with_version("1.0.2", true)
            .with_tag("0.0.2", &["develop"]);
        assert!(matches!(
            run(&engines, false),
            Err(VersionFlowError::VersionTagOnWrongBranch)
        ));
    }

    #[test]
    fn test_init_empty_directory() {
        let engines = MockEngines::new();
        let repo = run(&engines, true).unwrap();
        drop(repo);

        assert_eq!(
            engines.mutations(),
            vec![
                "init repository on master".to_string(),
                "init workflow".to_string(),
                "write version 0.0.0".to_string(),
                "commit 1 file(s): Initialise version file at 0.0.0".to_string(),
                "tag 0.0.0 on master".to_string(),
            ]
        );

        assert!(run(&engines, false).is_ok());
    }

    #[test]
    fn test_init_is_idempotent() {
        let engines = MockEngines::new();
        run(&engines, true).unwrap();
        let after_first = engines.mutations();

        run(&engines, true).unwrap();
        assert_eq!(engines.mutations(), after_first);
    }

    #[test]
    fn test_init_commits_untracked_version_file() {
        let engines = MockEngines::new()
            .with_repository()
            .with_workflow()
            .with_version("1.0.2", false)
            .with_tag("1.0.2", &["master"]);
        run(&engines, true).unwrap();

        assert_eq!(
            engines.mutations(),
            vec!["commit 1 file(s): Track version file".to_string()]
        );
    }

    #[test]
    fn test_init_new_version_file_keeps_existing_tags() {
        let engines = MockEngines::new()
            .with_repository()
            .with_workflow()
            .with_tag("1.0.2", &["master"]);
        let repo = run(&engines, true).unwrap();

        assert_eq!(repo.current_version(), "0.0.0");
        assert_eq!(
            engines.mutations(),
            vec![
                "write version 0.0.0".to_string(),
                "commit 1 file(s): Initialise version file at 0.0.0".to_string(),
            ]
        );
    }

    #[test]
    fn test_init_valid_repository_changes_nothing() {
        let engines = MockEngines::valid("1.0.2");
        run(&engines, true).unwrap();
        assert!(engines.mutations().is_empty());
    }

    #[test]
    fn test_configured_main_branch() {
        let mut config = config();
        config.settings.main_branch = "main".to_string();
        let engines = MockEngines::new()
            .with_repository()
            .with_workflow()
            .with_version("1.0.2", true)
            .with_tag("1.0.2", &["master"]);

        assert!(matches!(
            config.run_pipeline(&engines, false),
            Err(VersionFlowError::VersionTagOnWrongBranch)
        ));
    }

    #[test]
    fn test_handles_released_in_reverse_order() {
        let engines = MockEngines::valid("1.0.2");
        drop(run(&engines, false).unwrap());
        assert_eq!(
            engines.released(),
            vec!["version tool", "workflow", "repository"]
        );
    }

    #[test]
    fn test_handles_released_on_failure() {
        let engines = MockEngines::new()
            .with_repository()
            .with_workflow()
            .with_version("1.0.2", true);
        assert!(run(&engines, false).is_err());
        assert_eq!(
            engines.released(),
            vec!["version tool", "workflow", "repository"]
        );
    }
}
