//! Repository fixtures built from named setup steps.
//!
//! A [Fixture] owns a temporary directory and applies [Step]s to it in
//! order. A step may hand back a teardown; teardowns run in reverse order
//! when the fixture is dropped, before the directory is removed.

#![allow(dead_code)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use git2::{BranchType, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

use versionflow::config::{Config, Settings};
use versionflow::workflow::{GitFlow, Workflow};

pub const GOOD_VERSION: &str = "1.0.2";
pub const BAD_VERSION: &str = "0.0.2";
pub const VERSION_FILE: &str = "setup.cfg";

pub type Teardown = Box<dyn FnOnce()>;

/// One named precondition
pub struct Step {
    pub name: &'static str,
    pub setup: fn(&Path) -> Option<Teardown>,
}

pub struct Fixture {
    dir: TempDir,
    applied: Vec<&'static str>,
    teardowns: Vec<(&'static str, Teardown)>,
}

impl Fixture {
    /// An empty temporary directory
    pub fn new() -> Self {
        Fixture {
            dir: TempDir::new().unwrap(),
            applied: Vec::new(),
            teardowns: Vec::new(),
        }
    }

    pub fn with(steps: &[&Step]) -> Self {
        let mut fixture = Fixture::new();
        for step in steps {
            fixture.apply(step);
        }
        fixture
    }

    pub fn apply(&mut self, step: &Step) -> &mut Self {
        if let Some(teardown) = (step.setup)(self.dir.path()) {
            self.teardowns.push((step.name, teardown));
        }
        self.applied.push(step.name);
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    pub fn version_file(&self) -> PathBuf {
        self.path().join(VERSION_FILE)
    }

    /// Config for this directory using `setup.cfg` as the version file
    pub fn config(&self) -> Config {
        Config::new(
            self.path(),
            Some(Path::new(VERSION_FILE)),
            Settings::default(),
        )
    }

    pub fn repo(&self) -> Repository {
        Repository::open(self.path()).unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        while let Some((_name, teardown)) = self.teardowns.pop() {
            teardown();
        }
    }
}

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@example.com").unwrap()
}

fn commit_files(path: &Path, files: &[&str], message: &str) {
    let repo = Repository::open(path).unwrap();
    let mut index = repo.index().unwrap();
    for file in files {
        index.add_path(Path::new(file)).unwrap();
    }
    index.write().unwrap();

    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    let sig = signature();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

fn tag_head(path: &Path, tag: &str) {
    let repo = Repository::open(path).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.tag_lightweight(tag, head.as_object(), false).unwrap();
}

fn branch_from(path: &Path, branch: &str, base: &str) {
    let repo = Repository::open(path).unwrap();
    let base = repo
        .find_branch(base, BranchType::Local)
        .unwrap()
        .get()
        .peel_to_commit()
        .unwrap();
    repo.branch(branch, &base, false).unwrap();
}

fn checkout(path: &Path, branch: &str) {
    let repo = Repository::open(path).unwrap();
    let refname = format!("refs/heads/{}", branch);
    let target = repo.revparse_single(&refname).unwrap();
    repo.checkout_tree(&target, None).unwrap();
    repo.set_head(&refname).unwrap();
}

fn write_version(path: &Path, version: &str) {
    fs::write(
        path.join(VERSION_FILE),
        format!("[bumpversion]\ncurrent_version={}\n", version),
    )
    .unwrap();
}

pub const MAKE_GIT: Step = Step {
    name: "make_git",
    setup: |path| {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = Repository::init_opts(path, &opts).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        None
    },
};

pub const INITIAL_COMMIT: Step = Step {
    name: "initial_commit",
    setup: |path| {
        fs::write(path.join("initial_file"), "initial\n").unwrap();
        commit_files(path, &["initial_file"], "Initial commit");
        None
    },
};

pub const INIT_WORKFLOW: Step = Step {
    name: "init_workflow",
    setup: |path| {
        let mut flow = GitFlow::open(path, &Settings::default()).unwrap();
        flow.initialize().unwrap();
        None
    },
};

/// Stage a new file without committing it
pub const MAKE_DIRTY: Step = Step {
    name: "make_dirty",
    setup: |path| {
        fs::write(path.join("dirty"), "dirty\n").unwrap();
        let repo = Repository::open(path).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("dirty")).unwrap();
        index.write().unwrap();
        None
    },
};

pub const WRITE_VERSION: Step = Step {
    name: "write_version",
    setup: |path| {
        write_version(path, GOOD_VERSION);
        None
    },
};

pub const STAGE_VERSION: Step = Step {
    name: "stage_version",
    setup: |path| {
        let repo = Repository::open(path).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(VERSION_FILE)).unwrap();
        index.write().unwrap();
        None
    },
};

pub const COMMIT_VERSION: Step = Step {
    name: "commit_version",
    setup: |path| {
        commit_files(path, &[VERSION_FILE], "Add bumpversion info");
        None
    },
};

pub const SET_GOOD_TAG: Step = Step {
    name: "set_good_tag",
    setup: |path| {
        tag_head(path, GOOD_VERSION);
        None
    },
};

pub const SET_BAD_TAG: Step = Step {
    name: "set_bad_tag",
    setup: |path| {
        tag_head(path, BAD_VERSION);
        None
    },
};

/// Leave a release branch open alongside develop
pub const OPEN_RELEASE: Step = Step {
    name: "open_release",
    setup: |path| {
        branch_from(path, "release/test", "develop");
        None
    },
};

pub const CHECKOUT_RELEASE: Step = Step {
    name: "checkout_release",
    setup: |path| {
        checkout(path, "release/test");
        None
    },
};

pub const MAKE_FEATURE: Step = Step {
    name: "make_feature",
    setup: |path| {
        branch_from(path, "feature/test", "develop");
        None
    },
};

pub const CHECKOUT_FEATURE: Step = Step {
    name: "checkout_feature",
    setup: |path| {
        checkout(path, "feature/test");
        None
    },
};

pub const CHECKOUT_MASTER: Step = Step {
    name: "checkout_master",
    setup: |path| {
        checkout(path, "master");
        None
    },
};

/// Run with the process inside the fixture directory, restoring the
/// previous working directory on teardown
pub const ENTER_DIR: Step = Step {
    name: "enter_dir",
    setup: |path| {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(path).unwrap();
        let restore: Teardown = Box::new(move || {
            env::set_current_dir(previous).unwrap();
        });
        Some(restore)
    },
};

/// A git repository with a first commit
pub fn clean_git() -> Fixture {
    Fixture::with(&[&MAKE_GIT, &INITIAL_COMMIT])
}

/// The version file committed and tagged on master, then git flow set up
pub fn good_base_repo() -> Fixture {
    Fixture::with(&[
        &MAKE_GIT,
        &WRITE_VERSION,
        &STAGE_VERSION,
        &COMMIT_VERSION,
        &SET_GOOD_TAG,
        &INIT_WORKFLOW,
    ])
}

pub fn on_master() -> Fixture {
    let mut fixture = good_base_repo();
    fixture.apply(&CHECKOUT_MASTER);
    fixture
}

pub fn existing_release() -> Fixture {
    let mut fixture = good_base_repo();
    fixture.apply(&OPEN_RELEASE);
    fixture
}

pub fn on_release_branch() -> Fixture {
    let mut fixture = existing_release();
    fixture.apply(&CHECKOUT_RELEASE);
    fixture
}

pub fn with_feature() -> Fixture {
    let mut fixture = good_base_repo();
    fixture.apply(&MAKE_FEATURE);
    fixture
}

pub fn on_feature() -> Fixture {
    let mut fixture = with_feature();
    fixture.apply(&CHECKOUT_FEATURE);
    fixture
}

/// Everything in place except the tag disagrees with the version file
pub fn bad_tag_and_version() -> Fixture {
    Fixture::with(&[
        &MAKE_GIT,
        &INITIAL_COMMIT,
        &WRITE_VERSION,
        &STAGE_VERSION,
        &COMMIT_VERSION,
        &SET_BAD_TAG,
        &INIT_WORKFLOW,
    ])
}

/// The matching tag exists, but only on develop
pub fn tag_on_develop() -> Fixture {
    Fixture::with(&[
        &MAKE_GIT,
        &INIT_WORKFLOW,
        &WRITE_VERSION,
        &STAGE_VERSION,
        &COMMIT_VERSION,
        &SET_GOOD_TAG,
    ])
}

/// A comparable summary of branches, tags, HEAD, index state and the
/// version file, used to prove a command changed nothing
pub fn snapshot(path: &Path) -> String {
    let mut lines = Vec::new();

    if let Ok(repo) = Repository::open(path) {
        if let Ok(head) = repo.head() {
            lines.push(format!("HEAD {:?} {:?}", head.shorthand(), head.target()));
        }
        for branch in repo.branches(Some(BranchType::Local)).unwrap() {
            let (branch, _) = branch.unwrap();
            lines.push(format!(
                "branch {} {:?}",
                branch.name().unwrap().unwrap_or(""),
                branch.get().target()
            ));
        }
        for tag in repo.tag_names(None).unwrap().iter().flatten() {
            let oid = repo.refname_to_id(&format!("refs/tags/{}", tag)).unwrap();
            lines.push(format!("tag {} {}", tag, oid));
        }
        let statuses = repo.statuses(None).unwrap();
        for entry in statuses.iter() {
            lines.push(format!("status {:?} {:?}", entry.path(), entry.status()));
        }
        let config = repo.config().unwrap();
        lines.push(format!(
            "gitflow {:?}",
            config.get_string("gitflow.branch.develop").ok()
        ));
    }

    let mut entries: Vec<_> = fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != ".git")
        .collect();
    entries.sort();
    for name in entries {
        let content = fs::read_to_string(path.join(&name)).unwrap_or_default();
        lines.push(format!("file {} {:?}", name, content));
    }

    lines.sort();
    lines.join("\n")
}
