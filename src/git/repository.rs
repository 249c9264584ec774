use crate::error::{CommandFailure, Result, VersionFlowError};
use git2::{
    BranchType, Commit, DescribeFormatOptions, DescribeOptions, ErrorCode, Oid,
    Repository as Git2Repo, RepositoryInitOptions, Signature, StatusOptions,
};
use log::debug;
use semver::Version;
use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open the repository rooted at `path`.
    ///
    /// Parent directories are not searched.
    ///
    /// # Returns
    /// * `Ok(Some(repo))` - `path` is a git repository
    /// * `Ok(None)` - `path` is not a git repository
    /// * `Err` - For any other git failure
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        match Git2Repo::open(path.as_ref()) {
            Ok(repo) => Self::from_git2(repo).map(Some),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Initialise a new repository at `path` with HEAD on `initial_branch`
    pub fn init<P: AsRef<Path>>(path: P, initial_branch: &str) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(initial_branch);
        let repo = Git2Repo::init_opts(path.as_ref(), &opts)?;
        debug!("initialised git repository at {}", path.as_ref().display());

        Self::from_git2(repo)
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Result<Self> {
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                VersionFlowError::vcs(
                    CommandFailure::new("open repository", -1)
                        .with_stderr("bare repositories have no working tree"),
                )
            })?;

        Ok(Git2Repository { repo, workdir })
    }

    /// Express `path` relative to the working tree root
    fn repo_relative(&self, path: &Path) -> Result<PathBuf> {
        if path.is_relative() {
            return Ok(path
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect());
        }
        if let Ok(relative) = path.strip_prefix(&self.workdir) {
            return Ok(relative.to_path_buf());
        }

        // The two sides may spell a symlinked prefix differently
        let workdir = fs::canonicalize(&self.workdir)?;
        let parent = fs::canonicalize(path.parent().unwrap_or(Path::new("/")))?;
        let resolved = match path.file_name() {
            Some(name) => parent.join(name),
            None => parent,
        };

        resolved
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                VersionFlowError::vcs(CommandFailure::new("resolve path", -1).with_stderr(
                    format!(
                        "{} is outside the repository at {}",
                        path.display(),
                        self.workdir.display()
                    ),
                ))
            })
    }
}

/// Order tag names by semantic version, ranking unparsable names lowest
fn compare_tags(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// The commit HEAD points at, or `None` while the current branch is unborn
pub(crate) fn head_commit(repo: &Git2Repo) -> Result<Option<Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Configured user signature, falling back to a fixed versionflow identity
pub(crate) fn signature(repo: &Git2Repo) -> Result<Signature<'static>> {
    match repo.signature() {
        Ok(sig) => Ok(sig),
        Err(_) => Ok(Signature::now("versionflow", "versionflow@localhost")?),
    }
}

impl super::Repository for Git2Repository {
    fn is_dirty(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        Ok(statuses.iter().any(|entry| !entry.status().is_empty()))
    }

    fn is_tracked(&self, path: &Path) -> Result<bool> {
        let relative = self.repo_relative(path)?;
        let Some(commit) = head_commit(&self.repo)? else {
            return Ok(false);
        };

        match commit.tree()?.get_path(&relative) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        // another handle may have checked out a branch since the index was loaded
        index.read(false)?;
        for path in paths {
            index.add_path(&self.repo_relative(path)?)?;
        }
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let sig = signature(&self.repo)?;
        let parent = head_commit(&self.repo)?;
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        debug!("committed {} ({})", oid, message);

        Ok(())
    }

    fn last_tag(&self) -> Result<Option<String>> {
        let Some(head) = head_commit(&self.repo)? else {
            return Ok(None);
        };
        let head = head.id();

        let mut reachable: Vec<(String, Oid)> = Vec::new();
        for name in self.repo.tag_names(None)?.iter().flatten() {
            let Ok(commit) = self
                .repo
                .revparse_single(&format!("refs/tags/{}", name))
                .and_then(|object| object.peel_to_commit())
            else {
                continue;
            };

            let id = commit.id();
            if id == head || self.repo.graph_descendant_of(head, id)? {
                reachable.push((name.to_string(), id));
            }
        }

        // Commit times are too coarse to order tags made within one second,
        // so nearness comes from ancestry alone
        let mut nearest: Vec<&str> = Vec::new();
        for (name, id) in &reachable {
            let mut shadowed = false;
            for (_, other) in &reachable {
                if other != id && self.repo.graph_descendant_of(*other, *id)? {
                    shadowed = true;
                    break;
                }
            }
            if !shadowed {
                nearest.push(name);
            }
        }

        let tag = nearest.into_iter().max_by(|a, b| compare_tags(a, b));
        debug!("last tag from {}: {:?}", head, tag);

        Ok(tag.map(str::to_string))
    }

    fn branches_containing_tag(&self, tag: &str) -> Result<Vec<String>> {
        let target = self
            .repo
            .revparse_single(&format!("refs/tags/{}", tag))?
            .peel_to_commit()?
            .id();

        let mut names = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                continue;
            };

            let head = branch.get().peel_to_commit()?.id();
            if head == target || self.repo.graph_descendant_of(head, target)? {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn create_tag(&self, name: &str, branch: &str) -> Result<()> {
        let commit = self
            .repo
            .find_branch(branch, BranchType::Local)?
            .get()
            .peel_to_commit()?;

        self.repo.tag_lightweight(name, commit.as_object(), false)?;
        debug!("tagged {} on {} as {}", commit.id(), branch, name);

        Ok(())
    }

    fn describe(&self) -> Result<String> {
        let mut opts = DescribeOptions::new();
        opts.describe_tags().show_commit_oid_as_fallback(true);

        let mut format = DescribeFormatOptions::new();
        format.dirty_suffix("-dirty");

        Ok(self.repo.describe(&opts)?.format(Some(&format))?)
    }
}
