//! Version-control engine abstraction
//!
//! versionflow needs a narrow capability set from git: dirty and tracked-file
//! checks, committing a file, creating and locating tags, and listing the
//! branches that contain a tag. Opening and initialising a repository are
//! constructors on the concrete type and go through [crate::engines::Engines].
//!
//! - [repository::Git2Repository]: the real implementation using the `git2` crate
//! - [crate::engines::mock::MockRepository]: in-memory implementation for tests

pub mod repository;

pub use repository::Git2Repository;

use crate::error::Result;
use std::path::Path;

/// Common git operation trait for abstraction
///
/// All methods return [crate::error::Result<T>]; implementations map
/// engine-specific failures to [crate::error::VersionFlowError::VcsCommand].
pub trait Repository {
    /// Whether tracked files have staged or unstaged changes.
    ///
    /// Untracked files do not make a repository dirty.
    fn is_dirty(&self) -> Result<bool>;

    /// Whether `path` exists in the tree of the current HEAD commit.
    ///
    /// Returns `Ok(false)` when HEAD has no commit yet.
    fn is_tracked(&self, path: &Path) -> Result<bool>;

    /// Stage `paths` and commit them on the current branch
    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()>;

    /// The nearest tag reachable from HEAD.
    ///
    /// A reachable tag is dropped when another reachable tag sits on one of
    /// its descendants. Tags left on unrelated commits rank by semantic
    /// version, highest first.
    ///
    /// # Returns
    /// * `Ok(Some(tag))` - The nearest tag name
    /// * `Ok(None)` - If no tag is reachable, or HEAD has no commit
    fn last_tag(&self) -> Result<Option<String>>;

    /// Names of local branches whose head contains the commit `tag` points at
    fn branches_containing_tag(&self, tag: &str) -> Result<Vec<String>>;

    /// Create a lightweight tag at the head of `branch`
    fn create_tag(&self, name: &str, branch: &str) -> Result<()>;

    /// Human-readable description of HEAD, like `git describe --tags --always --dirty`
    fn describe(&self) -> Result<String>;
}
