//! Version-file tool
//!
//! The version file is an ini document whose `[bumpversion]` section holds the
//! authoritative `current_version`. A [VersionTool] reads it, reports the next
//! version for a bump part as a bumpversion-style dry-run listing, and bumps
//! and commits the file.
//!
//! - [native::BumpVersion]: rewrites the file and commits in process
//! - [command::BumpVersionCommand]: the external `bumpversion` tool
//!
//! Both report the next version through the same listing format, so parsing
//! tool output stays behind this module.

pub mod command;
pub mod native;

pub use command::BumpVersionCommand;
pub use native::BumpVersion;

use crate::error::{Result, VersionFlowError};
use crate::git::Repository;
use ini::Ini;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const BV_SECTION: &str = "bumpversion";
pub const BV_CURRENT_VER_OPTION: &str = "current_version";
pub const BV_NEW_VER_OPTION: &str = "new_version";

/// Which version component a release increments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpPart {
    Major,
    Minor,
    Patch,
}

impl BumpPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpPart::Major => "major",
            BumpPart::Minor => "minor",
            BumpPart::Patch => "patch",
        }
    }

    /// Increment `version` by this part, resetting lower components to 0
    /// and dropping pre-release and build metadata
    pub fn apply(&self, version: &semver::Version) -> semver::Version {
        match self {
            BumpPart::Major => semver::Version::new(version.major + 1, 0, 0),
            BumpPart::Minor => semver::Version::new(version.major, version.minor + 1, 0),
            BumpPart::Patch => {
                semver::Version::new(version.major, version.minor, version.patch + 1)
            }
        }
    }
}

impl fmt::Display for BumpPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpPart {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "major" => Ok(BumpPart::Major),
            "minor" => Ok(BumpPart::Minor),
            "patch" => Ok(BumpPart::Patch),
            other => Err(format!("unknown bump part '{}'", other)),
        }
    }
}

/// Operations versionflow needs from a version-file tool
pub trait VersionTool {
    /// The version recorded in the file when it was read
    fn current_version(&self) -> &str;

    /// bumpversion-style `key=value` listing for a dry run of `part`.
    ///
    /// # Returns
    /// * `Err(VersionFlowError::ComputeNextVersion)` - if the dry run itself failed
    fn dry_run(&self, part: BumpPart) -> Result<String>;

    /// The version `part` would bump to
    ///
    /// # Returns
    /// * `Err(VersionFlowError::GetVersion)` - if the listing has no `new_version`
    fn next_version(&self, part: BumpPart) -> Result<String> {
        let listing = self.dry_run(part)?;
        parse_new_version(&listing).ok_or(VersionFlowError::GetVersion)
    }

    /// Bump the file by `part`, commit the change through `repo`, and return
    /// the new version
    ///
    /// # Returns
    /// * `Err(VersionFlowError::CommitVersion)` - on any tool failure
    fn bump_and_commit(&mut self, part: BumpPart, repo: &dyn Repository) -> Result<String>;
}

/// Extract the last `new_version=` value from a dry-run listing
pub fn parse_new_version(listing: &str) -> Option<String> {
    let prefix = format!("{}=", BV_NEW_VER_OPTION);
    listing
        .lines()
        .filter_map(|line| line.trim().strip_prefix(&prefix))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .last()
}

/// Read `current_version` from the version file.
///
/// # Returns
/// * `Some(version)` - the file exists, parses, and has the option
/// * `None` - the file is missing, unparsable, or lacks the section or option
pub fn read_current_version(path: &Path) -> Option<String> {
    let ini = Ini::load_from_file(path).ok()?;
    ini.section(Some(BV_SECTION))?
        .get(BV_CURRENT_VER_OPTION)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Write `current_version` into the version file, keeping its other content.
///
/// A missing or unparsable file is replaced with a fresh document.
pub fn write_current_version(path: &Path, version: &str) -> std::io::Result<()> {
    let mut ini = Ini::load_from_file(path).unwrap_or_else(|_| Ini::new());
    ini.with_section(Some(BV_SECTION))
        .set(BV_CURRENT_VER_OPTION, version);
    ini.write_to_file(path)
}
