use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in the repository and config directories.
pub const SETTINGS_FILE: &str = "versionflow.toml";

/// Default version file, relative to the repository directory.
pub const DEFAULT_VERSION_FILE: &str = ".bumpversion.cfg";

/// Version written into a freshly created version file.
pub const START_VERSION: &str = "0.0.0";

/// Represents the complete settings for versionflow.
///
/// Contains the branch names of the workflow, branch prefixes, the version
/// file defaults and the choice of engines.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Branch that carries release tags
    #[serde(default = "default_main_branch")]
    pub main_branch: String,

    #[serde(default = "default_develop_branch")]
    pub develop_branch: String,

    #[serde(default = "default_version_file")]
    pub version_file: String,

    #[serde(default = "default_start_version")]
    pub start_version: String,

    #[serde(default)]
    pub prefixes: PrefixesConfig,

    #[serde(default)]
    pub engines: EnginesConfig,
}

fn default_main_branch() -> String {
    "master".to_string()
}

fn default_develop_branch() -> String {
    "develop".to_string()
}

fn default_version_file() -> String {
    DEFAULT_VERSION_FILE.to_string()
}

fn default_start_version() -> String {
    START_VERSION.to_string()
}

/// Branch name prefixes of the branching workflow.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrefixesConfig {
    #[serde(default = "default_feature_prefix")]
    pub feature: String,

    #[serde(default = "default_release_prefix")]
    pub release: String,

    #[serde(default = "default_hotfix_prefix")]
    pub hotfix: String,

    #[serde(default = "default_support_prefix")]
    pub support: String,
}

fn default_feature_prefix() -> String {
    "feature/".to_string()
}

fn default_release_prefix() -> String {
    "release/".to_string()
}

fn default_hotfix_prefix() -> String {
    "hotfix/".to_string()
}

fn default_support_prefix() -> String {
    "support/".to_string()
}

impl Default for PrefixesConfig {
    fn default() -> Self {
        PrefixesConfig {
            feature: default_feature_prefix(),
            release: default_release_prefix(),
            hotfix: default_hotfix_prefix(),
            support: default_support_prefix(),
        }
    }
}

/// Which implementation backs each external engine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct EnginesConfig {
    #[serde(default)]
    pub workflow: WorkflowEngineKind,

    #[serde(default)]
    pub version_tool: VersionToolKind,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowEngineKind {
    /// git-flow conventions implemented over libgit2
    #[default]
    Native,
    /// The external `git flow` command
    GitFlow,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VersionToolKind {
    /// ini rewrite and semver bump in process
    #[default]
    Native,
    /// The external `bumpversion` command
    Bumpversion,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            main_branch: default_main_branch(),
            develop_branch: default_develop_branch(),
            version_file: default_version_file(),
            start_version: default_start_version(),
            prefixes: PrefixesConfig::default(),
            engines: EnginesConfig::default(),
        }
    }
}

/// Loads settings from file or returns defaults.
///
/// Attempts to load settings in the following order:
/// 1. Custom path provided as parameter
/// 2. `versionflow.toml` in the repository directory
/// 3. `versionflow.toml` in the user config directory
/// 4. Default settings if no file found
///
/// # Returns
/// * `Ok(Settings)` - Loaded or default settings
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_settings(settings_path: Option<&Path>, repo_dir: &Path) -> anyhow::Result<Settings> {
    let local = repo_dir.join(SETTINGS_FILE);

    let settings_str = if let Some(path) = settings_path {
        fs::read_to_string(path)?
    } else if local.exists() {
        fs::read_to_string(local)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let settings_path = config_dir.join(SETTINGS_FILE);
        if settings_path.exists() {
            fs::read_to_string(settings_path)?
        } else {
            return Ok(Settings::default());
        }
    } else {
        return Ok(Settings::default());
    };

    let settings: Settings = toml::from_str(&settings_str)?;
    Ok(settings)
}

/// Per-invocation configuration: where the repository and version file live.
///
/// Built once per command and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub repo_dir: PathBuf,
    pub version_file: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Build a config, resolving a relative version file against `repo_dir`.
    ///
    /// When `version_file` is `None` the settings' default file name is used.
    pub fn new(repo_dir: impl Into<PathBuf>, version_file: Option<&Path>, settings: Settings) -> Self {
        let repo_dir = repo_dir.into();
        let version_file = match version_file {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => repo_dir.join(path),
            None => repo_dir.join(&settings.version_file),
        };

        Config {
            repo_dir,
            version_file,
            settings,
        }
    }

    /// Config with default settings
    pub fn with_defaults(repo_dir: impl Into<PathBuf>) -> Self {
        Config::new(repo_dir, None, Settings::default())
    }

    /// The branch the release tags must live on
    pub fn main_branch(&self) -> &str {
        &self.settings.main_branch
    }
}
