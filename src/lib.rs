//! versionflow: check and drive git-flow releases against a bumpversion
//! version file.

pub mod bump;
pub mod config;
pub mod engines;
pub mod error;
pub mod flow;
pub mod git;
pub mod process;
pub mod ui;
pub mod workflow;

pub use config::{Config, Settings};
pub use error::{CommandFailure, Result, VersionFlowError};
pub use flow::{VersionFlowProcessor, VersionFlowRepo, Versions};
