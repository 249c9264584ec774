//! Release workflow core
//!
//! - [pipeline]: the ordered verification/repair checks run by [Config]
//! - [repo::VersionFlowRepo]: the validated handle and the release mutation
//! - [processor::VersionFlowProcessor]: strict re-check, then release
//! - [versions::Versions]: current and next version for a bump
//!
//! [Config]: crate::config::Config

pub mod pipeline;
pub mod processor;
pub mod repo;
pub mod versions;

pub use processor::VersionFlowProcessor;
pub use repo::VersionFlowRepo;
pub use versions::Versions;
