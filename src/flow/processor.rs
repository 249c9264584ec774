use crate::bump::BumpPart;
use crate::config::Config;
use crate::engines::{DefaultEngines, Engines};
use crate::error::Result;
use crate::flow::{VersionFlowRepo, Versions};
use crate::workflow::FlowKind;

/// Performs one release against a freshly verified repository
pub struct VersionFlowProcessor {
    repo: VersionFlowRepo,
    part: BumpPart,
    kind: FlowKind,
}

impl VersionFlowProcessor {
    /// Verify the repository in strict mode and prepare a release.
    ///
    /// Earlier `init` or `check` runs are never trusted; the checks always
    /// run again here and nothing is repaired.
    pub fn from_config(config: &Config, part: BumpPart, kind: FlowKind) -> Result<Self> {
        let engines = DefaultEngines::new(&config.settings);
        Self::from_config_with(config, &engines, part, kind)
    }

    pub fn from_config_with(
        config: &Config,
        engines: &dyn Engines,
        part: BumpPart,
        kind: FlowKind,
    ) -> Result<Self> {
        let repo = VersionFlowRepo::create_checked_with(config, engines, false)?;
        Ok(VersionFlowProcessor { repo, part, kind })
    }

    /// Compute the versions and release the new one
    pub fn process(&mut self) -> Result<String> {
        let versions = Versions::from_version_tool(self.repo.version_tool(), self.part)?;
        self.repo.process_action(&versions, self.part, self.kind)
    }
}
