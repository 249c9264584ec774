use crate::bump::{BumpPart, VersionTool};
use crate::error::Result;

/// Current version and the version a bump leads to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub current: String,
    pub new: String,
}

impl Versions {
    /// Ask `tool` for its current version and a dry run of `part`.
    ///
    /// # Returns
    /// * `Err(VersionFlowError::ComputeNextVersion)` - the dry run failed
    /// * `Err(VersionFlowError::GetVersion)` - the dry run named no new version
    pub fn from_version_tool(tool: &dyn VersionTool, part: BumpPart) -> Result<Self> {
        Ok(Versions {
            current: tool.current_version().to_string(),
            new: tool.next_version(part)?,
        })
    }
}
