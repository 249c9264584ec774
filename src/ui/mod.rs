//! User interface module - terminal echo of pipeline progress and failures.
//!
//! - `formatter` - formatting and printing helpers
//! - This module - reporting a [VersionFlowError] the way the CLI ends a run

pub mod formatter;

pub use formatter::{
    display_abort, display_failure, display_status, display_success,
    format_failure, ABORTED,
};

use crate::error::VersionFlowError;

/// Report a failed command: engine diagnostics first, if any, then the
/// error's fixed description and the abort marker.
pub fn report_error(err: &VersionFlowError) {
    if let Some(failure) = err.failure() {
        display_failure(failure);
    }
    display_abort(&err.to_string());
}
