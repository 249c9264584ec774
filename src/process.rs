//! Blocking subprocess execution for the command-line engines.
//!
//! Every call runs exactly once, with no timeout. A non-zero exit status or a
//! spawn failure becomes a [CommandFailure] holding the command line, the exit
//! status and both captured streams.

use std::process::Command;

use log::debug;

use crate::error::CommandFailure;

/// Render a command as a shell-like line for diagnostics
pub fn command_line(cmd: &Command) -> String {
    let mut line = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Run a command to completion and return its standard output.
///
/// # Returns
/// * `Ok(String)` - stdout if the command exited with status 0
/// * `Err(CommandFailure)` - if the command could not be spawned or exited non-zero
pub fn run(cmd: &mut Command) -> Result<String, CommandFailure> {
    let line = command_line(cmd);
    debug!("running `{}`", line);

    let output = cmd
        .output()
        .map_err(|e| CommandFailure::new(line.clone(), -1).with_stderr(e.to_string()))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let status = output.status.code().unwrap_or(-1);
        debug!("`{}` failed with status {}", line, status);
        return Err(CommandFailure::new(line, status)
            .with_stdout(stdout)
            .with_stderr(stderr));
    }

    Ok(stdout)
}
