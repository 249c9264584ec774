//! Pure formatting functions for UI output.
//!
//! Progress goes to stdout, failures to stderr. Styling is dropped
//! automatically when the stream is not a terminal.

use console::style;

use crate::error::CommandFailure;

/// Line printed last whenever a command gives up
pub const ABORTED: &str = "Aborted!";

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Render the diagnostics of a failed engine call.
///
/// The first line names the command and its exit status; captured output
/// follows, stdout before stderr, with empty streams left out.
pub fn format_failure(failure: &CommandFailure) -> String {
    let mut lines = vec![failure.to_string()];
    for stream in [&failure.stdout, &failure.stderr] {
        let trimmed = stream.trim_end();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

/// Print engine diagnostics to stderr, marked in red
pub fn display_failure(failure: &CommandFailure) {
    eprintln!(
        "{} {}",
        style("ERROR:").red().for_stderr(),
        format_failure(failure)
    );
}

/// Print the fixed description of an error and the abort marker.
///
/// These are always the last two lines on stderr.
pub fn display_abort(description: &str) {
    eprintln!("{}", description);
    eprintln!("{}", ABORTED);
}
