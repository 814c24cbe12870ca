//! Toolchain version probes.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use kiln_core::{application::ports::CommandRunner, domain::CommandSpec};

const VERSION_PATTERN: &str = r"(\d+\.\d+\.\d+)";

/// The first `X.Y.Z` in `text`.
pub fn parse_version(text: &str) -> Option<String> {
    let re = Regex::new(VERSION_PATTERN).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Ask the `ruby` on `PATH` for its version.
///
/// `None` when ruby is missing, fails, or prints something unexpected.
pub fn ruby_version(runner: &dyn CommandRunner, cwd: &Path) -> Option<String> {
    let spec = CommandSpec::new(["ruby", "-v"]).ok()?;
    match runner.run(&spec, cwd) {
        Ok(output) if output.success() => parse_version(&output.stdout),
        Ok(output) => {
            debug!(exit_code = ?output.exit_code, "ruby -v failed");
            None
        }
        Err(e) => {
            debug!(error = %e, "ruby not available");
            None
        }
    }
}
