//! Command Runner service - run a process and judge its outcome.

use std::path::Path;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::{
    application::{ApplicationError, ports::CommandRunner},
    domain::{CommandOutput, CommandSpec},
    error::KilnResult,
};

/// Keep at most this many trailing stderr lines in a failure.
const STDERR_SNIPPET_LINES: usize = 20;
/// ...and at most this many bytes.
const STDERR_SNIPPET_BYTES: usize = 2000;

/// Runs commands in the project root and turns non-zero exits into errors.
pub struct CommandService<'a> {
    runner: &'a dyn CommandRunner,
    root: &'a Path,
    default_timeout: Option<Duration>,
}

impl<'a> CommandService<'a> {
    pub fn new(runner: &'a dyn CommandRunner, root: &'a Path) -> Self {
        Self {
            runner,
            root,
            default_timeout: None,
        }
    }

    /// Timeout applied to specs that do not set their own.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    #[instrument(skip_all, fields(command = %spec.display(), clean_env = spec.clean_env))]
    pub fn run(&self, spec: &CommandSpec) -> KilnResult<CommandOutput> {
        let cwd = spec
            .working_dir
            .as_ref()
            .map_or_else(|| self.root.to_path_buf(), |dir| dir.resolve(self.root));

        let output = match (spec.timeout, self.default_timeout) {
            (None, Some(timeout)) => {
                let spec = spec.clone().with_timeout(timeout);
                self.runner.run(&spec, &cwd)?
            }
            _ => self.runner.run(spec, &cwd)?,
        };

        if !output.success() {
            warn!(
                exit_code = ?output.exit_code,
                timed_out = output.timed_out,
                "command failed"
            );
            return Err(ApplicationError::CommandFailed {
                command: spec.display(),
                exit_code: output.exit_code,
                stderr_snippet: stderr_snippet(&output.stderr),
                timed_out: output.timed_out,
            }
            .into());
        }

        info!(command = %spec.display(), "command succeeded");
        Ok(output)
    }
}

/// Tail of stderr, bounded by lines and bytes.
fn stderr_snippet(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_SNIPPET_LINES);
    let tail = lines[start..].join("\n");

    if tail.len() <= STDERR_SNIPPET_BYTES {
        return tail;
    }
    let mut cut = tail.len() - STDERR_SNIPPET_BYTES;
    while !tail.is_char_boundary(cut) {
        cut += 1;
    }
    tail[cut..].to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use mockall::predicate::{always, eq};

    use super::*;
    use crate::application::ports::MockCommandRunner;
    use crate::domain::RelativePath;
    use crate::error::KilnError;

    fn exit(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(code),
            stderr: stderr.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn zero_exit_is_success() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .with(always(), eq(PathBuf::from("/p")))
            .returning(|_, _| Ok(exit(0, "")));

        let svc = CommandService::new(&runner, Path::new("/p"));
        let out = svc.run(&CommandSpec::new(["true"]).unwrap()).unwrap();
        assert_eq!(out.exit_code, Some(0));
    }

    #[test]
    fn non_zero_exit_is_command_error() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|_, _| Ok(exit(1, "")));

        let svc = CommandService::new(&runner, Path::new("/p"));
        let err = svc.run(&CommandSpec::new(["false"]).unwrap()).unwrap_err();
        assert_eq!(
            err,
            KilnError::Application(ApplicationError::CommandFailed {
                command: "false".into(),
                exit_code: Some(1),
                stderr_snippet: String::new(),
                timed_out: false,
            })
        );
    }

    #[test]
    fn working_dir_is_resolved_against_root() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .with(always(), eq(PathBuf::from("/p/client")))
            .returning(|_, _| Ok(exit(0, "")));

        let svc = CommandService::new(&runner, Path::new("/p"));
        let spec = CommandSpec::new(["npm", "install"])
            .unwrap()
            .in_dir(RelativePath::try_new("client").unwrap());
        assert!(svc.run(&spec).is_ok());
    }

    #[test]
    fn default_timeout_fills_unset_spec() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|spec, _| spec.timeout == Some(Duration::from_secs(30)))
            .returning(|_, _| Ok(exit(0, "")));

        let svc = CommandService::new(&runner, Path::new("/p"))
            .with_default_timeout(Some(Duration::from_secs(30)));
        assert!(svc.run(&CommandSpec::new(["sleep", "1"]).unwrap()).is_ok());
    }

    #[test]
    fn spec_timeout_wins_over_default() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|spec, _| spec.timeout == Some(Duration::from_secs(5)))
            .returning(|_, _| Ok(exit(0, "")));

        let svc = CommandService::new(&runner, Path::new("/p"))
            .with_default_timeout(Some(Duration::from_secs(30)));
        let spec = CommandSpec::new(["x"])
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert!(svc.run(&spec).is_ok());
    }

    #[test]
    fn snippet_keeps_tail() {
        let stderr: String = (1..=50).map(|i| format!("line {i}\n")).collect();
        let snippet = stderr_snippet(&stderr);
        assert!(snippet.starts_with("line 31"));
        assert!(snippet.ends_with("line 50"));
    }

    #[test]
    fn snippet_is_byte_bounded_on_char_boundary() {
        let stderr = "é".repeat(3000);
        let snippet = stderr_snippet(&stderr);
        assert!(snippet.len() <= STDERR_SNIPPET_BYTES);
        assert!(snippet.chars().all(|c| c == 'é'));
    }
}
