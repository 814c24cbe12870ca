//! Child process execution with captured output and an optional timeout.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

use kiln_core::{
    application::{ApplicationError, ports::CommandRunner},
    domain::{CommandOutput, CommandSpec},
    error::{KilnError, KilnResult},
};

/// Variables carried into a clean environment.
pub const DEFAULT_KEEP_ENV: &[&str] = &[
    "PATH", "HOME", "USER", "LOGNAME", "LANG", "LC_ALL", "TERM", "SHELL", "TMPDIR",
];

/// How long to keep collecting output after a timed-out command is killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Runs commands with `std::process::Command`.
///
/// stdin is closed, stdout and stderr are drained on reader threads so a
/// chatty child cannot deadlock on a full pipe. On Unix each command gets
/// its own process group, and a timeout kills the whole group, so
/// `sh -c`, `bundle exec` and similar wrappers cannot outlive it.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    keep_env: Vec<String>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::with_keep_env(DEFAULT_KEEP_ENV.iter().copied())
    }

    /// Use `keys` instead of [`DEFAULT_KEEP_ENV`] for clean-env commands.
    pub fn with_keep_env<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep_env: keys.into_iter().map(Into::into).collect(),
        }
    }

    fn build(&self, spec: &CommandSpec, cwd: &Path) -> Command {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.args()).current_dir(cwd);

        if spec.clean_env {
            cmd.env_clear();
            for key in &self.keep_env {
                if let Some(value) = std::env::var_os(key) {
                    cmd.env(key, value);
                }
            }
        }
        cmd.envs(&spec.env);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(command = %spec.display(), cwd = %cwd.display()))]
    fn run(&self, spec: &CommandSpec, cwd: &Path) -> KilnResult<CommandOutput> {
        let spawn_error = |reason: String| -> KilnError {
            ApplicationError::CommandSpawn {
                command: spec.display(),
                reason,
            }
            .into()
        };

        debug!("spawning child process");
        let mut child = self
            .build(spec, cwd)
            .spawn()
            .map_err(|e| spawn_error(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error("stdout was not piped".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_error("stderr was not piped".into()))?;

        let stdout_rx = spawn_reader(stdout);
        let stderr_rx = spawn_reader(stderr);

        let mut timed_out = false;
        let status = match spec.timeout {
            Some(timeout) => match child
                .wait_timeout(timeout)
                .map_err(|e| spawn_error(format!("wait failed: {e}")))?
            {
                Some(status) => status,
                None => {
                    warn!(
                        timeout_secs = timeout.as_secs_f64(),
                        "command timed out, killing its process group"
                    );
                    timed_out = true;
                    kill_tree(&mut child)
                        .map_err(|e| spawn_error(format!("kill failed: {e}")))?;
                    child
                        .wait()
                        .map_err(|e| spawn_error(format!("wait failed: {e}")))?
                }
            },
            None => child
                .wait()
                .map_err(|e| spawn_error(format!("wait failed: {e}")))?,
        };

        let (stdout, stderr) = if timed_out {
            // A descendant that left the group may still hold the pipes.
            (
                collect_within(&stdout_rx, KILL_GRACE),
                collect_within(&stderr_rx, KILL_GRACE),
            )
        } else {
            (collect(&stdout_rx), collect(&stderr_rx))
        };

        debug!(exit_code = ?status.code(), timed_out, "command finished");
        Ok(CommandOutput {
            exit_code: if timed_out { None } else { status.code() },
            stdout,
            stderr,
            timed_out,
        })
    }
}

/// Kill the child and everything in its process group.
#[cfg(unix)]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return child.kill();
    };
    // SAFETY: `kill` only sends a signal; the group was created for this
    // child by `process_group(0)`, so its id equals the child's pid.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
        Ok(())
    } else {
        child.kill()
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    child.kill()
}

/// Drain `reader` on its own thread and deliver the text when it hits EOF.
fn spawn_reader(mut reader: impl Read + Send + 'static) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf) {
            warn!(error = %e, "failed to read child output");
        }
        // The receiver is gone if the caller stopped waiting.
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

fn collect(rx: &Receiver<String>) -> String {
    rx.recv().unwrap_or_else(|_| {
        warn!("output reader thread panicked");
        String::new()
    })
}

fn collect_within(rx: &Receiver<String>, grace: Duration) -> String {
    rx.recv_timeout(grace).unwrap_or_else(|_| {
        warn!("output still open after kill; dropping it");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new(["/bin/sh", "-c", script]).unwrap()
    }

    #[test]
    fn captures_exit_code_and_output() {
        let temp = TempDir::new().unwrap();
        let out = ProcessRunner::new()
            .run(&sh("echo out; echo err >&2; exit 3"), temp.path())
            .unwrap();

        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert!(!out.success());
    }

    #[test]
    fn runs_in_given_directory() {
        let temp = TempDir::new().unwrap();
        let out = ProcessRunner::new()
            .run(&CommandSpec::new(["/bin/pwd"]).unwrap(), temp.path())
            .unwrap();

        let name = temp.path().file_name().unwrap().to_string_lossy();
        assert!(out.stdout.trim_end().ends_with(name.as_ref()));
    }

    #[test]
    fn clean_env_keeps_only_listed_and_overrides() {
        let temp = TempDir::new().unwrap();
        let spec = CommandSpec::new(["/usr/bin/env"])
            .unwrap()
            .clean()
            .with_env("KILN_MARKER", "1");

        let out = ProcessRunner::with_keep_env(Vec::<String>::new())
            .run(&spec, temp.path())
            .unwrap();

        assert_eq!(out.stdout, "KILN_MARKER=1\n");
    }

    #[test]
    fn inherited_env_includes_overrides() {
        let temp = TempDir::new().unwrap();
        let spec = sh("echo \"$KILN_MARKER\"").with_env("KILN_MARKER", "hello");

        let out = ProcessRunner::new().run(&spec, temp.path()).unwrap();
        assert_eq!(out.stdout, "hello\n");
    }

    #[test]
    fn timeout_kills_the_child() {
        let temp = TempDir::new().unwrap();
        let spec = CommandSpec::new(["sleep", "5"])
            .unwrap()
            .with_timeout(Duration::from_millis(200));

        let out = ProcessRunner::new().run(&spec, temp.path()).unwrap();
        assert!(out.timed_out);
        assert_eq!(out.exit_code, None);
        assert!(!out.success());
    }

    #[test]
    fn timeout_also_kills_grandchildren() {
        let temp = TempDir::new().unwrap();
        let spec = sh("sleep 5; true").with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let out = ProcessRunner::new().run(&spec, temp.path()).unwrap();

        assert!(out.timed_out);
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "returned after {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let temp = TempDir::new().unwrap();
        let spec = CommandSpec::new(["kiln-no-such-program-xyz"]).unwrap();

        let err = ProcessRunner::new().run(&spec, temp.path()).unwrap_err();
        assert!(matches!(
            err,
            KilnError::Application(ApplicationError::CommandSpawn { .. })
        ));
    }
}
