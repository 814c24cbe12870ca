//! Pipeline Runner - the step interpreter.
//!
//! Executes a [`Pipeline`] against a project root:
//! 1. Create the root if it is missing
//! 2. Run each step in order through the matching primitive
//! 3. Stop at the first failure, wrapping it with the step's position
//!
//! There is no rollback. Effects of steps that completed before a failure
//! stay on disk.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ports::{CommandRunner, Fetcher, Filesystem},
        services::{CommandService, Injector, Materializer, RemoteFetcher},
    },
    domain::{Pipeline, RunReport, Step, StepOutcome, StepRecord},
    error::KilnResult,
};

/// Progress notifications emitted while a pipeline runs.
#[derive(Debug)]
pub enum StepEvent<'a> {
    Started {
        index: usize,
        total: usize,
        step: &'a Step,
    },
    Finished(&'a StepRecord),
}

/// Interprets pipelines using the injected adapters.
pub struct PipelineRunner {
    filesystem: Box<dyn Filesystem>,
    fetcher: Box<dyn Fetcher>,
    runner: Box<dyn CommandRunner>,
    dry_run: bool,
    command_timeout: Option<Duration>,
}

impl PipelineRunner {
    pub fn new(
        filesystem: Box<dyn Filesystem>,
        fetcher: Box<dyn Fetcher>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            filesystem,
            fetcher,
            runner,
            dry_run: false,
            command_timeout: None,
        }
    }

    /// Record every step as planned without touching any adapter.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Timeout for commands that do not carry their own.
    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn execute(&self, root: &Path, pipeline: &Pipeline) -> KilnResult<RunReport> {
        self.execute_with(root, pipeline, &mut |_| {})
    }

    /// Run `pipeline`, reporting progress to `observer`.
    ///
    /// Returns `StepFailed` for the first failing step; later steps are
    /// never attempted.
    #[instrument(
        skip_all,
        fields(root = %root.display(), steps = pipeline.len(), dry_run = self.dry_run)
    )]
    pub fn execute_with(
        &self,
        root: &Path,
        pipeline: &Pipeline,
        observer: &mut dyn FnMut(StepEvent<'_>),
    ) -> KilnResult<RunReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "starting pipeline");

        if !self.dry_run && !self.filesystem.exists(root) {
            debug!("creating project root");
            self.filesystem.create_dir_all(root)?;
        }

        let total = pipeline.len();
        let mut report = RunReport::new(self.dry_run);

        for (offset, step) in pipeline.steps().iter().enumerate() {
            let index = offset + 1;
            let description = step.to_string();
            let _span = info_span!("step", %run_id, index, kind = ?step.kind()).entered();

            observer(StepEvent::Started { index, total, step });

            let outcome = match self.perform(root, step) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(index, step = %description, error = %err, "step failed, halting");
                    return Err(err.at_step(index, description));
                }
            };

            report.steps.push(StepRecord {
                index,
                kind: step.kind(),
                description,
                outcome,
            });
            if let Some(record) = report.steps.last() {
                observer(StepEvent::Finished(record));
            }
        }

        info!(%run_id, steps = report.steps.len(), "pipeline finished");
        Ok(report)
    }

    fn perform(&self, root: &Path, step: &Step) -> KilnResult<StepOutcome> {
        if self.dry_run {
            info!(step = %step, "would run");
            return Ok(StepOutcome::Planned);
        }

        let filesystem = self.filesystem.as_ref();
        match step {
            Step::WriteFile(action) => Materializer::new(filesystem, root).apply(action),
            Step::Inject(spec) => Injector::new(filesystem, root).inject(spec),
            Step::Fetch(spec) => {
                RemoteFetcher::new(self.fetcher.as_ref(), Materializer::new(filesystem, root))
                    .fetch_to(spec)
            }
            Step::RunCommand(spec) => {
                let output = CommandService::new(self.runner.as_ref(), root)
                    .with_default_timeout(self.command_timeout)
                    .run(spec)?;
                Ok(StepOutcome::Ran {
                    exit_code: output.exit_code.unwrap_or_default(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::application::{
        ApplicationError,
        ports::{MockCommandRunner, MockFetcher, MockFilesystem},
        services::test_support::FakeFs,
    };
    use crate::domain::{CommandOutput, Position, WriteMode};
    use crate::error::KilnError;

    /// Shares one [`FakeFs`] between the runner and the assertions.
    struct SharedFs(Arc<FakeFs>);

    impl Filesystem for SharedFs {
        fn create_dir_all(&self, path: &Path) -> KilnResult<()> {
            self.0.create_dir_all(path)
        }
        fn write_file(&self, path: &Path, content: &[u8]) -> KilnResult<()> {
            self.0.write_file(path, content)
        }
        fn read_file(&self, path: &Path) -> KilnResult<String> {
            self.0.read_file(path)
        }
        fn exists(&self, path: &Path) -> bool {
            self.0.exists(path)
        }
        fn is_file(&self, path: &Path) -> bool {
            self.0.is_file(path)
        }
        fn real_path(&self, path: &Path) -> KilnResult<PathBuf> {
            self.0.real_path(path)
        }
    }

    fn exited(code: i32) -> CommandOutput {
        CommandOutput {
            exit_code: Some(code),
            ..Default::default()
        }
    }

    fn runner_with(fs: Arc<FakeFs>, commands: MockCommandRunner) -> PipelineRunner {
        PipelineRunner::new(
            Box::new(SharedFs(fs)),
            Box::new(MockFetcher::new()),
            Box::new(commands),
        )
    }

    #[test]
    fn steps_run_in_order_and_see_each_other() {
        let fs = Arc::new(FakeFs::default());
        let pipeline = Pipeline::new()
            .write("config/app.rb", "a\nb\nc\n", WriteMode::Create)
            .unwrap()
            .inject("config/app.rb", "b", Position::After, "X", true)
            .unwrap();

        let report = runner_with(fs.clone(), MockCommandRunner::new())
            .execute(Path::new("/p"), &pipeline)
            .unwrap();

        assert_eq!(fs.read("/p/config/app.rb").as_deref(), Some("a\nb\nX\nc\n"));
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].outcome, StepOutcome::Created);
        assert_eq!(report.steps[1].outcome, StepOutcome::Injected { line: 2 });
        assert!(fs.has_dir("/p"));
    }

    #[test]
    fn failing_command_halts_the_pipeline() {
        let fs = Arc::new(FakeFs::default());
        let mut commands = MockCommandRunner::new();
        commands
            .expect_run()
            .withf(|spec, _| spec.program() == "false")
            .times(1)
            .returning(|_, _| Ok(exited(1)));
        commands
            .expect_run()
            .withf(|spec, _| spec.program() == "echo")
            .times(0);

        let pipeline = Pipeline::new()
            .write("a.txt", "a", WriteMode::Overwrite)
            .unwrap()
            .run(["false"])
            .unwrap()
            .run(["echo", "never"])
            .unwrap();

        let err = runner_with(fs.clone(), commands)
            .execute(Path::new("/p"), &pipeline)
            .unwrap_err();

        match &err {
            KilnError::StepFailed {
                index, description, ..
            } => {
                assert_eq!(*index, 2);
                assert_eq!(description, "run `false`");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            err.root(),
            KilnError::Application(ApplicationError::CommandFailed {
                exit_code: Some(1),
                ..
            })
        ));
        // Earlier effects survive.
        assert_eq!(fs.read("/p/a.txt").as_deref(), Some("a"));
    }

    #[test]
    fn missing_anchor_halts_before_later_writes() {
        let fs = Arc::new(FakeFs::default().with_file("/p/app.rb", "class App\nend\n"));
        let pipeline = Pipeline::new()
            .inject_after("app.rb", "does not exist", "x")
            .unwrap()
            .write("after.txt", "never", WriteMode::Overwrite)
            .unwrap();

        let err = runner_with(fs.clone(), MockCommandRunner::new())
            .execute(Path::new("/p"), &pipeline)
            .unwrap_err();

        assert!(matches!(err, KilnError::StepFailed { index: 1, .. }));
        assert_eq!(fs.read("/p/after.txt"), None);
        assert_eq!(fs.read("/p/app.rb").as_deref(), Some("class App\nend\n"));
    }

    #[test]
    fn dry_run_calls_no_adapter() {
        let mut filesystem = MockFilesystem::new();
        filesystem.expect_exists().times(0);
        filesystem.expect_create_dir_all().times(0);
        filesystem.expect_write_file().times(0);
        filesystem.expect_read_file().times(0);
        filesystem.expect_real_path().times(0);
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(0);
        let mut commands = MockCommandRunner::new();
        commands.expect_run().times(0);

        let pipeline = Pipeline::new()
            .write("Gemfile", "x", WriteMode::Create)
            .unwrap()
            .fetch("https://example.com/a.yml", "a.yml")
            .unwrap()
            .run(["bundle", "install"])
            .unwrap();

        let report = PipelineRunner::new(Box::new(filesystem), Box::new(fetcher), Box::new(commands))
            .dry_run(true)
            .execute(Path::new("/p"), &pipeline)
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.count(|o| *o == StepOutcome::Planned), 3);
    }

    #[test]
    fn observer_sees_every_step() {
        let fs = Arc::new(FakeFs::default());
        let mut commands = MockCommandRunner::new();
        commands.expect_run().returning(|_, _| Ok(exited(0)));

        let pipeline = Pipeline::new()
            .write("a", "1", WriteMode::Overwrite)
            .unwrap()
            .run(["true"])
            .unwrap();

        let mut started = Vec::new();
        let mut finished = Vec::new();
        runner_with(fs, commands)
            .execute_with(Path::new("/p"), &pipeline, &mut |event| match event {
                StepEvent::Started { index, total, .. } => started.push((index, total)),
                StepEvent::Finished(record) => finished.push(record.outcome.clone()),
            })
            .unwrap();

        assert_eq!(started, vec![(1, 2), (2, 2)]);
        assert_eq!(
            finished,
            vec![StepOutcome::Created, StepOutcome::Ran { exit_code: 0 }]
        );
    }

    #[test]
    fn empty_pipeline_only_creates_root() {
        let fs = Arc::new(FakeFs::default());
        let report = runner_with(fs.clone(), MockCommandRunner::new())
            .execute(Path::new("/new/project"), &Pipeline::new())
            .unwrap();

        assert!(report.steps.is_empty());
        assert!(fs.has_dir("/new/project"));
        assert_eq!(fs.writes(), 0);
    }
}
