//! Step value objects.
//!
//! Each step is a transient, immutable description of one side effect. The
//! pipeline interpreter consumes them in order; nothing here performs I/O.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::domain::{
    Anchor, DomainError, Position, RelativePath, RenderContext, WriteMode,
};

// ============================================================================
// TemplateAction
// ============================================================================

/// Write fully-rendered `content` to `path` under `mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAction {
    pub path: RelativePath,
    pub content: String,
    pub mode: WriteMode,
}

impl TemplateAction {
    pub fn new(path: RelativePath, content: impl Into<String>, mode: WriteMode) -> Self {
        Self {
            path,
            content: content.into(),
            mode,
        }
    }
}

// ============================================================================
// InjectionSpec
// ============================================================================

/// Insert `content` next to the line containing `anchor` in `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionSpec {
    pub path: RelativePath,
    pub anchor: Anchor,
    pub position: Position,
    pub content: String,
    pub require_unique: bool,
}

impl InjectionSpec {
    pub fn new(
        path: RelativePath,
        anchor: Anchor,
        position: Position,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidStep(format!(
                "injection into {path} has no content"
            )));
        }
        Ok(Self {
            path,
            anchor,
            position,
            content,
            require_unique: false,
        })
    }

    /// Fail instead of taking the first match when the anchor is ambiguous.
    pub fn unique(mut self) -> Self {
        self.require_unique = true;
        self
    }
}

// ============================================================================
// FetchSpec
// ============================================================================

/// Download `url` and write the body to `path` (always overwriting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    pub url: String,
    pub path: RelativePath,
}

impl FetchSpec {
    pub fn new(url: impl Into<String>, path: RelativePath) -> Result<Self, DomainError> {
        let url = url.into();
        let scheme_ok = url.starts_with("https://") || url.starts_with("http://");
        if !scheme_ok {
            return Err(DomainError::InvalidUrl {
                url,
                reason: "only http and https URLs can be fetched".into(),
            });
        }
        Ok(Self { url, path })
    }
}

// ============================================================================
// CommandSpec
// ============================================================================

/// An external process invocation.
///
/// The environment is explicit: `env` holds overrides and `clean_env` decides
/// whether the ambient environment is inherited at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    /// Working directory relative to the project root; `None` means the root.
    pub working_dir: Option<RelativePath>,
    pub env: BTreeMap<String, String>,
    pub clean_env: bool,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(DomainError::EmptyCommand);
        }
        Ok(Self {
            argv,
            working_dir: None,
            env: BTreeMap::new(),
            clean_env: false,
            timeout: None,
        })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn in_dir(mut self, dir: RelativePath) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Run outside any enclosing environment-manager shim.
    pub fn clean(mut self) -> Self {
        self.clean_env = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Space-joined argv, for logs and error messages.
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// What a finished process reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

// ============================================================================
// Step
// ============================================================================

/// One instruction of a scaffold pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    WriteFile(TemplateAction),
    Inject(InjectionSpec),
    Fetch(FetchSpec),
    RunCommand(CommandSpec),
}

/// Discriminant of [`Step`], used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Write,
    Inject,
    Fetch,
    Run,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::WriteFile(_) => StepKind::Write,
            Self::Inject(_) => StepKind::Inject,
            Self::Fetch(_) => StepKind::Fetch,
            Self::RunCommand(_) => StepKind::Run,
        }
    }

    /// Substitute `{{VAR}}` placeholders in content, argv and env values.
    ///
    /// Paths, anchors and URLs are left alone so they are exactly what was
    /// validated when the step was built.
    pub fn render(&self, ctx: &RenderContext) -> Step {
        match self {
            Self::WriteFile(action) => Self::WriteFile(TemplateAction {
                content: ctx.render(&action.content),
                ..action.clone()
            }),
            Self::Inject(spec) => Self::Inject(InjectionSpec {
                content: ctx.render(&spec.content),
                ..spec.clone()
            }),
            Self::Fetch(spec) => Self::Fetch(spec.clone()),
            Self::RunCommand(spec) => Self::RunCommand(CommandSpec {
                argv: spec.argv.iter().map(|a| ctx.render(a)).collect(),
                env: spec
                    .env
                    .iter()
                    .map(|(k, v)| (k.clone(), ctx.render(v)))
                    .collect(),
                ..spec.clone()
            }),
        }
    }

    /// Every `{{VAR}}` name referenced by this step.
    pub fn placeholders(&self) -> Vec<String> {
        match self {
            Self::WriteFile(action) => RenderContext::placeholders(&action.content),
            Self::Inject(spec) => RenderContext::placeholders(&spec.content),
            Self::Fetch(_) => Vec::new(),
            Self::RunCommand(spec) => spec
                .argv
                .iter()
                .chain(spec.env.values())
                .flat_map(|s| RenderContext::placeholders(s))
                .collect(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFile(a) => write!(f, "write {} ({})", a.path, a.mode),
            Self::Inject(s) => write!(
                f,
                "inject into {} {} '{}'",
                s.path, s.position, s.anchor
            ),
            Self::Fetch(s) => write!(f, "fetch {} -> {}", s.url, s.path),
            Self::RunCommand(c) => write!(f, "run `{}`", c.display()),
        }
    }
}
