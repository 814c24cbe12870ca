//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `KILN_*` environment variables, `__` separating sections
//!    (`KILN_COMMANDS__TIMEOUT_SECS=600`)
//! 3. The TOML file at [`AppConfig::config_path`] or `--config`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use kiln_adapters::{fetcher, process::DEFAULT_KEEP_ENV};

const ENV_PREFIX: &str = "KILN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub commands: CommandConfig,
    pub recipes: RecipeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: fetcher::DEFAULT_TIMEOUT_SECS,
            user_agent: fetcher::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Per-command limit; `0` waits forever.
    pub timeout_secs: u64,
    /// Variables kept when a step asks for a clean environment.
    pub keep_env: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            keep_env: DEFAULT_KEEP_ENV.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeConfig {
    /// Directory scanned for `*.toml` recipes.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// `auto`, `human`, `plain` or `json`.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment on top of the defaults.
    ///
    /// An explicit `--config` file must exist; the default location is
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        Self::build(&path, required, environment())
    }

    fn build(path: &Path, required: bool, env: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(required),
            )
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("invalid configuration value")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs`, falling back to `.kiln.toml` in the
    /// current directory.
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".kiln.toml"))
    }

    /// Where recipes live when `recipes.dir` is unset.
    pub fn default_recipe_dir() -> PathBuf {
        project_dirs()
            .map(|d| d.config_dir().join("recipes"))
            .unwrap_or_else(|| PathBuf::from(".kiln-recipes"))
    }

    pub fn recipe_dir(&self) -> PathBuf {
        self.recipes
            .dir
            .clone()
            .unwrap_or_else(Self::default_recipe_dir)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.commands.timeout_secs > 0).then(|| Duration::from_secs(self.commands.timeout_secs))
    }

    /// Look up a dotted key such as `network.timeout_secs`.
    ///
    /// `recipes.dir` reports the effective directory even when unset.
    pub fn get(&self, key: &str) -> Option<String> {
        if key == "recipes.dir" {
            return Some(self.recipe_dir().display().to_string());
        }

        let mut value = toml::Value::try_from(self).ok()?;
        for part in key.split('.') {
            value = value.get(part)?.clone();
        }
        Some(match value {
            toml::Value::String(s) => s,
            toml::Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(","),
            other => other.to_string(),
        })
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "kiln", "kiln")
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("commands.keep_env")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env_from(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let cfg = AppConfig::build(&temp.path().join("missing.toml"), false, env_from(&[])).unwrap();

        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.network.timeout_secs, 30);
        assert_eq!(cfg.command_timeout(), None);
        assert!(cfg.commands.keep_env.iter().any(|k| k == "PATH"));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::build(&temp.path().join("missing.toml"), true, env_from(&[])).is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[commands]\ntimeout_secs = 90\n\n[recipes]\ndir = \"/srv/recipes\"\n",
        )
        .unwrap();

        let cfg = AppConfig::build(&path, true, env_from(&[])).unwrap();
        assert_eq!(cfg.command_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(cfg.recipe_dir(), PathBuf::from("/srv/recipes"));
        assert_eq!(cfg.network, NetworkConfig::default());
    }

    #[test]
    fn environment_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[network]\ntimeout_secs = 5\n").unwrap();

        let cfg = AppConfig::build(
            &path,
            true,
            env_from(&[
                ("KILN_NETWORK__TIMEOUT_SECS", "12"),
                ("KILN_COMMANDS__KEEP_ENV", "PATH,GEM_HOME"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.network_timeout(), Duration::from_secs(12));
        assert_eq!(cfg.commands.keep_env, vec!["PATH", "GEM_HOME"]);
    }

    #[test]
    fn malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[network\ntimeout_secs = ").unwrap();
        assert!(AppConfig::build(&path, true, env_from(&[])).is_err());
    }

    #[test]
    fn get_dotted_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("network.timeout_secs").as_deref(), Some("30"));
        assert_eq!(cfg.get("output.format").as_deref(), Some("auto"));
        assert_eq!(cfg.get("output.no_color").as_deref(), Some("false"));
        assert!(cfg.get("commands.keep_env").unwrap().starts_with("PATH,"));
        assert!(cfg.get("recipes.dir").is_some());
        assert_eq!(cfg.get("does.not.exist"), None);
    }

    #[test]
    fn config_path_is_not_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
