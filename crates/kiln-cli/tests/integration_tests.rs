//! Integration tests for the `kiln` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `kiln` with an isolated config home and no inherited log filter.
fn kiln(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("HOME", home.path())
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR");
    cmd
}

fn write_recipe(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("recipe.toml");
    fs::write(&path, body).unwrap();
    path
}

const SERVICE_RECIPE: &str = r#"
[recipe]
name = "service"
description = "tiny service"

[vars]
PORT = "8080"

[[steps]]
kind = "write"
path = "config/app.conf"
content = "name = {{PROJECT_NAME}}\nlisten = {{PORT}}\n"
mode = "create"

[[steps]]
kind = "inject"
path = "config/app.conf"
anchor = "listen ="
position = "before"
content = "host = 0.0.0.0\n"
unique = true

[[steps]]
kind = "run"
argv = ["sh", "-c", "echo {{PROJECT_NAME}} > ran.txt"]
"#;

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    kiln(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn version_flag() {
    let home = TempDir::new().unwrap();
    kiln(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn list_shows_builtin_recipe() {
    let home = TempDir::new().unwrap();
    kiln(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available Recipes"))
        .stdout(predicate::str::contains("rails-api"));
}

#[test]
fn list_json_is_parseable() {
    let home = TempDir::new().unwrap();
    let output = kiln(&home)
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let recipes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = recipes
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&"rails-api"));
}

#[test]
fn list_includes_user_recipes() {
    let home = TempDir::new().unwrap();
    let recipes = home.path().join("config/kiln/recipes");
    fs::create_dir_all(&recipes).unwrap();
    fs::write(recipes.join("service.toml"), SERVICE_RECIPE).unwrap();

    kiln(&home)
        .args(["list", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("service"))
        .stdout(predicate::str::contains("rails-api"));
}

#[test]
fn show_prints_steps_and_variables() {
    let home = TempDir::new().unwrap();
    kiln(&home)
        .args(["show", "rails-api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Required: RUBY_VERSION"))
        .stdout(predicate::str::contains("run `bundle install --without production`"))
        .stdout(predicate::str::contains("inject into config/application.rb"));
}

#[test]
fn apply_file_recipe_writes_injects_and_runs() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let recipe = write_recipe(work.path(), SERVICE_RECIPE);
    let root = work.path().join("billing");

    kiln(&home)
        .arg("apply")
        .arg(&root)
        .arg("--file")
        .arg(&recipe)
        .args(["--var", "PORT=9000", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied service"));

    assert_eq!(
        fs::read_to_string(root.join("config/app.conf")).unwrap(),
        "name = billing\nhost = 0.0.0.0\nlisten = 9000\n"
    );
    assert_eq!(fs::read_to_string(root.join("ran.txt")).unwrap(), "billing\n");
}

#[test]
fn apply_json_report() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let recipe = write_recipe(work.path(), SERVICE_RECIPE);
    let root = work.path().join("billing");

    let output = kiln(&home)
        .args(["--output-format", "json", "apply"])
        .arg(&root)
        .arg("--file")
        .arg(&recipe)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["recipe"], "service");
    assert_eq!(summary["project"], "billing");
    let steps = summary["report"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0]["outcome"], "created");
    assert_eq!(steps[1]["outcome"], "injected");
    assert_eq!(steps[2]["exit_code"], 0);
}

#[test]
fn dry_run_changes_nothing() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let recipe = write_recipe(work.path(), SERVICE_RECIPE);
    let root = work.path().join("billing");

    kiln(&home)
        .arg("apply")
        .arg(&root)
        .arg("--file")
        .arg(&recipe)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: service"))
        .stdout(predicate::str::contains("write config/app.conf (create)"))
        .stdout(predicate::str::contains("[planned]"));

    assert!(!root.exists());
}

#[test]
fn builtin_dry_run_keeps_placeholders_visible() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let root = work.path().join("shop");

    kiln(&home)
        .arg("apply")
        .arg(&root)
        .args(["--recipe", "rails-api", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unresolved variables: RUBY_VERSION"))
        .stdout(predicate::str::contains("fetch https://raw.github.com"));

    assert!(!root.exists());
}

#[test]
fn completions_mention_binary() {
    let home = TempDir::new().unwrap();
    kiln(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kiln"));
}

#[test]
fn init_writes_config_once() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config/kiln/config.toml");

    kiln(&home)
        .args(["init", "--with-example"])
        .assert()
        .success();
    assert!(config.is_file());
    assert!(home.path().join("config/kiln/recipes/readme.toml").is_file());

    kiln(&home)
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    kiln(&home).args(["init", "--force"]).assert().success();

    kiln(&home)
        .args(["list", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("readme"));
}

#[test]
fn init_example_recipe_is_loadable() {
    let home = TempDir::new().unwrap();

    kiln(&home)
        .args(["init", "--with-example"])
        .assert()
        .success();

    kiln(&home)
        .args(["show", "readme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("write README.md (create-if-absent)"))
        .stdout(predicate::str::contains("inject into README.md before 'Maintained by'"))
        .stdout(predicate::str::contains("run `git init --quiet`"));
}

#[test]
fn config_get_and_path() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("custom.toml");
    fs::write(&file, "[commands]\ntimeout_secs = 45\n").unwrap();

    kiln(&home)
        .arg("--config")
        .arg(&file)
        .args(["config", "get", "commands.timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("45\n"));

    kiln(&home)
        .arg("--config")
        .arg(&file)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));

    kiln(&home)
        .env("KILN_NETWORK__TIMEOUT_SECS", "7")
        .args(["config", "get", "network.timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));
}
