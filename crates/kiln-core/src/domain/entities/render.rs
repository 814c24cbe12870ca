//! `{{VAR}}` substitution for recipe content.

use std::collections::BTreeMap;

use chrono::Datelike;

/// Context for rendering recipe content.
///
/// A **Value Object** holding every variable a recipe may reference.
/// Immutable after creation; `with_variable` returns a new instance.
///
/// ## Built-in Variables
///
/// | Variable | Example | Source |
/// |----------|---------|--------|
/// | `PROJECT_NAME` | "My Api" | Project root directory name |
/// | `PROJECT_NAME_SNAKE` | "my_api" | Computed |
/// | `PROJECT_NAME_KEBAB` | "my-api" | Computed |
/// | `PROJECT_NAME_PASCAL` | "MyApi" | Computed |
/// | `YEAR` | "2026" | System clock |
///
/// Recipe defaults and `--var` overrides are layered on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    project_name: String,
    variables: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new(project_name: impl Into<String>) -> Self {
        let name = project_name.into();
        let words = split_words(&name);

        let mut variables = BTreeMap::new();
        variables.insert("PROJECT_NAME".to_string(), name.clone());
        variables.insert("PROJECT_NAME_SNAKE".to_string(), words.join("_"));
        variables.insert("PROJECT_NAME_KEBAB".to_string(), words.join("-"));
        variables.insert(
            "PROJECT_NAME_PASCAL".to_string(),
            words.iter().map(|w| capitalize(w)).collect(),
        );
        variables.insert("YEAR".to_string(), chrono::Local::now().year().to_string());

        Self {
            project_name: name,
            variables,
        }
    }

    /// Add or override a variable.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Add a variable only if it is not already set.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Replace every `{{KEY}}` whose key is defined.
    ///
    /// Unknown placeholders stay as written, and substituted values are never
    /// rescanned, so a value containing `{{X}}` is inserted literally.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = after[..end].trim();
                    match self.variables.get(key) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&rest[start..start + 2 + end + 2]),
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Names of all well-formed `{{NAME}}` placeholders in `text`.
    pub fn placeholders(text: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else { break };
            let key = after[..end].trim();
            if is_identifier(key) && !names.iter().any(|n| n == key) {
                names.push(key.to_string());
            }
            rest = &after[end + 2..];
        }
        names
    }
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split on `_`, `-`, whitespace, and lower-to-upper case transitions.
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in input.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
