use crate::github::RepoRef;
use crate::github::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::github::label_history::DEFAULT_LABEL;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration keys enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Owner,
    Repo,
    Label,
    Output,
    ApiUrl,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Owner => "owner",
            ConfigKey::Repo => "repo",
            ConfigKey::Label => "label",
            ConfigKey::Output => "output",
            ConfigKey::ApiUrl => "api_url",
        }
    }

    /// Get all config keys
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::Owner,
            ConfigKey::Repo,
            ConfigKey::Label,
            ConfigKey::Output,
            ConfigKey::ApiUrl,
        ]
    }
}

/// Filename for the project-specific configuration within the .bugscan directory.
pub const PROJECT_CONFIG_FILENAME: &str = "config.json";
/// Directory name for project-specific configuration.
pub const PROJECT_CONFIG_DIR: &str = ".bugscan";

/// Default location of the project configuration, relative to the working directory.
pub fn default_config_path() -> PathBuf {
    Path::new(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILENAME)
}

/// Parses a JSON configuration file content into a map of configuration values.
///
/// - Returns the known keys of a JSON object; unknown keys are skipped.
/// - Returns an empty HashMap if `content` is empty or contains only whitespace.
/// - Returns an `Err` if the JSON is invalid or not an object.
pub fn parse_config(content: &[u8]) -> Result<HashMap<ConfigKey, Value>> {
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(HashMap::new());
    }

    let value: Value = serde_json::from_slice(content).context("Failed to parse config JSON")?;

    let mut config_map = HashMap::new();

    if let Value::Object(map) = &value {
        for key in ConfigKey::all() {
            if let Some(val) = map.get(key.as_str()) {
                config_map.insert(*key, val.clone());
            }
        }
        return Ok(config_map);
    }

    Err(anyhow::anyhow!("Config must be a JSON object"))
}

/// Reads and parses the configuration at `path`. A missing file is an empty config.
pub fn load_config(path: &Path) -> Result<HashMap<ConfigKey, Value>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return Ok(HashMap::new());
    }
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Merges `updates` into `base_config` and returns a new configuration map.
///
/// If a key exists in both, the value from `updates` wins.
pub fn update_config(
    base_config: &HashMap<ConfigKey, Value>,
    updates: &HashMap<ConfigKey, Value>,
) -> HashMap<ConfigKey, Value> {
    let mut new_config = base_config.clone();
    for (key, value) in updates {
        new_config.insert(*key, value.clone());
    }
    new_config
}

/// Builds an update map from optional string values, skipping the `None`s.
pub fn overrides<'a>(
    values: impl IntoIterator<Item = (ConfigKey, Option<&'a str>)>,
) -> HashMap<ConfigKey, Value> {
    values
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, Value::String(v.to_string()))))
        .collect()
}

fn string_value(config: &HashMap<ConfigKey, Value>, key: ConfigKey) -> Result<Option<String>> {
    match config.get(&key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(anyhow::anyhow!(
            "Config key `{}` must be a string, got {}",
            key.as_str(),
            other
        )),
    }
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub repo: RepoRef,
    pub token: String,
    pub label: String,
    pub output: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
}

impl Settings {
    /// Resolves settings from a merged config map.
    ///
    /// The token is checked first so a missing credential is reported before
    /// anything else.
    pub fn resolve(
        config: &HashMap<ConfigKey, Value>,
        token: Option<&str>,
        default_output: &str,
    ) -> Result<Self> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("GITHUB_TOKEN environment variable is not set."))?;

        let owner = string_value(config, ConfigKey::Owner)?.ok_or_else(|| {
            anyhow::anyhow!("Repository owner is not set. Use --owner or GITHUB_OWNER.")
        })?;
        let repo = string_value(config, ConfigKey::Repo)?.ok_or_else(|| {
            anyhow::anyhow!("Repository name is not set. Use --repo or GITHUB_REPO.")
        })?;

        Ok(Settings {
            repo: RepoRef::new(owner, repo),
            token: token.to_string(),
            label: string_value(config, ConfigKey::Label)?
                .unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            output: string_value(config, ConfigKey::Output)?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default_output)),
            api_url: string_value(config, ConfigKey::ApiUrl)?
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}
