use crate::domain::Persona;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_INPUT_CHARS: usize = 30_000;
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Application configuration, stored as JSON under the user config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    /// Pins the model and skips the model listing call.
    pub model: Option<String>,
    pub api_base: String,
    pub persona: Persona,
    pub max_input_chars: usize,
    /// `None` waits on the provider indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub chat_history_turns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            api_base: DEFAULT_API_BASE.to_string(),
            persona: Persona::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            request_timeout_secs: None,
            chat_history_turns: 6,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Missing file gives defaults; an unreadable JSON file is set aside and defaults are used.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {:?}", path))?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config file invalid, using defaults");
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("unable to create config directory {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("unable to write config file {:?}", path))?;
        Ok(())
    }

    /// Direct entry wins over the environment, which wins over the config file.
    pub fn resolve_api_key(&self, direct: Option<&str>) -> Option<ApiKey> {
        self.resolve_api_key_with(direct, |name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with<F>(&self, direct: Option<&str>, env: F) -> Option<ApiKey>
    where
        F: Fn(&str) -> Option<String>,
    {
        direct
            .map(str::to_string)
            .into_iter()
            .chain(API_KEY_ENV_VARS.iter().filter_map(|name| env(*name)))
            .chain(self.api_key.clone())
            .find_map(ApiKey::new)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidgraph")
        .join("config.json")
}

/// Provider credential. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Blank keys are treated as absent.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(4).collect();
        write!(f, "ApiKey({}…)", visible)
    }
}
