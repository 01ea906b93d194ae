//! Configuration loading and management.
//!
//! ## Environment Variables
//! - `TASK_BOT_TOKEN` - Chat transport credential
//! - `TASK_BOT_DB_PATH` - Database path (`:memory:` for an in-memory store)
//! - `LLM_API_KEY` - Text-completion API key
//! - `LLM_API_URL` - Text-completion endpoint
//! - `LLM_MODEL` - Text-completion model name

use crate::db::IN_MEMORY;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "task-chat-bot.yaml";

/// Placeholder replaced by the user's message in the prompt template.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Bot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Chat transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Opaque transport credential.
    #[serde(default)]
    pub token: Option<String>,

    /// Reply to `/start`.
    #[serde(default = "default_welcome")]
    pub welcome: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            welcome: default_welcome(),
        }
    }
}

fn default_welcome() -> String {
    "Welcome to the Task Bot! Send a task description or use /list to see tasks.".to_string()
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".task-chat-bot/tasks.db")
}

/// Which text-completion function to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionProvider {
    /// Remote chat-completion endpoint.
    #[default]
    Http,
    /// Fixed list of canned responses.
    Scripted,
}

/// Text-completion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub provider: CompletionProvider,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Instruction sent to the completion function; must contain `{input}`.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Responses replayed by the scripted provider.
    #[serde(default)]
    pub responses: Vec<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: CompletionProvider::default(),
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            prompt_template: default_prompt_template(),
            responses: Vec::new(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_max_tokens() -> u32 {
    256
}

fn default_prompt_template() -> String {
    r#"Analyze the user input and determine the action (create, read, update, delete, list) and relevant details.
Reply with one JSON object and nothing else:
{"action": "<create|read|update|delete|list>", "id": <task id or null>, "description": "<task text or null>"}
- create needs description
- read and delete need id
- update needs id and may carry a new description
- list needs neither

User input: {input}"#
        .to_string()
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from an explicit path, else the default file if present, else defaults.
    /// Environment overrides are applied on top.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = var("TASK_BOT_TOKEN") {
            self.bot.token = Some(token);
        }
        if let Some(db_path) = var("TASK_BOT_DB_PATH") {
            self.store.db_path = PathBuf::from(db_path);
        }
        if let Some(key) = var("LLM_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(url) = var("LLM_API_URL") {
            self.completion.api_url = url;
        }
        if let Some(model) = var("LLM_MODEL") {
            self.completion.model = model;
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.completion.prompt_template.contains(INPUT_PLACEHOLDER) {
            bail!("completion.prompt_template must contain {}", INPUT_PLACEHOLDER);
        }
        if self.completion.provider == CompletionProvider::Scripted
            && self.completion.responses.is_empty()
        {
            bail!("completion.responses must not be empty for the scripted provider");
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if self.store.db_path == Path::new(IN_MEMORY) {
            return Ok(());
        }
        if let Some(parent) = self.store.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.completion.provider, CompletionProvider::Http);
        assert!(config.bot.welcome.starts_with("Welcome to the Task Bot!"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bot.yaml");
        std::fs::write(
            &path,
            "store:\n  db_path: \":memory:\"\ncompletion:\n  provider: scripted\n  responses:\n    - 'Action: list'\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.db_path, PathBuf::from(":memory:"));
        assert_eq!(config.completion.provider, CompletionProvider::Scripted);
        assert_eq!(config.completion.responses, vec!["Action: list"]);
        assert_eq!(config.completion.model, default_model());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("TASK_BOT_TOKEN", "123:abc"),
            ("TASK_BOT_DB_PATH", "/tmp/tasks.db"),
            ("LLM_MODEL", "deepseek-chat"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.bot.token.as_deref(), Some("123:abc"));
        assert_eq!(config.store.db_path, PathBuf::from("/tmp/tasks.db"));
        assert_eq!(config.completion.model, "deepseek-chat");
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let mut config = Config::default();
        config.completion.prompt_template = "What should I do?".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn scripted_provider_needs_responses() {
        let mut config = Config::default();
        config.completion.provider = CompletionProvider::Scripted;
        assert!(config.validate().is_err());
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.db_path = temp.path().join("nested/dir/tasks.db");

        config.ensure_db_dir().unwrap();
        assert!(temp.path().join("nested/dir").is_dir());
    }
}
