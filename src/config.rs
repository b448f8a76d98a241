use crate::settings::Settings;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_DIR_REL_HOME: &str = ".config/gloombot";

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    pub history: History,
    pub llm: Llm,
    /// Process-wide defaults for the per-guild/per-channel settings store
    pub defaults: Settings,
    #[serde(default)]
    pub filter: Filter,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    pub command_prefix: String,
    /// Name the bot answers to in plain chat text, in addition to explicit
    /// mentions.  Falls back to the Discord display name when unset.
    pub bot_name: Option<String>,
    /// How long an interactive settings update waits for the user's value
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_seconds: u64,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct History {
    /// How many recent messages go into an autoreply prompt
    #[serde(default = "default_prompt_message_count")]
    pub prompt_message_count: u8,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct Llm {
    pub completion_url: String,
    pub api_key: String,
    /// Token budget for replies built from channel history
    #[serde(default = "default_reply_max_tokens")]
    pub reply_max_tokens: u32,
    /// Default token budget for the `complete` command
    #[serde(default = "default_manual_max_tokens")]
    pub manual_max_tokens: u32,
}

#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct Filter {
    /// Plain-text prohibited word list, one word per line.  Relative paths
    /// resolve against the config directory.
    pub word_list: Option<PathBuf>,
}

fn default_reply_timeout() -> u64 {
    60
}

fn default_prompt_message_count() -> u8 {
    10
}

fn default_reply_max_tokens() -> u32 {
    300
}

fn default_manual_max_tokens() -> u32 {
    100
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_DIR_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(config)
    }

    /// Absolute path of the prohibited word list, if one is configured
    pub fn word_list_path(&self) -> Result<Option<PathBuf>> {
        let Some(path) = &self.filter.word_list else {
            return Ok(None);
        };

        if path.is_absolute() {
            Ok(Some(path.clone()))
        } else {
            Ok(Some(Self::config_dir()?.join(path)))
        }
    }
}
