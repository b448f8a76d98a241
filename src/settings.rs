//! Per-guild and per-channel model settings, persisted as a flat JSON file.
//!
//! Resolution is layered: a channel override wins over a guild override,
//! which wins over the process defaults from the config file.

use crate::config::Config;
use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, GuildId};
use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

/// Effective sampling parameters for one guild/channel
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    pub engine: String,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    /// Chance in [0, 1] of replying to a message that doesn't address the bot
    pub autoreply_probability: f64,
}

/// Sparse override for one scope; unset fields fall through to the next layer
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoreply_probability: Option<f64>,
}

impl SettingsPatch {
    fn overlay(&self, base: &mut Settings) {
        if let Some(engine) = &self.engine {
            base.engine = engine.clone();
        }
        if let Some(temperature) = self.temperature {
            base.temperature = temperature;
        }
        if let Some(presence_penalty) = self.presence_penalty {
            base.presence_penalty = presence_penalty;
        }
        if let Some(frequency_penalty) = self.frequency_penalty {
            base.frequency_penalty = frequency_penalty;
        }
        if let Some(autoreply_probability) = self.autoreply_probability {
            base.autoreply_probability = autoreply_probability;
        }
    }

    fn set(&mut self, value: SettingValue) {
        match value {
            SettingValue::Engine(v) => self.engine = Some(v),
            SettingValue::Temperature(v) => self.temperature = Some(v),
            SettingValue::PresencePenalty(v) => self.presence_penalty = Some(v),
            SettingValue::FrequencyPenalty(v) => self.frequency_penalty = Some(v),
            SettingValue::AutoreplyProbability(v) => self.autoreply_probability = Some(v),
        }
    }
}

/// The closed set of user-adjustable settings.  Each key knows its name and
/// how to parse and validate free-text input into its value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKey {
    Engine,
    Temperature,
    PresencePenalty,
    FrequencyPenalty,
    AutoreplyProbability,
}

/// A parsed, validated value for one setting
#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    Engine(String),
    Temperature(f32),
    PresencePenalty(f32),
    FrequencyPenalty(f32),
    AutoreplyProbability(f64),
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::Engine,
        SettingKey::Temperature,
        SettingKey::PresencePenalty,
        SettingKey::FrequencyPenalty,
        SettingKey::AutoreplyProbability,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingKey::Engine => "engine",
            SettingKey::Temperature => "temperature",
            SettingKey::PresencePenalty => "presence_penalty",
            SettingKey::FrequencyPenalty => "frequency_penalty",
            SettingKey::AutoreplyProbability => "autoreply_probability",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    pub fn parse(self, input: &str) -> Result<SettingValue> {
        let input = input.trim();
        match self {
            SettingKey::Engine => {
                if input.is_empty() {
                    Err(anyhow!("engine name must not be empty"))
                } else {
                    Ok(SettingValue::Engine(input.to_owned()))
                }
            }
            SettingKey::Temperature => input
                .parse()
                .map(SettingValue::Temperature)
                .map_err(|_| anyhow!("not a number")),
            SettingKey::PresencePenalty => input
                .parse()
                .map(SettingValue::PresencePenalty)
                .map_err(|_| anyhow!("not a number")),
            SettingKey::FrequencyPenalty => input
                .parse()
                .map(SettingValue::FrequencyPenalty)
                .map_err(|_| anyhow!("not a number")),
            SettingKey::AutoreplyProbability => {
                let p: f64 = input.parse().map_err(|_| anyhow!("not a number"))?;
                if (0.0..=1.0).contains(&p) {
                    Ok(SettingValue::AutoreplyProbability(p))
                } else {
                    Err(anyhow!("must be between 0.0 and 1.0"))
                }
            }
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SettingValue::Engine(v) => write!(f, "{}", v),
            SettingValue::Temperature(v) => write!(f, "{}", v),
            SettingValue::PresencePenalty(v) => write!(f, "{}", v),
            SettingValue::FrequencyPenalty(v) => write!(f, "{}", v),
            SettingValue::AutoreplyProbability(v) => write!(f, "{}", v),
        }
    }
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Engine => SettingValue::Engine(self.engine.clone()),
            SettingKey::Temperature => SettingValue::Temperature(self.temperature),
            SettingKey::PresencePenalty => SettingValue::PresencePenalty(self.presence_penalty),
            SettingKey::FrequencyPenalty => SettingValue::FrequencyPenalty(self.frequency_penalty),
            SettingKey::AutoreplyProbability => {
                SettingValue::AutoreplyProbability(self.autoreply_probability)
            }
        }
    }
}

/// Guild-keyed overrides, with nested channel overrides
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct GuildScope {
    #[serde(default)]
    pub overrides: SettingsPatch,
    #[serde(default)]
    pub channels: HashMap<String, SettingsPatch>,
}

/// File-backed override store.  JSON map keys are id strings, so this stays
/// a flat, human-editable key-value file.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SettingsStore {
    #[serde(default)]
    guilds: HashMap<String, GuildScope>,
}

impl SettingsStore {
    fn store_path() -> Result<PathBuf> {
        Ok(Config::config_dir()?.join("settings.json"))
    }

    /// Load the store.  A missing file is a fresh install, not an error.
    pub async fn load() -> Result<Self> {
        let path = Self::store_path()?;

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(anyhow!(
                    "Could not read settings at `{}`: {}",
                    path.to_string_lossy(),
                    e
                ))
            }
        };

        serde_json::from_slice(&data).map_err(|e| {
            anyhow!(
                "Could not parse settings at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }

    pub async fn save(&self) -> Result<()> {
        let path = Self::store_path()?;
        let store_str = serde_json::to_string_pretty(&self)
            .map_err(|e| anyhow!("Could not serialize settings: {}", e))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        // Write to a temporary file in the same directory, then atomically
        // rename over the target.
        let tmp_path = path.with_extension("json.new");

        tokio::fs::write(&tmp_path, store_str).await.map_err(|e| {
            anyhow!(
                "Could not write settings to temporary file `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;

        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            anyhow!(
                "Could not rename temporary file `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }

    /// Effective settings for a channel: channel over guild over defaults
    pub fn resolve(
        &self,
        defaults: &Settings,
        guild_id: Option<GuildId>,
        channel_id: Option<ChannelId>,
    ) -> Settings {
        let mut settings = defaults.clone();

        let Some(guild_id) = guild_id else {
            // Direct messages have no override scope
            return settings;
        };

        let Some(guild) = self.guilds.get(&guild_id.to_string()) else {
            return settings;
        };

        guild.overrides.overlay(&mut settings);

        if let Some(channel_id) = channel_id {
            if let Some(patch) = guild.channels.get(&channel_id.to_string()) {
                patch.overlay(&mut settings);
            }
        }

        settings
    }

    pub fn set_guild(&mut self, guild_id: GuildId, value: SettingValue) {
        self.guilds
            .entry(guild_id.to_string())
            .or_default()
            .overrides
            .set(value);
    }

    pub fn set_channel(&mut self, guild_id: GuildId, channel_id: ChannelId, value: SettingValue) {
        self.guilds
            .entry(guild_id.to_string())
            .or_default()
            .channels
            .entry(channel_id.to_string())
            .or_default()
            .set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Settings {
        Settings {
            engine: "davinci".to_string(),
            temperature: 1.0,
            presence_penalty: 0.5,
            frequency_penalty: 0.2,
            autoreply_probability: 0.01,
        }
    }

    #[test]
    fn resolve_falls_back_to_defaults() {
        let store = SettingsStore::default();
        let settings = store.resolve(
            &defaults(),
            Some(GuildId::new(1)),
            Some(ChannelId::new(10)),
        );
        assert_eq!(settings, defaults());
    }

    #[test]
    fn channel_override_wins_over_guild() {
        let mut store = SettingsStore::default();
        let guild = GuildId::new(1);
        let channel = ChannelId::new(10);

        store.set_guild(guild, SettingValue::Temperature(0.5));
        store.set_channel(guild, channel, SettingValue::Temperature(0.2));

        let in_channel = store.resolve(&defaults(), Some(guild), Some(channel));
        assert_eq!(in_channel.temperature, 0.2);

        // A sibling channel only sees the guild override
        let elsewhere = store.resolve(&defaults(), Some(guild), Some(ChannelId::new(11)));
        assert_eq!(elsewhere.temperature, 0.5);
    }

    #[test]
    fn update_leaves_other_scopes_untouched() {
        let mut store = SettingsStore::default();
        let guild = GuildId::new(1);
        let other_guild = GuildId::new(2);

        store.set_guild(guild, SettingValue::Engine("curie".to_string()));

        let updated = store.resolve(&defaults(), Some(guild), None);
        assert_eq!(updated.engine, "curie");

        let untouched = store.resolve(&defaults(), Some(other_guild), None);
        assert_eq!(untouched.engine, "davinci");

        // Unrelated fields in the updated scope still fall through
        assert_eq!(updated.autoreply_probability, 0.01);
    }

    #[test]
    fn direct_messages_resolve_to_defaults() {
        let mut store = SettingsStore::default();
        store.set_guild(GuildId::new(1), SettingValue::Temperature(0.0));
        let settings = store.resolve(&defaults(), None, None);
        assert_eq!(settings, defaults());
    }

    #[test]
    fn parse_typed_values() {
        assert_eq!(
            SettingKey::Temperature.parse("0.7").unwrap(),
            SettingValue::Temperature(0.7)
        );
        assert_eq!(
            SettingKey::Engine.parse(" curie ").unwrap(),
            SettingValue::Engine("curie".to_string())
        );
        assert_eq!(
            SettingKey::AutoreplyProbability.parse("1.0").unwrap(),
            SettingValue::AutoreplyProbability(1.0)
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(SettingKey::Temperature.parse("warm").is_err());
        assert!(SettingKey::AutoreplyProbability.parse("1.5").is_err());
        assert!(SettingKey::AutoreplyProbability.parse("-0.1").is_err());
        assert!(SettingKey::Engine.parse("  ").is_err());
    }

    #[test]
    fn key_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(SettingKey::from_name(key.name()), Some(key));
        }
        assert_eq!(SettingKey::from_name("no_such_setting"), None);
    }
}
