use crate::{
    config::Config,
    filter::WordFilter,
    settings::{Settings, SettingsStore},
    volatile_state::VolatileState,
};
use serenity::all::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collection of data that is shared across events
pub struct Context<'a> {
    // Gloombot's own context types
    pub cfg: &'a RwLock<Config>,
    pub settings: &'a RwLock<SettingsStore>,
    pub vstate: &'a RwLock<VolatileState>,
    pub filter: &'a WordFilter,
    // Discord/Serenity context types
    pub cache: &'a Arc<serenity::all::Cache>,
    pub http: &'a Arc<serenity::all::Http>,
    pub cache_http: &'a CacheHttp,
}

/// Many Serenity functions take a `impl CacheHttp` in order to first check the cache if the item
/// is available and fall back to an http request otherwise.  The most readily available type that
/// impl's this is named very differently in a way that could be confusing, and so we alias it.
pub type CacheHttp = serenity::all::Context;

impl Context<'_> {
    /// Effective settings for a message's scope: channel over guild over
    /// process defaults.
    pub async fn effective_settings(
        &self,
        guild_id: Option<GuildId>,
        channel_id: Option<ChannelId>,
    ) -> Settings {
        let cfg = self.cfg.read().await;
        let store = self.settings.read().await;
        store.resolve(&cfg.defaults, guild_id, channel_id)
    }

    /// Name the bot answers to in plain chat text
    pub async fn bot_name(&self) -> String {
        if let Some(name) = &self.cfg.read().await.general.bot_name {
            return name.clone();
        }
        self.cache.current_user().display_name().to_owned()
    }

    /// Name used for the bot's transcript speaker cue
    pub fn bot_display_name(&self) -> String {
        self.cache.current_user().display_name().to_owned()
    }
}
