use crate::{
    config::Config, context::Context, event::Event, filter::WordFilter, settings::SettingsStore,
    volatile_state::VolatileState,
};
use serenity::all::{Message, Ready};
use tokio::sync::RwLock;

/// Discord event handler
pub struct Handler {
    cfg: RwLock<Config>,
    settings: RwLock<SettingsStore>,
    vstate: RwLock<VolatileState>,
    filter: WordFilter,
}

impl<'a> Handler {
    pub fn new(
        cfg: Config,
        settings: SettingsStore,
        vstate: VolatileState,
        filter: WordFilter,
    ) -> Self {
        Self {
            cfg: RwLock::new(cfg),
            settings: RwLock::new(settings),
            vstate: RwLock::new(vstate),
            filter,
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            settings: &self.settings,
            vstate: &self.vstate,
            filter: &self.filter,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }
}
