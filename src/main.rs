mod config;
mod context;
mod event;
mod filter;
mod handler;
mod helper;
mod llm;
mod logging;
mod plugin;
mod prompt;
mod settings;
mod volatile_state;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let settings = crate::settings::SettingsStore::load().await?;
    let filter = crate::filter::WordFilter::load(cfg.word_list_path()?.as_deref()).await;
    let vstate = crate::volatile_state::VolatileState::new();
    let handler = handler::Handler::new(cfg, settings, vstate, filter);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
