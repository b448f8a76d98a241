use crate::{event::*, plugin::*, settings::SettingKey};
use anyhow::Result;
use serenity::all::{ChannelId, GuildId, Message};
use std::time::Duration;

/// `update_settings <setting> [channel_name]` - interactive two-step update
/// of one setting, guild-wide unless a channel name is given.
pub struct UpdateSettings;

#[serenity::async_trait]
impl Plugin for UpdateSettings {
    fn name(&self) -> &'static str {
        "update_settings"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} <setting> [channel_name] - update a setting ({})",
            prefix,
            self.name(),
            setting_names().join(", ")
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let Some(guild_id) = msg.guild_id else {
            msg.reply(ctx.cache_http, "Settings can only be updated in a server")
                .await?;
            return Ok(EventHandled::Yes);
        };

        let key = match args.first().copied().map(SettingKey::from_name) {
            Some(Some(key)) => key,
            _ => {
                msg.reply(
                    ctx.cache_http,
                    format!("Pick a setting to update: {}", setting_names().join(", ")),
                )
                .await?;
                return Ok(EventHandled::Yes);
            }
        };

        // Channel-scoped when a channel name is given, guild-wide otherwise
        let channel_id = match args.get(1) {
            None => None,
            Some(&channel_name) => {
                match find_channel_by_name(ctx, guild_id, channel_name).await? {
                    Some(channel_id) => Some(channel_id),
                    None => {
                        msg.reply(ctx.cache_http, format!("No channel named {}", channel_name))
                            .await?;
                        return Ok(EventHandled::Yes);
                    }
                }
            }
        };

        let current = ctx
            .effective_settings(Some(guild_id), channel_id)
            .await
            .get(key);
        msg.reply(
            ctx.cache_http,
            format!(
                "Enter a new value for {} (currently {})",
                key.name(),
                current
            ),
        )
        .await?;

        let reply = match wait_for_reply(ctx, msg).await {
            ReplyWait::Reply(reply) => reply,
            ReplyWait::TimedOut => {
                msg.reply(
                    ctx.cache_http,
                    format!("Timed out waiting for a value for {}", key.name()),
                )
                .await?;
                return Ok(EventHandled::Yes);
            }
            // A newer flow took over for this user; bow out quietly
            ReplyWait::Superseded => return Ok(EventHandled::Yes),
        };

        let value = match key.parse(&reply.content) {
            Ok(value) => value,
            Err(e) => {
                msg.reply(
                    ctx.cache_http,
                    format!(
                        "`{}` is not a valid value for {}: {}",
                        reply.content,
                        key.name(),
                        e
                    ),
                )
                .await?;
                return Ok(EventHandled::Yes);
            }
        };

        {
            let mut store = ctx.settings.write().await;
            match channel_id {
                Some(channel_id) => store.set_channel(guild_id, channel_id, value.clone()),
                None => store.set_guild(guild_id, value.clone()),
            }
            store.save().await?;
        }

        msg.reply(
            ctx.cache_http,
            format!("Updated {} to {}", key.name(), value),
        )
        .await?;
        Ok(EventHandled::Yes)
    }
}

fn setting_names() -> Vec<&'static str> {
    SettingKey::ALL.into_iter().map(SettingKey::name).collect()
}

async fn find_channel_by_name(
    ctx: &Context<'_>,
    guild_id: GuildId,
    channel_name: &str,
) -> Result<Option<ChannelId>> {
    let channels = guild_id.channels(ctx.cache_http).await?;
    Ok(channels
        .values()
        .find(|channel| channel.name == channel_name)
        .map(|channel| channel.id))
}

enum ReplyWait {
    Reply(Message),
    TimedOut,
    Superseded,
}

/// Wait for the invoking user's next message, bounded by the configured
/// timeout.
async fn wait_for_reply(ctx: &Context<'_>, msg: &Message) -> ReplyWait {
    let rx = ctx
        .vstate
        .write()
        .await
        .pending_replies
        .register(msg.author.id);
    let timeout = Duration::from_secs(ctx.cfg.read().await.general.reply_timeout_seconds);

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(reply)) => ReplyWait::Reply(reply),
        // Sender dropped: a newer flow for this user replaced ours
        Ok(Err(_)) => ReplyWait::Superseded,
        // Timed out; withdraw the wait so the user's next message is chat
        Err(_) => {
            ctx.vstate
                .write()
                .await
                .pending_replies
                .cancel(msg.author.id);
            ReplyWait::TimedOut
        }
    }
}
