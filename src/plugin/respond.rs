use crate::{event::*, llm, plugin::*};
use anyhow::Result;

/// `respond [n_messages]` - generate one reply from recent channel history
pub struct Respond;

#[serenity::async_trait]
impl Plugin for Respond {
    fn name(&self) -> &'static str {
        "respond"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} [n_messages] - reply based on the last n messages (default 10)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let n_messages = match args.first() {
            None => ctx.cfg.read().await.history.prompt_message_count,
            Some(arg) => match arg.parse() {
                Ok(n) => n,
                Err(_) => {
                    msg.reply(
                        ctx.cache_http,
                        format!("`{}` is not a valid message count", arg),
                    )
                    .await?;
                    return Ok(EventHandled::Yes);
                }
            },
        };

        let typing = msg.channel_id.start_typing(ctx.http);
        let result = llm::reply_from_history(ctx, msg.channel_id, msg.guild_id, n_messages).await;
        typing.stop();

        match result {
            Ok(reply) => msg.reply(ctx.cache_http, reply).await?,
            Err(e) => {
                msg.reply(ctx.cache_http, format!("Completion failed: {}", e))
                    .await?
            }
        };

        Ok(EventHandled::Yes)
    }
}
