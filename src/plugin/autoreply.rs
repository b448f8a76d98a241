use crate::{event::*, llm, plugin::*};
use anyhow::Result;
use rand::Rng;

/// Replies when addressed, and occasionally when not: every message that
/// doesn't mention the bot gets a uniform draw against the channel's
/// `autoreply_probability`.
pub struct Autoreply;

#[serenity::async_trait]
impl Plugin for Autoreply {
    fn name(&self) -> &'static str {
        "autoreply"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        // Never trigger on the bot's own messages; its replies contain its
        // own name, which would loop forever.
        if msg.author.id == ctx.cache.current_user().id {
            return Ok(EventHandled::No);
        }

        let mentioned = msg.mentions_me(ctx.cache_http).await?;
        let bot_name = ctx.bot_name().await;
        let settings = ctx
            .effective_settings(msg.guild_id, Some(msg.channel_id))
            .await;
        let draw = rand::thread_rng().gen::<f64>();

        if !should_reply(
            mentioned,
            &msg.content,
            &bot_name,
            msg.author.bot,
            settings.autoreply_probability,
            draw,
        ) {
            return Ok(EventHandled::No);
        }

        let n_messages = ctx.cfg.read().await.history.prompt_message_count;

        let typing = msg.channel_id.start_typing(ctx.http);
        let result = llm::reply_from_history(ctx, msg.channel_id, msg.guild_id, n_messages).await;
        typing.stop();

        match result {
            Ok(reply) => msg.channel_id.say(ctx.cache_http, reply).await?,
            Err(e) => {
                msg.channel_id
                    .say(ctx.cache_http, format!("Completion failed: {}", e))
                    .await?
            }
        };

        Ok(EventHandled::Yes)
    }
}

/// Whether to respond to a message.  `draw` is a uniform sample from [0, 1).
fn should_reply(
    mentioned: bool,
    content: &str,
    bot_name: &str,
    author_is_bot: bool,
    autoreply_probability: f64,
    draw: f64,
) -> bool {
    if mentioned {
        return true;
    }

    if !bot_name.is_empty()
        && content
            .to_lowercase()
            .contains(&bot_name.to_lowercase())
    {
        return true;
    }

    !author_is_bot && draw < autoreply_probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn mention_always_triggers() {
        for draw in [0.0, 0.5, 0.999] {
            assert!(should_reply(true, "hi", "Gloom", false, 0.0, draw));
            // Bots can address the bot too
            assert!(should_reply(true, "hi", "Gloom", true, 0.0, draw));
        }
    }

    #[test]
    fn name_match_is_case_insensitive() {
        assert!(should_reply(false, "hey GLOOM, you up?", "gloom", false, 0.0, 0.999));
        assert!(should_reply(false, "gloomy weather", "Gloom", false, 0.0, 0.999));
        assert!(!should_reply(false, "hello there", "Gloom", false, 0.0, 0.999));
    }

    #[test]
    fn zero_probability_never_autoreplies() {
        for draw in [0.0, 0.0001, 0.5, 0.999999] {
            assert!(!should_reply(false, "hello there", "Gloom", false, 0.0, draw));
        }
    }

    #[test]
    fn bot_senders_never_autoreply() {
        assert!(!should_reply(false, "hello there", "Gloom", true, 1.0, 0.0));
    }

    #[test]
    fn autoreply_frequency_matches_probability() {
        let mut rng = StdRng::seed_from_u64(42);
        let probability = 0.3;
        let samples = 20_000;

        let hits = (0..samples)
            .filter(|_| {
                should_reply(
                    false,
                    "hello there",
                    "Gloom",
                    false,
                    probability,
                    rng.gen::<f64>(),
                )
            })
            .count();

        let frequency = hits as f64 / samples as f64;
        assert!(
            (frequency - probability).abs() < 0.01,
            "observed frequency {} too far from {}",
            frequency,
            probability
        );
    }
}
