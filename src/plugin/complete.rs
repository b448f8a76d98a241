use crate::{event::*, llm, llm::CompletionRequest, plugin::*};
use anyhow::Result;

/// `complete <prompt> [max_tokens]` - continue an arbitrary prompt
pub struct Complete;

#[serenity::async_trait]
impl Plugin for Complete {
    fn name(&self) -> &'static str {
        "complete"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} <prompt> [max_tokens] - continue an arbitrary prompt (default 100 tokens)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let Some((prompt, max_tokens)) = parse_args(&args) else {
            let prefix = ctx.cfg.read().await.general.command_prefix.clone();
            msg.reply(
                ctx.cache_http,
                format!("Usage: {}{} <prompt> [max_tokens]", prefix, self.name()),
            )
            .await?;
            return Ok(EventHandled::Yes);
        };

        let max_tokens = match max_tokens {
            Some(n) => n,
            None => ctx.cfg.read().await.llm.manual_max_tokens,
        };

        let settings = ctx
            .effective_settings(msg.guild_id, Some(msg.channel_id))
            .await;

        let typing = msg.channel_id.start_typing(ctx.http);
        let result = CompletionRequest::new(&settings, prompt.clone(), max_tokens, Vec::new())
            .post(ctx)
            .await;
        typing.stop();

        match result {
            Ok(completion) => {
                let completion = ctx.filter.redact(&completion);
                let formatted = llm::truncate_for_discord(format!("{}{}", prompt, completion));
                msg.reply(ctx.cache_http, formatted).await?
            }
            Err(e) => {
                msg.reply(ctx.cache_http, format!("Completion failed: {}", e))
                    .await?
            }
        };

        Ok(EventHandled::Yes)
    }
}

/// Split command arguments into the prompt text and an optional trailing
/// token budget.  A final integer only counts as the budget when at least
/// one prompt word precedes it.
fn parse_args(args: &[&str]) -> Option<(String, Option<u32>)> {
    let (&last, rest) = args.split_last()?;

    if rest.is_empty() {
        return Some((last.to_string(), None));
    }

    match last.parse::<u32>() {
        Ok(max_tokens) => Some((rest.join(" "), Some(max_tokens))),
        Err(_) => Some((args.join(" "), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_prompt_uses_default_budget() {
        assert_eq!(
            parse_args(&["tell", "me", "a", "story"]),
            Some(("tell me a story".to_string(), None))
        );
    }

    #[test]
    fn trailing_integer_is_the_budget() {
        assert_eq!(
            parse_args(&["tell", "me", "a", "story", "50"]),
            Some(("tell me a story".to_string(), Some(50)))
        );
    }

    #[test]
    fn lone_integer_is_a_prompt() {
        assert_eq!(parse_args(&["42"]), Some(("42".to_string(), None)));
    }

    #[test]
    fn empty_args_are_rejected() {
        assert_eq!(parse_args(&[]), None);
    }
}
