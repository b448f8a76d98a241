//! Client for the remote text-completion endpoint.

use crate::{
    context::Context,
    log_internal,
    prompt::{self, STOP_SEQUENCE},
    settings::Settings,
};
use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, GuildId};

/// Discord rejects messages over 2000 characters; leave some headroom.
const DISCORD_MESSAGE_LIMIT: usize = 1900;

#[derive(serde::Serialize)]
pub struct CompletionRequest {
    /// Model/engine name
    model: String,
    /// Text for the model to continue
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    /// Sequences at which generation stops
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    /// Whether to stream one token at a time, or return the entire response
    /// in one go
    stream: bool,
}

#[derive(serde::Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(serde::Deserialize)]
struct CompletionChoice {
    text: String,
}

impl CompletionRequest {
    pub fn new(settings: &Settings, prompt: String, max_tokens: u32, stop: Vec<String>) -> Self {
        Self {
            model: settings.engine.clone(),
            prompt,
            max_tokens,
            temperature: settings.temperature,
            frequency_penalty: settings.frequency_penalty,
            presence_penalty: settings.presence_penalty,
            stop,
            stream: false,
        }
    }

    /// Request a continuation.  Transport and quota failures propagate to
    /// the caller; there is no retry.
    pub async fn post(&self, ctx: &Context<'_>) -> Result<String> {
        let (url, api_key) = {
            let cfg = ctx.cfg.read().await;
            (cfg.llm.completion_url.clone(), cfg.llm.api_key.clone())
        };

        log_internal!("Sending request to completion endpoint {}... ", url);
        let client = reqwest::Client::new();
        let response = client
            .post(&url)
            .bearer_auth(&api_key)
            .json(self)
            .send()
            .await?
            .error_for_status()?
            .json::<CompletionResponse>()
            .await?;
        log_internal!("Sending request to completion endpoint {}... done", url);

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(anyhow!("Completion response contained no choices"))?;

        Ok(truncate_for_discord(text))
    }
}

/// Generate one reply from the last `n_messages` of a channel: build the
/// transcript prompt, complete it with the scope's resolved settings, and
/// redact the result.
pub async fn reply_from_history(
    ctx: &Context<'_>,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
    n_messages: u8,
) -> Result<String> {
    let lines = prompt::transcript_lines(ctx, channel_id, n_messages).await?;
    let rendered = prompt::render_prompt(&lines, &ctx.bot_display_name());

    let settings = ctx.effective_settings(guild_id, Some(channel_id)).await;
    let max_tokens = ctx.cfg.read().await.llm.reply_max_tokens;

    let completion =
        CompletionRequest::new(&settings, rendered, max_tokens, vec![STOP_SEQUENCE.to_string()])
            .post(ctx)
            .await?;

    Ok(ctx.filter.redact(completion.trim()).into_owned())
}

/// Cut overly long completions at a char boundary so the reply fits in one
/// Discord message.
pub(crate) fn truncate_for_discord(mut text: String) -> String {
    if text.len() <= DISCORD_MESSAGE_LIMIT {
        return text;
    }

    let cut = text
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= DISCORD_MESSAGE_LIMIT)
        .last()
        .unwrap_or(0);
    text.truncate(cut);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            engine: "davinci".to_string(),
            temperature: 1.0,
            presence_penalty: 0.5,
            frequency_penalty: 0.2,
            autoreply_probability: 0.01,
        }
    }

    #[test]
    fn request_carries_resolved_settings() {
        let request = CompletionRequest::new(
            &settings(),
            "Once upon a time".to_string(),
            100,
            vec!["**[".to_string()],
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "davinci");
        assert_eq!(json["prompt"], "Once upon a time");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["stop"][0], "**[");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn empty_stop_list_is_omitted() {
        let request = CompletionRequest::new(&settings(), String::new(), 10, Vec::new());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn long_completions_are_truncated() {
        let text = "a".repeat(3000);
        assert_eq!(truncate_for_discord(text).len(), DISCORD_MESSAGE_LIMIT);

        let short = "short".to_string();
        assert_eq!(truncate_for_discord(short), "short");
    }
}
