//! Builds the completion prompt from recent channel history.
//!
//! The prompt is a newline-joined transcript, one `**[name]**: text` line
//! per message, ending with a cue line that names the bot as the next
//! speaker.  The model is expected to continue from the cue, so completion
//! requests use [`STOP_SEQUENCE`] to cut generation at the next speaker
//! marker.

use crate::{
    context::Context,
    helper::{MessageHelper, UserHelper},
};
use anyhow::Result;
use serenity::all::{ChannelId, GetMessages, MessageType};

/// Stop sequence matching the start of the next transcript speaker marker
pub const STOP_SEQUENCE: &str = "**[";

/// One line of conversation, ready for prompt rendering
pub struct TranscriptLine {
    pub author: String,
    pub content: String,
}

/// Whether a message is a command-invocation artifact rather than natural
/// chat: an interaction/system message, or a prefix command like `;respond`.
pub fn is_command_artifact(kind: MessageType, content: &str, command_prefix: &str) -> bool {
    match kind {
        MessageType::Regular | MessageType::InlineReply => {
            !command_prefix.is_empty() && content.starts_with(command_prefix)
        }
        _ => true,
    }
}

/// Drop the final entry when it is the command invocation that triggered
/// this prompt build.  Earlier artifacts stay; only the trailing one is
/// noise.
pub fn drop_trailing_artifact(mut entries: Vec<(bool, TranscriptLine)>) -> Vec<TranscriptLine> {
    if matches!(entries.last(), Some((true, _))) {
        entries.pop();
    }
    entries.into_iter().map(|(_, line)| line).collect()
}

/// Render transcript lines plus the trailing speaker cue.  An empty window
/// yields the cue alone.
pub fn render_prompt(lines: &[TranscriptLine], bot_name: &str) -> String {
    let cue = format!("**[{}]**:", bot_name);

    if lines.is_empty() {
        return cue;
    }

    let mut prompt = lines
        .iter()
        .map(|line| format!("**[{}]**: {}", line.author, line.content.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push('\n');
    prompt.push_str(&cue);
    prompt
}

/// Fetch the last `n_messages` of a channel as transcript lines in
/// chronological order, mentions rewritten to readable names.
pub async fn transcript_lines(
    ctx: &Context<'_>,
    channel_id: ChannelId,
    n_messages: u8,
) -> Result<Vec<TranscriptLine>> {
    let prefix = ctx.cfg.read().await.general.command_prefix.clone();

    let mut messages = channel_id
        .messages(ctx.cache_http, GetMessages::new().limit(n_messages))
        .await?;
    // Discord returns newest first
    messages.reverse();

    let mut entries = Vec::with_capacity(messages.len());
    for msg in &messages {
        let artifact = is_command_artifact(msg.kind, &msg.content, &prefix);
        let author = msg.author.nick_in_guild(ctx, msg.guild_id).await;
        let content = msg.human_format_content(ctx).await?;
        entries.push((artifact, TranscriptLine { author, content }));
    }

    Ok(drop_trailing_artifact(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(author: &str, content: &str) -> TranscriptLine {
        TranscriptLine {
            author: author.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn prompt_preserves_message_order() {
        let lines = vec![line("Alice", "hi"), line("Bob", "hello")];
        let prompt = render_prompt(&lines, "Gloom");
        assert_eq!(prompt, "**[Alice]**: hi\n**[Bob]**: hello\n**[Gloom]**:");
    }

    #[test]
    fn prompt_always_ends_with_speaker_cue() {
        let lines = vec![line("Alice", "hi")];
        let prompt = render_prompt(&lines, "Gloom");
        assert!(prompt.ends_with("**[Gloom]**:"));
    }

    #[test]
    fn empty_window_yields_cue_alone() {
        assert_eq!(render_prompt(&[], "Gloom"), "**[Gloom]**:");
    }

    #[test]
    fn line_content_is_trimmed() {
        let lines = vec![line("Alice", "  hi  ")];
        assert_eq!(render_prompt(&lines, "Gloom"), "**[Alice]**: hi\n**[Gloom]**:");
    }

    #[test]
    fn trailing_artifact_is_dropped() {
        let entries = vec![
            (false, line("Alice", "hi")),
            (false, line("Bob", "hello")),
            (true, line("Carol", ";respond 3")),
        ];
        let lines = drop_trailing_artifact(entries);
        let prompt = render_prompt(&lines, "Gloom");
        assert_eq!(prompt, "**[Alice]**: hi\n**[Bob]**: hello\n**[Gloom]**:");
    }

    #[test]
    fn only_the_trailing_artifact_is_dropped() {
        let entries = vec![
            (true, line("Alice", ";help")),
            (false, line("Bob", "hello")),
        ];
        let lines = drop_trailing_artifact(entries);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn command_artifact_detection() {
        assert!(is_command_artifact(
            MessageType::Regular,
            ";respond 3",
            ";"
        ));
        assert!(!is_command_artifact(MessageType::Regular, "hello", ";"));
        assert!(!is_command_artifact(
            MessageType::InlineReply,
            "replying",
            ";"
        ));
        // Non-chat message kinds are artifacts regardless of content
        assert!(is_command_artifact(MessageType::PinsAdd, "", ";"));
    }
}
