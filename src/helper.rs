//! Miscellaneous convenience methods

use crate::context::Context;
use anyhow::Result;
use serenity::all::GuildId;
use std::collections::HashMap;

#[serenity::async_trait]
pub trait UserIdHelper {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl UserIdHelper for serenity::all::UserId {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String {
        let user = match self.to_user(ctx.cache_http).await {
            Ok(user) => user,
            Err(_) => return format!("<unknown-user-{}>", *self),
        };

        user.nick_in_guild(ctx, guild_id).await
    }
}

#[serenity::async_trait]
pub trait UserHelper {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl UserHelper for serenity::all::User {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String {
        let nick_in_guild = match guild_id {
            Some(guild_id) => self.nick_in(ctx.cache_http, guild_id).await,
            None => None,
        };

        // May not be in a guild, e.g. DM.  Fall back to global username.
        match nick_in_guild {
            Some(nick_in_guild) => nick_in_guild,
            None => self.name.clone(),
        }
    }
}

/// Replace every mention token with its mapped human-readable name
pub fn apply_mention_map(content: &str, mention_map: &HashMap<String, String>) -> String {
    let mut content = content.to_owned();
    for (mention, name) in mention_map {
        content = content.replace(mention, name);
    }
    content
}

#[serenity::async_trait]
pub trait MessageHelper {
    async fn human_format_content(&self, ctx: &Context) -> Result<String>;
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    /// Convert discord-formatted message content, which may contain
    /// non-user-friendly markup such as `<@123>`, to a human-friendly
    /// format.  Also what the language model sees in the transcript.
    async fn human_format_content(&self, ctx: &Context) -> Result<String> {
        // Create a mapping from mention strings to their names
        let mut mention_map: HashMap<String, String> = HashMap::new();

        // Map user mentions (e.g. `<@!1234567890>`)
        for user in &self.mentions {
            let user_id = user.id;
            let mention_with_nickname = format!("<@!{}>", user_id);
            let mention_without_nickname = format!("<@{}>", user_id);

            let name = format!("@{}", user.id.nick_in_guild(ctx, self.guild_id).await);

            // Map both mention formats to the username
            mention_map.insert(mention_with_nickname, name.clone());
            mention_map.insert(mention_without_nickname, name);
        }

        if let Some(guild) = self.guild(ctx.cache) {
            // Map role mentions (e.g. `<@&1234567890>`)
            for role_id in &self.mention_roles {
                let mention = format!("<@&{}>", role_id);

                if let Some(role) = guild.roles.get(role_id) {
                    mention_map.insert(mention, format!("@{}", role.name));
                } else {
                    mention_map.insert(mention, "@UnknownRole".to_string());
                }
            }

            // Map channel mentions (e.g. `<#1234567890>`)
            for channel in &self.mention_channels {
                let channel_id = channel.id;
                let mention = format!("<#{}>", channel_id);

                if let Some(channel) = guild.channels.get(&channel_id) {
                    mention_map.insert(mention, format!("#{}", channel.name));
                } else {
                    mention_map.insert(mention, "#UnknownChannel".to_string());
                }
            }
        }

        Ok(apply_mention_map(&self.content, &mention_map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_tokens_become_at_names() {
        let mut map = HashMap::new();
        map.insert("<@100>".to_string(), "@Sam".to_string());
        map.insert("<@!100>".to_string(), "@Sam".to_string());

        assert_eq!(apply_mention_map("hey <@100>, you there?", &map), "hey @Sam, you there?");
        assert_eq!(apply_mention_map("<@!100> hi", &map), "@Sam hi");
    }

    #[test]
    fn unmapped_content_is_unchanged() {
        let map = HashMap::new();
        assert_eq!(apply_mention_map("no mentions here", &map), "no mentions here");
    }
}
