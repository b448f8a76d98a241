use crate::{event::*, plugin::*};
use anyhow::Result;

/// Hands incoming messages to interactive flows waiting on a reply from the
/// sender.  Consumed messages never reach the command or autoreply plugins.
pub struct ReplyRelay;

#[serenity::async_trait]
impl Plugin for ReplyRelay {
    fn name(&self) -> &'static str {
        "reply_relay"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        let consumed = ctx
            .vstate
            .write()
            .await
            .pending_replies
            .deliver(msg.author.id, msg.clone());

        if consumed {
            Ok(EventHandled::Yes)
        } else {
            Ok(EventHandled::No)
        }
    }
}
