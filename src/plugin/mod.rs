use anyhow::Result;

pub use crate::context::Context;
pub use crate::event::EventHandled;

mod autoreply;
mod complete;
mod debug;
mod help;
mod reply_relay;
mod respond;
mod update_settings;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Doubles as the command word for command plugins
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &crate::event::Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    use crate::plugin::*;

    vec![
        // Core bot operations
        Box::new(debug::Debug),
        // Routes replies to waiting interactive flows before anything else
        // can consume them.  Keep before the command plugins.
        Box::new(reply_relay::ReplyRelay),
        Box::new(help::Help),
        // Commands
        Box::new(respond::Respond),
        Box::new(complete::Complete),
        Box::new(update_settings::UpdateSettings),
        // Autoreply fallback, used if no other plugin handles the event.
        // Keep last.
        Box::new(autoreply::Autoreply),
    ]
}
