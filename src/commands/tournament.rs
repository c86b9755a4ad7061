use async_trait::async_trait;

use crate::command::{Args, CommandContext, CommandHandler, Reply};
use crate::error::CommandResult;

/// Command name and the reminder it posts.
pub const REMINDERS: [(&str, &str); 6] = [
    ("play", "🔔 Players who haven't played yet, finish your matches before the tournament ends!"),
    ("play1", "⏰ Don’t forget to play your matches today!"),
    ("play2", "🎮 Play casually! Enjoy your matches!"),
    ("playmotiv", "🔥 Give it your all! Show your best skills!"),
    ("playrelax", "🌴 Relax and enjoy the game. No stress!"),
    ("playurgent", "🚨 URGENT: Play your match now! Deadline is approaching!"),
];

/// Posts a fixed reminder to the tournament channel.
pub struct Remind {
    text: &'static str,
}

impl Remind {
    pub fn new(text: &'static str) -> Self {
        Self { text }
    }
}

#[async_trait]
impl CommandHandler for Remind {
    async fn run(&self, ctx: &CommandContext<'_>, _args: Args) -> CommandResult<Reply> {
        ctx.api.say(&ctx.state.config.tournament_channel_id, self.text).await?;
        Ok(Reply::text("✅ Message sent!"))
    }
}
