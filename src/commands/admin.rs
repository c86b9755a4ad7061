use async_trait::async_trait;

use crate::command::{Args, CommandContext, CommandHandler, Reply};
use crate::error::CommandResult;

/// Asks the binary to restart itself. The reply goes out before the gateway
/// session winds down.
pub struct Reboot;

#[async_trait]
impl CommandHandler for Reboot {
    async fn run(&self, ctx: &CommandContext<'_>, _args: Args) -> CommandResult<Reply> {
        log::info!("Reboot requested by {}", ctx.author().id);
        ctx.state.request_reboot();
        Ok(Reply::text("🔄 Rebooting..."))
    }
}
