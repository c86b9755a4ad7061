use async_trait::async_trait;

use crate::client::Context;
use crate::model::{Message, Ready};

/// Callbacks for the gateway events the bot consumes. Each call runs on its
/// own task, so a slow handler never holds up the next event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_ready(&self, ctx: Context, ready: Ready) {
        let _ = (ctx, ready);
    }

    async fn on_message(&self, ctx: Context, msg: Message) {
        let _ = (ctx, msg);
    }
}
