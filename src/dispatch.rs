//! Sequences every inbound message through activity tracking, passive
//! triggers and the command router.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::activity::{parse_timestamp, ActivityStore};
use crate::api::ServerApi;
use crate::client::Context;
use crate::command::{CommandContext, Router};
use crate::event::EventHandler;
use crate::model::{colors, EmbedBuilder, Message, Ready, Snowflake};
use crate::report::ErrorReporter;
use crate::state::BotState;
use crate::trigger::TriggerEvaluator;

pub struct Dispatcher {
    api: Arc<dyn ServerApi>,
    store: Arc<dyn ActivityStore>,
    state: Arc<BotState>,
    router: Router,
    triggers: TriggerEvaluator,
    reporter: ErrorReporter,
    self_id: OnceLock<Snowflake>,
    announced: AtomicBool,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn ServerApi>,
        store: Arc<dyn ActivityStore>,
        state: Arc<BotState>,
        router: Router,
    ) -> Self {
        let config = &state.config;
        let triggers = TriggerEvaluator::new(&config.trigger_words, &config.prefixes);
        let reporter = ErrorReporter::new(config.display_prefix());
        Self {
            api,
            store,
            state,
            router,
            triggers,
            reporter,
            self_id: OnceLock::new(),
            announced: AtomicBool::new(false),
        }
    }

    /// Remembers who the bot is and posts the online notice. The notice goes
    /// out once per process, not once per gateway session.
    pub async fn handle_ready(&self, ready: &Ready) {
        let _ = self.self_id.set(ready.user.id.clone());
        log::info!("Logged in as {} ({})", ready.user.username, ready.user.id);

        if self.announced.swap(true, Ordering::SeqCst) {
            return;
        }
        let embed = EmbedBuilder::new()
            .title("✅ Bot is now online!")
            .description("Everything is running perfectly!")
            .color(colors::GREEN)
            .build();
        let channel_id = &self.state.config.announce_channel_id;
        if let Err(e) = self.api.send_embed(channel_id, embed).await {
            log::warn!("Could not announce startup in {}: {}", channel_id, e);
        }
    }

    pub async fn handle_message(&self, msg: &Message, latency: Option<Duration>) {
        if self.is_own(msg) || msg.author.is_bot() {
            return;
        }

        let at = msg
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);
        if let Err(e) = self.store.record(&msg.author.id, &msg.content, at).await {
            log::warn!("Activity for {} kept in memory only: {}", msg.author.id, e);
        }

        if self.triggers.should_react(&msg.content) {
            let emoji = &self.state.config.reaction_emoji;
            if let Err(e) = self.api.add_reaction(&msg.channel_id, &msg.id, emoji).await {
                log::warn!("Could not react to {}: {}", msg.id, e);
            }
        }

        if self.triggers.is_away_announcement(&msg.content) {
            let notice = format!("💤 {} is now AFK.", msg.author.mention());
            if let Err(e) = self.api.say(&msg.channel_id, &notice).await {
                log::warn!("Could not post AFK notice in {}: {}", msg.channel_id, e);
            }
        }

        let ctx = CommandContext {
            api: self.api.as_ref(),
            store: self.store.as_ref(),
            state: &self.state,
            router: &self.router,
            message: msg,
            latency,
        };
        match self.router.route(&ctx).await {
            Ok(None) => {}
            Ok(Some(reply)) => {
                if let Err(e) = self.api.send_message(&msg.channel_id, reply.into_payload()).await {
                    log::warn!("Could not reply in {}: {}", msg.channel_id, e);
                }
            }
            Err(e) => self.reporter.report(self.api.as_ref(), &msg.channel_id, &e).await,
        }
    }

    fn is_own(&self, msg: &Message) -> bool {
        self.self_id.get().is_some_and(|id| *id == msg.author.id)
    }
}

#[async_trait]
impl EventHandler for Dispatcher {
    async fn on_ready(&self, _ctx: Context, ready: Ready) {
        self.handle_ready(&ready).await;
    }

    async fn on_message(&self, ctx: Context, msg: Message) {
        self.handle_message(&msg, ctx.latency()).await;
    }
}
