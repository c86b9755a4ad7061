//! Turns a failed invocation into exactly one reply.

use crate::api::ServerApi;
use crate::error::CommandError;
use crate::model::{colors, Embed, EmbedBuilder};

/// The fixed set of things a user can be told about a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    PermissionDenied,
    OwnerOnly,
    MissingArgument,
    BadArgument,
    UnknownCommand,
    HandlerError,
}

impl ErrorCategory {
    pub fn of(error: &CommandError) -> Self {
        match error {
            CommandError::PermissionDenied(_) => ErrorCategory::PermissionDenied,
            CommandError::OwnerOnly => ErrorCategory::OwnerOnly,
            CommandError::MissingArgument(_) => ErrorCategory::MissingArgument,
            CommandError::BadArgument(_) => ErrorCategory::BadArgument,
            CommandError::UnknownCommand(_) => ErrorCategory::UnknownCommand,
            CommandError::Handler(_) => ErrorCategory::HandlerError,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ErrorCategory::PermissionDenied => "🚫 Permission denied",
            ErrorCategory::OwnerOnly => "🔒 Owner only",
            ErrorCategory::MissingArgument => "❗ Missing argument",
            ErrorCategory::BadArgument => "⚠️ Invalid argument",
            ErrorCategory::UnknownCommand => "❓ Unknown command",
            ErrorCategory::HandlerError => "💥 Command failed",
        }
    }
}

pub struct ErrorReporter {
    prefix: String,
}

impl ErrorReporter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn render(&self, error: &CommandError) -> Embed {
        let category = ErrorCategory::of(error);
        let description = match error {
            CommandError::PermissionDenied(missing) => {
                format!("You need the **{}** permission to use this command.", missing)
            }
            CommandError::OwnerOnly => "Only the bot owner can use this command.".to_string(),
            CommandError::MissingArgument(name) => format!(
                "Missing `{}`. Check `{}help` for usage.",
                name, self.prefix
            ),
            CommandError::BadArgument(reason) => format!("{}.", reason),
            CommandError::UnknownCommand(name) => format!(
                "There is no `{}` command. Try `{}help`.",
                name, self.prefix
            ),
            CommandError::Handler(cause) => format!("Something went wrong: {}", cause),
        };

        EmbedBuilder::new()
            .title(category.title())
            .description(description)
            .color(colors::RED)
            .build()
    }

    /// Sends the rendered error. Never fails: a reply that cannot be posted
    /// is logged and dropped.
    pub async fn report(&self, api: &dyn ServerApi, channel_id: &str, error: &CommandError) {
        match error {
            CommandError::Handler(cause) => log::error!("Command failed in {}: {}", channel_id, cause),
            other => log::debug!("Rejected command in {}: {}", channel_id, other),
        }

        if let Err(e) = api.send_embed(channel_id, self.render(error)).await {
            log::warn!("Could not report error to {}: {}", channel_id, e);
        }
    }
}
