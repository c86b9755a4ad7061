//! Prefix command plumbing: descriptors, argument specs, the handler trait
//! and the per-invocation context handed to handlers.

pub mod args;
pub mod router;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::activity::ActivityStore;
use crate::api::ServerApi;
use crate::error::{CommandError, CommandResult};
use crate::model::{Embed, Message, MessageCreatePayload, Permissions, User};
use crate::state::BotState;

pub use args::{ArgValue, Args, Dice, ResolvedUser};
pub use router::{Invocation, Router};

/// What a handler hands back to be posted in the invoking channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Embed(Embed),
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text(content.into())
    }

    pub fn into_payload(self) -> MessageCreatePayload {
        match self {
            Reply::Text(content) => MessageCreatePayload::text(content),
            Reply::Embed(embed) => MessageCreatePayload::embed(embed),
        }
    }
}

impl From<Embed> for Reply {
    fn from(embed: Embed) -> Self {
        Reply::Embed(embed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Everything left, whitespace included. Only meaningful as the last spec.
    Text,
    /// One whitespace-delimited (or double-quoted) token.
    Word,
    User,
    Channel,
    Dice,
}

#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub required: bool,
}

impl ArgSpec {
    pub const fn required(name: &'static str, kind: ArgKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: ArgKind) -> Self {
        Self { name, kind, required: false }
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            write!(f, "<{}>", self.name)
        } else {
            write!(f, "[{}]", self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    None,
    GuildPermission(Permissions),
    BotOwner,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply>;
}

/// A registered command. Immutable once it is in the [`Router`].
pub struct CommandDescriptor {
    name: String,
    about: &'static str,
    args: Vec<ArgSpec>,
    requirement: Requirement,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.into(),
            about: "",
            args: Vec::new(),
            requirement: Requirement::None,
            handler: Arc::new(handler),
        }
    }

    pub fn about(mut self, about: &'static str) -> Self {
        self.about = about;
        self
    }

    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        self.about
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    pub(crate) fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }

    /// `roll [NdM]`, `addrole <user> <role>`, ...
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for spec in &self.args {
            usage.push(' ');
            usage.push_str(&spec.to_string());
        }
        usage
    }
}

/// Everything a handler can reach while it runs. Built fresh per message.
pub struct CommandContext<'a> {
    pub api: &'a dyn ServerApi,
    pub store: &'a dyn ActivityStore,
    pub state: &'a BotState,
    pub router: &'a Router,
    pub message: &'a Message,
    /// Last measured gateway heartbeat round trip.
    pub latency: Option<Duration>,
}

impl CommandContext<'_> {
    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub fn guild_id(&self) -> CommandResult<&str> {
        self.message
            .guild_id
            .as_deref()
            .ok_or_else(|| CommandError::Handler("This command only works inside a server.".into()))
    }

    pub fn prefix(&self) -> &str {
        self.state.config.display_prefix()
    }
}
