use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::{args, CommandContext, CommandDescriptor, Reply, Requirement};
use crate::error::{CommandError, CommandResult};
use crate::model::Permissions;

/// One message's worth of command parsing. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub raw_text: String,
    pub matched_prefix: String,
    pub command_name: String,
    pub argument_tail: String,
}

impl Invocation {
    /// Longest matching prefix wins. A prefix followed by nothing, or by
    /// whitespace, is not an invocation.
    pub fn parse(text: &str, prefixes: &[String]) -> Option<Self> {
        let prefix = prefixes
            .iter()
            .filter(|p| !p.is_empty() && text.starts_with(p.as_str()))
            .max_by_key(|p| p.len())?;

        let body = &text[prefix.len()..];
        let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
        if name_end == 0 {
            return None;
        }

        Some(Self {
            raw_text: text.to_string(),
            matched_prefix: prefix.clone(),
            command_name: body[..name_end].to_string(),
            argument_tail: body[name_end..].trim().to_string(),
        })
    }
}

/// The command table. Built once at startup, then only read.
pub struct Router {
    prefixes: Vec<String>,
    commands: HashMap<String, CommandDescriptor>,
    order: Vec<String>,
}

impl Router {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes, commands: HashMap::new(), order: Vec::new() }
    }

    pub fn register(&mut self, descriptor: CommandDescriptor) -> &mut Self {
        let name = descriptor.name().to_string();
        if self.commands.insert(name.clone(), descriptor).is_some() {
            log::warn!("Command `{}` registered twice, keeping the last one", name);
        } else {
            self.order.push(name);
        }
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.order.iter().filter_map(|name| self.commands.get(name))
    }

    /// `Ok(None)` when the message is not addressed to the bot at all.
    pub async fn route(&self, ctx: &CommandContext<'_>) -> CommandResult<Option<Reply>> {
        let Some(invocation) = Invocation::parse(&ctx.message.content, &self.prefixes) else {
            return Ok(None);
        };
        log::debug!(
            "{} invoked `{}` with {:?}",
            ctx.message.author.id,
            invocation.command_name,
            invocation.argument_tail
        );

        let command = self
            .commands
            .get(&invocation.command_name)
            .ok_or_else(|| CommandError::UnknownCommand(invocation.command_name.clone()))?;

        authorize(command.requirement(), ctx).await?;
        let args = args::resolve(command.args(), &invocation.argument_tail, ctx).await?;

        match AssertUnwindSafe(command.handler().run(ctx, args)).catch_unwind().await {
            Ok(result) => result.map(Some),
            Err(panic) => Err(CommandError::Handler(format!(
                "`{}` panicked: {}",
                invocation.command_name,
                panic_message(panic.as_ref())
            ))),
        }
    }
}

async fn authorize(requirement: Requirement, ctx: &CommandContext<'_>) -> CommandResult<()> {
    let author_id = ctx.message.author.id.as_str();

    match requirement {
        Requirement::None => Ok(()),
        Requirement::BotOwner => {
            if ctx.state.config.is_owner(author_id) {
                Ok(())
            } else {
                Err(CommandError::OwnerOnly)
            }
        }
        Requirement::GuildPermission(needed) => {
            let Some(guild_id) = ctx.message.guild_id.as_deref() else {
                return Err(CommandError::PermissionDenied(needed));
            };
            let guild = ctx.api.get_guild(guild_id).await?;
            let roles = match &ctx.message.member {
                Some(member) => member.roles.clone(),
                None => ctx.api.get_guild_member(guild_id, author_id).await?.roles,
            };

            let granted = Permissions::for_member(&guild, author_id, &roles);
            if granted.contains(needed) {
                Ok(())
            } else {
                Err(CommandError::PermissionDenied(needed.difference(granted)))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
