//! Turning an argument tail into typed values.

use std::collections::HashMap;
use std::str::FromStr;

use rand::Rng;

use super::{ArgKind, ArgSpec, CommandContext};
use crate::error::{ClientError, CommandError, CommandResult};
use crate::model::{Channel, Member, User};

#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub user: User,
    /// Present when the reference was resolved inside a guild.
    pub member: Option<Member>,
}

impl ResolvedUser {
    pub fn display_name(&self) -> &str {
        match &self.member {
            Some(member) if member.nick.is_some() => member.display_name(),
            _ => self.user.global_name.as_deref().unwrap_or(&self.user.username),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    pub count: u32,
    pub sides: u32,
}

impl Dice {
    pub const MAX_COUNT: u32 = 100;
    pub const MAX_SIDES: u32 = 1000;

    pub fn roll<R: Rng>(&self, rng: &mut R) -> Vec<u32> {
        (0..self.count).map(|_| rng.random_range(1..=self.sides)).collect()
    }
}

impl FromStr for Dice {
    type Err = String;

    /// `NdM` or `dM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, sides) = s
            .to_ascii_lowercase()
            .split_once('d')
            .map(|(c, m)| (c.to_string(), m.to_string()))
            .ok_or_else(|| format!("`{}` is not in NdM format", s))?;

        let count = if count.is_empty() {
            1
        } else {
            count.parse::<u32>().map_err(|_| format!("`{}` is not a dice count", count))?
        };
        let sides = sides.parse::<u32>().map_err(|_| format!("`{}` is not a number of sides", sides))?;

        if !(1..=Self::MAX_COUNT).contains(&count) {
            return Err(format!("dice count must be between 1 and {}", Self::MAX_COUNT));
        }
        if !(2..=Self::MAX_SIDES).contains(&sides) {
            return Err(format!("dice need between 2 and {} sides", Self::MAX_SIDES));
        }
        Ok(Dice { count, sides })
    }
}

#[derive(Debug, Clone)]
pub enum ArgValue {
    Text(String),
    User(ResolvedUser),
    Channel(Channel),
    Dice(Dice),
}

/// Resolved arguments by spec name, plus any tokens past the declared specs.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: HashMap<&'static str, ArgValue>,
    rest: Vec<String>,
}

impl Args {
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<&ResolvedUser> {
        match self.values.get(name) {
            Some(ArgValue::User(user)) => Some(user),
            _ => None,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        match self.values.get(name) {
            Some(ArgValue::Channel(channel)) => Some(channel),
            _ => None,
        }
    }

    pub fn dice(&self, name: &str) -> Option<Dice> {
        match self.values.get(name) {
            Some(ArgValue::Dice(dice)) => Some(*dice),
            _ => None,
        }
    }

    /// Tokens beyond the declared specs. Never an error to have them.
    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    /// For handlers called with a required spec; the router has already
    /// enforced presence.
    pub fn require_text(&self, name: &str) -> CommandResult<&str> {
        self.text(name).ok_or_else(|| CommandError::MissingArgument(name.to_string()))
    }

    pub fn require_user(&self, name: &str) -> CommandResult<&ResolvedUser> {
        self.user(name).ok_or_else(|| CommandError::MissingArgument(name.to_string()))
    }
}

/// Splits off the next token. Double quotes group a token containing spaces.
pub fn next_token(input: &str) -> CommandResult<Option<(String, &str)>> {
    let input = input.trim_start();
    if input.is_empty() {
        return Ok(None);
    }

    if let Some(quoted) = input.strip_prefix('"') {
        return match quoted.find('"') {
            Some(end) => Ok(Some((quoted[..end].to_string(), &quoted[end + 1..]))),
            None => Err(CommandError::BadArgument("unclosed quote".into())),
        };
    }

    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Ok(Some((input[..end].to_string(), &input[end..])))
}

/// Walks `specs` over `tail`. The last [`ArgKind::Text`] spec swallows the
/// remainder; anything left after the specs lands in [`Args::rest`].
pub async fn resolve(
    specs: &[ArgSpec],
    tail: &str,
    ctx: &CommandContext<'_>,
) -> CommandResult<Args> {
    let mut args = Args::default();
    let mut remaining = tail;

    for spec in specs {
        if spec.kind == ArgKind::Text {
            let text = unquote(remaining.trim());
            remaining = "";
            if text.is_empty() {
                if spec.required {
                    return Err(CommandError::MissingArgument(spec.name.to_string()));
                }
                continue;
            }
            args.values.insert(spec.name, ArgValue::Text(text));
            continue;
        }

        let Some((token, after)) = next_token(remaining)? else {
            if spec.required {
                return Err(CommandError::MissingArgument(spec.name.to_string()));
            }
            continue;
        };
        remaining = after;

        let value = match spec.kind {
            ArgKind::Text | ArgKind::Word => ArgValue::Text(token),
            ArgKind::User => ArgValue::User(resolve_user(ctx, &token).await?),
            ArgKind::Channel => ArgValue::Channel(resolve_channel(ctx, &token).await?),
            ArgKind::Dice => ArgValue::Dice(token.parse().map_err(CommandError::BadArgument)?),
        };
        args.values.insert(spec.name, value);
    }

    while let Some((token, after)) = loose_token(remaining) {
        args.rest.push(token);
        remaining = after;
    }
    Ok(args)
}

/// Drops the quotes when the whole remainder is a single quoted token.
fn unquote(text: &str) -> String {
    match next_token(text) {
        Ok(Some((token, after))) if text.starts_with('"') && after.trim().is_empty() => token,
        _ => text.to_string(),
    }
}

/// Like [`next_token`], but an unclosed quote is kept as a literal word.
/// Undeclared trailing tokens must never fail a command.
fn loose_token(input: &str) -> Option<(String, &str)> {
    next_token(input).unwrap_or_else(|_| {
        let input = input.trim_start();
        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        Some((input[..end].to_string(), &input[end..]))
    })
}

/// `<@id>`, `<@!id>` or a bare id.
pub fn user_id_from(token: &str) -> Option<&str> {
    let id = token
        .strip_prefix("<@")
        .and_then(|t| t.strip_suffix('>'))
        .map(|t| t.strip_prefix('!').unwrap_or(t))
        .unwrap_or(token);
    is_id(id).then_some(id)
}

/// `<#id>` or a bare id.
pub fn channel_id_from(token: &str) -> Option<&str> {
    let id = token
        .strip_prefix("<#")
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token);
    is_id(id).then_some(id)
}

/// `<@&id>` or a bare id.
pub fn role_id_from(token: &str) -> Option<&str> {
    let id = token
        .strip_prefix("<@&")
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token);
    is_id(id).then_some(id)
}

fn is_id(value: &str) -> bool {
    !value.is_empty() && value.len() <= 20 && value.bytes().all(|b| b.is_ascii_digit())
}

fn not_found(what: &str, token: &str) -> CommandError {
    CommandError::BadArgument(format!("{} `{}` not found", what, token))
}

async fn resolve_user(ctx: &CommandContext<'_>, token: &str) -> CommandResult<ResolvedUser> {
    let guild_id = ctx.message.guild_id.as_deref();

    match (guild_id, user_id_from(token)) {
        (Some(guild_id), Some(user_id)) => {
            let member = match ctx.api.get_guild_member(guild_id, user_id).await {
                Ok(member) => member,
                Err(ClientError::NotFound(_)) => return Err(not_found("Member", token)),
                Err(e) => return Err(e.into()),
            };
            let user = match &member.user {
                Some(user) => user.clone(),
                None => ctx.api.get_user(user_id).await?,
            };
            Ok(ResolvedUser { user, member: Some(member) })
        }
        (Some(guild_id), None) => {
            let members = ctx.api.get_guild_members(guild_id).await?;
            let found = members.into_iter().find(|m| {
                m.nick.as_deref() == Some(token)
                    || m.user.as_ref().is_some_and(|u| {
                        u.username == token || u.global_name.as_deref() == Some(token)
                    })
            });
            match found {
                Some(member) => {
                    let user = member.user.clone().ok_or_else(|| not_found("Member", token))?;
                    Ok(ResolvedUser { user, member: Some(member) })
                }
                None => Err(not_found("Member", token)),
            }
        }
        (None, Some(user_id)) => match ctx.api.get_user(user_id).await {
            Ok(user) => Ok(ResolvedUser { user, member: None }),
            Err(ClientError::NotFound(_)) => Err(not_found("User", token)),
            Err(e) => Err(e.into()),
        },
        (None, None) if ctx.message.author.username == token => Ok(ResolvedUser {
            user: ctx.message.author.clone(),
            member: None,
        }),
        (None, None) => Err(not_found("User", token)),
    }
}

async fn resolve_channel(ctx: &CommandContext<'_>, token: &str) -> CommandResult<Channel> {
    let guild_id = ctx
        .message
        .guild_id
        .as_deref()
        .ok_or_else(|| not_found("Channel", token))?;
    let channels = ctx.api.get_guild_channels(guild_id).await?;

    let found = match channel_id_from(token) {
        Some(id) => channels.into_iter().find(|c| c.id == id),
        None => {
            let name = token.strip_prefix('#').unwrap_or(token);
            channels.into_iter().find(|c| c.name.as_deref() == Some(name))
        }
    };
    found.ok_or_else(|| not_found("Channel", token))
}
