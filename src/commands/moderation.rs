//! Role and channel management. Every command here is gated on a guild
//! permission at registration.

use async_trait::async_trait;

use crate::command::args::role_id_from;
use crate::command::{Args, CommandContext, CommandHandler, Reply};
use crate::error::{ClientError, CommandError, CommandResult};
use crate::model::{
    CreateRolePayload, EditMemberPayload, EditOverwritePayload, Guild, OverwriteType, Permissions,
    Role,
};

const OWNER_ROLE: &str = "Owner";

pub struct MakeRole;

#[async_trait]
impl CommandHandler for MakeRole {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let guild_id = ctx.guild_id()?;
        let name = args.require_text("name")?;
        let role = ctx
            .api
            .create_role(guild_id, CreateRolePayload { name: name.to_string(), ..Default::default() })
            .await?;
        log::info!("{} created role {} in {}", ctx.author().id, role.id, guild_id);
        Ok(Reply::text(format!("✅ Role **{}** has been created!", role.name)))
    }
}

fn find_role<'g>(guild: &'g Guild, token: &str) -> CommandResult<&'g Role> {
    role_id_from(token)
        .and_then(|id| guild.role_by_id(id))
        .or_else(|| guild.role_by_name(token))
        .ok_or_else(|| CommandError::BadArgument(format!("Role `{}` not found", token)))
}

pub struct AddRole;

#[async_trait]
impl CommandHandler for AddRole {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let guild_id = ctx.guild_id()?;
        let target = args.require_user("user")?;
        let token = args.require_text("role")?;

        let guild = ctx.api.get_guild(guild_id).await?;
        let role = find_role(&guild, token)?;
        ctx.api.add_member_role(guild_id, &target.user.id, &role.id).await?;
        Ok(Reply::text(format!(
            "✅ Role {} has been added to {}.",
            role.mention(),
            target.user.mention()
        )))
    }
}

pub struct RemoveAllRoles;

#[async_trait]
impl CommandHandler for RemoveAllRoles {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let guild_id = ctx.guild_id()?;
        let target = args.require_user("user")?;
        let user = &target.user;

        ctx.api
            .edit_member(
                guild_id,
                &user.id,
                EditMemberPayload { roles: Some(Vec::new()), ..Default::default() },
            )
            .await?;

        let removed = format!("✅ All roles have been removed from {}.", user.mention());
        let notice = "ℹ️ All of your roles on the server have been removed by a moderator.";
        let dm = match ctx.api.create_dm(&user.id).await {
            Ok(channel) => ctx.api.say(&channel.id, notice).await.map(|_| ()),
            Err(e) => Err(e),
        };

        Ok(Reply::text(match dm {
            Ok(()) => removed,
            Err(ClientError::Forbidden(_)) => {
                format!("{} (Their DMs are closed, so they were not notified.)", removed)
            }
            Err(e) => {
                log::warn!("Could not notify {} about role removal: {}", user.id, e);
                format!("{} (Could not notify them.)", removed)
            }
        }))
    }
}

pub struct SetOwner;

#[async_trait]
impl CommandHandler for SetOwner {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let guild_id = ctx.guild_id()?;
        let target = args.require_user("user")?;

        let guild = ctx.api.get_guild(guild_id).await?;
        let role_id = match guild.role_by_name(OWNER_ROLE) {
            Some(role) => role.id.clone(),
            None => {
                let payload = CreateRolePayload {
                    name: OWNER_ROLE.to_string(),
                    hoist: Some(true),
                    ..Default::default()
                };
                ctx.api.create_role(guild_id, payload).await?.id
            }
        };
        ctx.api.add_member_role(guild_id, &target.user.id, &role_id).await?;
        Ok(Reply::text(format!("👑 {} is now an owner.", target.user.mention())))
    }
}

pub struct Allow;

#[async_trait]
impl CommandHandler for Allow {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        ctx.guild_id()?;
        let target = args.require_user("user")?;
        let channel_id = args
            .channel("channel")
            .map(|c| c.id.as_str())
            .unwrap_or(ctx.message.channel_id.as_str());

        let overwrite = EditOverwritePayload::new(
            OverwriteType::Member,
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
            Permissions::NONE,
        );
        ctx.api
            .edit_channel_permissions(channel_id, &target.user.id, overwrite)
            .await?;
        Ok(Reply::text(format!(
            "✅ {} now has access to <#{}>.",
            target.user.mention(),
            channel_id
        )))
    }
}
