use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::command::{Args, CommandContext, CommandHandler, Reply, ResolvedUser};
use crate::error::CommandResult;
use crate::model::{colors, EmbedBuilder, User};

const DATE_FORMAT: &str = "%d.%m.%Y. %H:%M:%S";

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn run(&self, ctx: &CommandContext<'_>, _args: Args) -> CommandResult<Reply> {
        let prefix = ctx.prefix();
        let embed = ctx
            .router
            .descriptors()
            .fold(
                EmbedBuilder::new()
                    .title("📖 Command List")
                    .description("Here are all the available commands you can use:")
                    .color(colors::BLUE),
                |embed, command| {
                    embed.field(format!("{}{}", prefix, command.usage()), command.description(), false)
                },
            )
            .build();
        Ok(embed.into())
    }
}

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn run(&self, ctx: &CommandContext<'_>, _args: Args) -> CommandResult<Reply> {
        Ok(match ctx.latency {
            Some(latency) => Reply::text(format!("🏓 Pong! {} ms", latency.as_millis())),
            None => Reply::text("🏓 Pong!"),
        })
    }
}

pub struct SystemInfo;

#[async_trait]
impl CommandHandler for SystemInfo {
    async fn run(&self, _ctx: &CommandContext<'_>, _args: Args) -> CommandResult<Reply> {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| "unknown".into());
        let embed = EmbedBuilder::new()
            .title("🖥️ System Information")
            .color(colors::BLUE)
            .field("OS", std::env::consts::OS, true)
            .field("Architecture", std::env::consts::ARCH, true)
            .field("CPUs", cpus, true)
            .field("Version", env!("CARGO_PKG_VERSION"), true)
            .build();
        Ok(embed.into())
    }
}

/// The `user` argument, or the author when it was left out.
fn target(ctx: &CommandContext<'_>, args: &Args) -> ResolvedUser {
    args.user("user").cloned().unwrap_or_else(|| ResolvedUser {
        user: ctx.author().clone(),
        member: ctx.message.member.clone(),
    })
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

pub struct UserInfo;

#[async_trait]
impl CommandHandler for UserInfo {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let target = target(ctx, &args);
        let user: &User = &target.user;
        let cdn = &ctx.state.config.cdn_url;

        let mut embed = EmbedBuilder::new()
            .title(format!("👤 {}", target.display_name()))
            .color(colors::BLUE)
            .thumbnail(user.avatar_url(cdn))
            .field("ID", user.id.as_str(), true)
            .field("Username", user.username.as_str(), true)
            .field("Bot", if user.is_bot() { "Yes" } else { "No" }, true);

        if let Some(created) = user.created_at() {
            embed = embed.field("Account created", format_time(created), false);
        }
        if let Some(member) = &target.member {
            if let Some(joined) = member
                .joined_at
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            {
                embed = embed.field("Joined server", format_time(joined.with_timezone(&Utc)), false);
            }
            let roles = if member.roles.is_empty() {
                "None".to_string()
            } else {
                member.roles.iter().map(|id| format!("<@&{}>", id)).collect::<Vec<_>>().join(" ")
            };
            embed = embed.field(format!("Roles ({})", member.roles.len()), roles, false);
        }
        Ok(embed.build().into())
    }
}

pub struct Avatar;

#[async_trait]
impl CommandHandler for Avatar {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let target = target(ctx, &args);
        let embed = EmbedBuilder::new()
            .title(format!("🖼️ {}'s Avatar", target.user.username))
            .color(colors::BLUE)
            .image(target.user.avatar_url(&ctx.state.config.cdn_url))
            .build();
        Ok(embed.into())
    }
}

pub struct ServerInfo;

#[async_trait]
impl CommandHandler for ServerInfo {
    async fn run(&self, ctx: &CommandContext<'_>, _args: Args) -> CommandResult<Reply> {
        let guild = ctx.api.get_guild(ctx.guild_id()?).await?;
        let members = guild
            .approximate_member_count
            .or(guild.member_count)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".into());
        let owner = guild
            .owner_id
            .as_deref()
            .map(|id| format!("<@{}>", id))
            .unwrap_or_else(|| "unknown".into());
        let created = User { id: guild.id.clone(), ..Default::default() }.created_at();

        let mut embed = EmbedBuilder::new()
            .title(format!("🏰 {}", guild.name.as_deref().unwrap_or("Server")))
            .color(colors::GOLD)
            .field("Owner", owner, true)
            .field("Members", members, true)
            .field("Roles", guild.roles.len().to_string(), true);
        if let Some(online) = guild.approximate_presence_count {
            embed = embed.field("Online", online.to_string(), true);
        }
        if let Some(boosts) = guild.premium_subscription_count.filter(|&n| n > 0) {
            embed = embed.field("Boosts", boosts.to_string(), true);
        }
        if let Some(created) = created {
            embed = embed.field("Created", format_time(created), false);
        }
        if let Some(description) = guild.description.as_deref().filter(|d| !d.is_empty()) {
            embed = embed.description(description);
        }
        if let Some(icon) = guild.icon_url(&ctx.state.config.cdn_url) {
            embed = embed.thumbnail(icon);
        }
        Ok(embed.build().into())
    }
}

pub struct Uptime;

/// `1d 2h 3m 4s`, whole seconds only.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{}d {}h {}m {}s",
        secs / 86_400,
        secs % 86_400 / 3_600,
        secs % 3_600 / 60,
        secs % 60
    )
}

#[async_trait]
impl CommandHandler for Uptime {
    async fn run(&self, ctx: &CommandContext<'_>, _args: Args) -> CommandResult<Reply> {
        let embed = EmbedBuilder::new()
            .title("🕰️ Bot Uptime:")
            .description(format!("**{}**", format_uptime(ctx.state.uptime())))
            .color(colors::ORANGE)
            .build();
        Ok(embed.into())
    }
}

pub struct LastSeen;

#[async_trait]
impl CommandHandler for LastSeen {
    async fn run(&self, ctx: &CommandContext<'_>, args: Args) -> CommandResult<Reply> {
        let target = target(ctx, &args);
        let name = &target.user.username;

        let embed = match ctx.store.lookup(&target.user.id).await {
            Some(record) => EmbedBuilder::new()
                .title(format!("🕵️ Last activity of {}", name))
                .description(format!(
                    "**Message:** {}\n**Time:** {}",
                    record.last_message_text,
                    format_time(record.last_message_at)
                ))
                .color(colors::TEAL),
            None => EmbedBuilder::new()
                .title("📭 No data")
                .description(format!("No recorded messages for {}.", name))
                .color(colors::RED),
        };
        Ok(embed.build().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityStore;
    use crate::mock::{ApiCall, Fixture, MockApi, AUTHOR_ID, MOD_ID, PLAYER_ID};
    use chrono::TimeZone;

    async fn embed_for(fx: &Fixture, author: &str, text: &str) -> crate::model::Embed {
        let msg = fx.message(author, text);
        match fx.router.route(&fx.context(&msg)).await.unwrap().unwrap() {
            Reply::Embed(embed) => embed,
            other => panic!("expected embed, got {other:?}"),
        }
    }

    #[test]
    fn uptime_breaks_down_into_units() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 0h 0m 0s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 1h 1m 1s");
        assert_eq!(format_uptime(Duration::from_millis(59_999)), "0d 0h 0m 59s");
    }

    #[tokio::test]
    async fn ping_reports_latency() {
        let fx = Fixture::new(MockApi::with_guild());
        let msg = fx.message(AUTHOR_ID, "-ping");
        let reply = fx.router.route(&fx.context(&msg)).await.unwrap().unwrap();
        assert_eq!(reply, Reply::text("🏓 Pong! 42 ms"));
    }

    #[tokio::test]
    async fn help_lists_usage_with_the_prefix() {
        let fx = Fixture::new(MockApi::with_guild());
        let embed = embed_for(&fx, AUTHOR_ID, "-help").await;
        let fields = embed.fields.unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names[0], "-help");
        assert!(names.contains(&"-addrole <user> <role>"));
        assert!(names.contains(&"-roll [NdM]"));
    }

    #[tokio::test]
    async fn lastseen_shows_the_recorded_message() {
        let fx = Fixture::new(MockApi::with_guild());
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        fx.store.record(PLAYER_ID, "gg wp", at).await.unwrap();

        let embed = embed_for(&fx, AUTHOR_ID, &format!("-lastseen <@{}>", PLAYER_ID)).await;
        assert_eq!(embed.title.as_deref(), Some("🕵️ Last activity of player"));
        assert_eq!(
            embed.description.as_deref(),
            Some("**Message:** gg wp\n**Time:** 04.03.2025. 05:06:07")
        );
    }

    #[tokio::test]
    async fn lastseen_without_data() {
        let fx = Fixture::new(MockApi::with_guild());
        let embed = embed_for(&fx, AUTHOR_ID, "-lastseen mod").await;
        assert_eq!(embed.title.as_deref(), Some("📭 No data"));
        assert_eq!(embed.description.as_deref(), Some("No recorded messages for mod."));
    }

    #[tokio::test]
    async fn avatar_defaults_to_the_author() {
        let fx = Fixture::new(MockApi::with_guild());
        let embed = embed_for(&fx, AUTHOR_ID, "-avatar").await;
        assert_eq!(embed.title.as_deref(), Some("🖼️ kim's Avatar"));
        let url = embed.image.unwrap().url;
        assert!(url.starts_with("https://cdn.test/embed/avatars/"));
    }

    #[tokio::test]
    async fn userinfo_lists_member_roles() {
        let fx = Fixture::new(MockApi::with_guild());
        let embed = embed_for(&fx, AUTHOR_ID, &format!("-userinfo <@!{}>", MOD_ID)).await;
        let fields = embed.fields.unwrap();
        let roles = fields.iter().find(|f| f.name == "Roles (1)").unwrap();
        assert_eq!(roles.value, "<@&200>");
    }

    #[tokio::test]
    async fn serverinfo_reads_the_guild() {
        let fx = Fixture::new(MockApi::with_guild());
        let embed = embed_for(&fx, AUTHOR_ID, "-serverinfo").await;
        assert_eq!(embed.title.as_deref(), Some("🏰 Arena"));
        assert!(embed.fields.unwrap().iter().any(|f| f.name == "Members" && f.value == "4"));
        assert!(fx.api.calls().contains(&ApiCall::GetGuild("100".into())));
    }

    #[tokio::test]
    async fn serverinfo_shows_presence_and_boosts_when_known() {
        let fx = Fixture::new(MockApi::with_guild());
        let fields = embed_for(&fx, AUTHOR_ID, "-serverinfo").await.fields.unwrap();
        assert!(!fields.iter().any(|f| f.name == "Online" || f.name == "Boosts"));

        let mut api = MockApi::with_guild();
        if let Some(guild) = api.guild.as_mut() {
            guild.approximate_presence_count = Some(3);
            guild.premium_subscription_count = Some(2);
        }
        let fx = Fixture::new(api);
        let fields = embed_for(&fx, AUTHOR_ID, "-serverinfo").await.fields.unwrap();
        assert!(fields.iter().any(|f| f.name == "Online" && f.value == "3"));
        assert!(fields.iter().any(|f| f.name == "Boosts" && f.value == "2"));
    }

    #[tokio::test]
    async fn serverinfo_outside_a_guild_fails() {
        let fx = Fixture::new(MockApi::with_guild());
        let mut msg = fx.message(AUTHOR_ID, "-serverinfo");
        msg.guild_id = None;
        let err = fx.router.route(&fx.context(&msg)).await.unwrap_err();
        assert!(matches!(err, crate::error::CommandError::Handler(_)));
    }
}
