//! The built-in command table.

pub mod admin;
pub mod fun;
pub mod info;
pub mod moderation;
pub mod tournament;

use crate::command::{ArgKind, ArgSpec, CommandDescriptor, Requirement, Router};
use crate::config::Config;
use crate::model::Permissions;

const MANAGE_ROLES: Requirement = Requirement::GuildPermission(Permissions::MANAGE_ROLES);
const MANAGE_CHANNELS: Requirement = Requirement::GuildPermission(Permissions::MANAGE_CHANNELS);

/// Every command the bot answers to, in the order `help` lists them.
pub fn standard_router(config: &Config) -> Router {
    let mut router = Router::new(config.prefixes.clone());

    router
        .register(CommandDescriptor::new("help", info::Help).about("Displays this message."))
        .register(CommandDescriptor::new("ping", info::Ping).about("Checks if the bot is responsive."))
        .register(
            CommandDescriptor::new("8ball", fun::EightBall)
                .about("Ask the magic 8-ball a question.")
                .arg(ArgSpec::required("question", ArgKind::Text)),
        )
        .register(
            CommandDescriptor::new("systeminfo", info::SystemInfo)
                .about("Shows basic system information."),
        );

    for (name, reminder) in tournament::REMINDERS {
        router.register(
            CommandDescriptor::new(name, tournament::Remind::new(reminder))
                .about("Posts a match reminder to the tournament channel."),
        );
    }

    router
        .register(
            CommandDescriptor::new("makerole", moderation::MakeRole)
                .about("Creates a new role.")
                .arg(ArgSpec::required("name", ArgKind::Text))
                .requires(MANAGE_ROLES),
        )
        .register(
            CommandDescriptor::new("addrole", moderation::AddRole)
                .about("Assigns a role to a member.")
                .arg(ArgSpec::required("user", ArgKind::User))
                .arg(ArgSpec::required("role", ArgKind::Text))
                .requires(MANAGE_ROLES),
        )
        .register(
            CommandDescriptor::new("removeallroles", moderation::RemoveAllRoles)
                .about("Removes all roles from a member.")
                .arg(ArgSpec::required("user", ArgKind::User))
                .requires(MANAGE_ROLES),
        )
        .register(
            CommandDescriptor::new("setowner", moderation::SetOwner)
                .about("Gives a member the Owner role.")
                .arg(ArgSpec::required("user", ArgKind::User))
                .requires(MANAGE_ROLES),
        )
        .register(
            CommandDescriptor::new("allow", moderation::Allow)
                .about("Grants access to a private channel.")
                .arg(ArgSpec::required("user", ArgKind::User))
                .arg(ArgSpec::optional("channel", ArgKind::Channel))
                .requires(MANAGE_CHANNELS),
        )
        .register(
            CommandDescriptor::new("userinfo", info::UserInfo)
                .about("Displays user info.")
                .arg(ArgSpec::optional("user", ArgKind::User)),
        )
        .register(
            CommandDescriptor::new("avatar", info::Avatar)
                .about("Displays the user's avatar.")
                .arg(ArgSpec::optional("user", ArgKind::User)),
        )
        .register(CommandDescriptor::new("serverinfo", info::ServerInfo).about("Server information."))
        .register(
            CommandDescriptor::new("roll", fun::Roll)
                .about("Rolls dice, 1-100 without an argument.")
                .arg(ArgSpec::optional("NdM", ArgKind::Dice)),
        )
        .register(
            CommandDescriptor::new("choose", fun::Choose)
                .about("Randomly picks an option.")
                .arg(ArgSpec::optional("options...", ArgKind::Word)),
        )
        .register(
            CommandDescriptor::new("lastseen", info::LastSeen)
                .about("Shows a user's last message.")
                .arg(ArgSpec::optional("user", ArgKind::User)),
        )
        .register(CommandDescriptor::new("uptime", info::Uptime).about("Displays bot uptime."))
        .register(
            CommandDescriptor::new("reboot", admin::Reboot)
                .about("Reboots the bot (owner only).")
                .requires(Requirement::BotOwner),
        );

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::test_config;

    #[test]
    fn every_listed_command_is_registered() {
        let router = standard_router(&test_config(std::path::Path::new("unused.json")));
        for name in [
            "help", "ping", "8ball", "systeminfo", "play", "play1", "play2", "playmotiv",
            "playrelax", "playurgent", "makerole", "addrole", "removeallroles", "setowner",
            "allow", "userinfo", "avatar", "serverinfo", "roll", "choose", "lastseen", "uptime",
            "reboot",
        ] {
            assert!(router.get(name).is_some(), "{name} missing");
        }
        assert_eq!(router.descriptors().count(), 23);
    }

    #[test]
    fn moderation_commands_are_gated() {
        let router = standard_router(&test_config(std::path::Path::new("unused.json")));
        assert_eq!(router.get("makerole").unwrap().requirement(), MANAGE_ROLES);
        assert_eq!(router.get("allow").unwrap().requirement(), MANAGE_CHANNELS);
        assert_eq!(router.get("reboot").unwrap().requirement(), Requirement::BotOwner);
        assert_eq!(router.get("roll").unwrap().usage(), "roll [NdM]");
    }
}
