//! Guild permission bits and the role arithmetic that produces a member's
//! effective permission set.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::{Guild, Snowflake};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permissions(u64);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const CREATE_INSTANT_INVITE: Permissions = Permissions(1 << 0);
    pub const KICK_MEMBERS: Permissions = Permissions(1 << 1);
    pub const BAN_MEMBERS: Permissions = Permissions(1 << 2);
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_CHANNELS: Permissions = Permissions(1 << 4);
    pub const MANAGE_GUILD: Permissions = Permissions(1 << 5);
    pub const ADD_REACTIONS: Permissions = Permissions(1 << 6);
    pub const VIEW_CHANNEL: Permissions = Permissions(1 << 10);
    pub const SEND_MESSAGES: Permissions = Permissions(1 << 11);
    pub const MANAGE_MESSAGES: Permissions = Permissions(1 << 13);
    pub const READ_MESSAGE_HISTORY: Permissions = Permissions(1 << 16);
    pub const MANAGE_ROLES: Permissions = Permissions(1 << 28);
    pub const ALL: Permissions = Permissions(u64::MAX);

    const NAMES: &'static [(Permissions, &'static str)] = &[
        (Self::CREATE_INSTANT_INVITE, "Create Invite"),
        (Self::KICK_MEMBERS, "Kick Members"),
        (Self::BAN_MEMBERS, "Ban Members"),
        (Self::ADMINISTRATOR, "Administrator"),
        (Self::MANAGE_CHANNELS, "Manage Channels"),
        (Self::MANAGE_GUILD, "Manage Server"),
        (Self::ADD_REACTIONS, "Add Reactions"),
        (Self::VIEW_CHANNEL, "View Channel"),
        (Self::SEND_MESSAGES, "Send Messages"),
        (Self::MANAGE_MESSAGES, "Manage Messages"),
        (Self::READ_MESSAGE_HISTORY, "Read Message History"),
        (Self::MANAGE_ROLES, "Manage Roles"),
    ];

    pub const fn from_bits(bits: u64) -> Self {
        Permissions(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn difference(self, other: Permissions) -> Permissions {
        Permissions(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Role permissions arrive as decimal strings.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<u64>().ok().map(Permissions)
    }

    /// Effective guild-level permissions of a member holding `role_ids`.
    ///
    /// The guild owner and anyone with ADMINISTRATOR get everything. Otherwise
    /// the @everyone role (whose id is the guild id) is OR-ed with every role
    /// the member holds. Channel overwrites are not considered.
    pub fn for_member(guild: &Guild, user_id: &str, role_ids: &[Snowflake]) -> Self {
        if guild.owner_id.as_deref() == Some(user_id) {
            return Self::ALL;
        }

        let mut perms = Self::NONE;
        for role in &guild.roles {
            if role.id == guild.id || role_ids.contains(&role.id) {
                if let Some(bits) = role.permissions.as_deref().and_then(Self::parse) {
                    perms |= bits;
                }
            }
        }

        if perms.contains(Self::ADMINISTRATOR) {
            Self::ALL
        } else {
            perms
        }
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self {
        Permissions(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "{:#x}", self.0)
        } else {
            f.write_str(&names.join(", "))
        }
    }
}
