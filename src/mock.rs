//! In-memory [`ServerApi`] double and a fixture wiring it to a real router
//! and a temp-dir activity store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::activity::JsonActivityStore;
use crate::api::ServerApi;
use crate::command::{CommandContext, Router};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::model::*;
use crate::state::BotState;

pub const GUILD_ID: &str = "100";
pub const OWNER_ID: &str = "1000";
pub const AUTHOR_ID: &str = "2001";
pub const MOD_ID: &str = "2002";
pub const PLAYER_ID: &str = "2003";
pub const BOT_ID: &str = "9000";
pub const CHANNEL_ID: &str = "501";
pub const TOURNAMENT_CHANNEL_ID: &str = "600";
pub const ANNOUNCE_CHANNEL_ID: &str = "700";

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Send { channel_id: String, content: Option<String>, embed: Option<Embed> },
    React { channel_id: String, message_id: String, emoji: String },
    GetUser(String),
    GetGuild(String),
    GetMember(String),
    GetMembers,
    GetChannels,
    CreateRole { guild_id: String, name: String },
    AddMemberRole { user_id: String, role_id: String },
    EditMember { user_id: String, roles: Option<Vec<String>> },
    EditPermissions { channel_id: String, overwrite_id: String, allow: String },
    CreateDm(String),
}

#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<ApiCall>>,
    pub(crate) guild: Option<Guild>,
    members: Vec<Member>,
    channels: Vec<Channel>,
    next_id: AtomicUsize,
    fail_sends: AtomicBool,
    fail_roles: AtomicBool,
    dm_forbidden: AtomicBool,
}

fn user(id: &str, name: &str) -> User {
    User { id: id.into(), username: name.into(), ..Default::default() }
}

fn member(id: &str, name: &str, roles: &[&str]) -> Member {
    Member {
        user: Some(user(id, name)),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        joined_at: Some("2024-01-02T03:04:05+00:00".into()),
        ..Default::default()
    }
}

impl MockApi {
    /// A guild where `MOD_ID` holds Manage Roles + Manage Channels and
    /// `AUTHOR_ID` only has the @everyone defaults.
    pub fn with_guild() -> Self {
        let role = |id: &str, name: &str, perms: Permissions| Role {
            id: id.into(),
            name: name.into(),
            permissions: Some(perms.bits().to_string()),
            ..Default::default()
        };
        Self {
            guild: Some(Guild {
                id: GUILD_ID.into(),
                name: Some("Arena".into()),
                owner_id: Some(OWNER_ID.into()),
                roles: vec![
                    role(GUILD_ID, "@everyone", Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES),
                    role("200", "Moderator", Permissions::MANAGE_ROLES | Permissions::MANAGE_CHANNELS),
                    role("300", "Referee", Permissions::NONE),
                ],
                approximate_member_count: Some(4),
                ..Default::default()
            }),
            members: vec![
                member(OWNER_ID, "boss", &[]),
                member(AUTHOR_ID, "kim", &[]),
                member(MOD_ID, "mod", &["200"]),
                member(PLAYER_ID, "player", &["300"]),
            ],
            channels: vec![
                Channel { id: CHANNEL_ID.into(), name: Some("general".into()), ..Default::default() },
                Channel { id: "502".into(), name: Some("private".into()), ..Default::default() },
            ],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the message sends, in order.
    pub fn sent(&self) -> Vec<ApiCall> {
        self.calls().into_iter().filter(|c| matches!(c, ApiCall::Send { .. })).collect()
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn fail_role_creation(&self) {
        self.fail_roles.store(true, Ordering::SeqCst);
    }

    pub fn forbid_dms(&self) {
        self.dm_forbidden.store(true, Ordering::SeqCst);
    }

    pub fn member(&self, user_id: &str) -> Option<Member> {
        self.members.iter().find(|m| m.user_id() == Some(user_id)).cloned()
    }

    fn log(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn id(&self) -> String {
        format!("{}", 800 + self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn not_found() -> ClientError {
        ClientError::NotFound(r#"{"message": "Unknown"}"#.into())
    }
}

#[async_trait]
impl ServerApi for MockApi {
    async fn send_message(
        &self,
        channel_id: &str,
        payload: MessageCreatePayload,
    ) -> Result<Message, ClientError> {
        let embed = payload.embeds.as_ref().and_then(|e| e.first().cloned());
        self.log(ApiCall::Send {
            channel_id: channel_id.into(),
            content: payload.content.clone(),
            embed,
        });
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ClientError::Api("HTTP 500: send failed".into()));
        }
        if channel_id.starts_with("dm-") && self.dm_forbidden.load(Ordering::SeqCst) {
            return Err(ClientError::Forbidden("Cannot send messages to this user".into()));
        }
        Ok(Message {
            id: self.id(),
            channel_id: channel_id.into(),
            author: user(BOT_ID, "afgm"),
            content: payload.content.unwrap_or_default(),
            ..Default::default()
        })
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ClientError> {
        self.log(ApiCall::React {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
            emoji: emoji.into(),
        });
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<User, ClientError> {
        self.log(ApiCall::GetUser(user_id.into()));
        self.member(user_id).and_then(|m| m.user).ok_or_else(Self::not_found)
    }

    async fn get_guild(&self, guild_id: &str) -> Result<Guild, ClientError> {
        self.log(ApiCall::GetGuild(guild_id.into()));
        self.guild.clone().filter(|g| g.id == guild_id).ok_or_else(Self::not_found)
    }

    async fn get_guild_member(&self, _guild_id: &str, user_id: &str) -> Result<Member, ClientError> {
        self.log(ApiCall::GetMember(user_id.into()));
        self.member(user_id).ok_or_else(Self::not_found)
    }

    async fn get_guild_members(&self, _guild_id: &str) -> Result<Vec<Member>, ClientError> {
        self.log(ApiCall::GetMembers);
        Ok(self.members.clone())
    }

    async fn get_guild_channels(&self, _guild_id: &str) -> Result<Vec<Channel>, ClientError> {
        self.log(ApiCall::GetChannels);
        Ok(self.channels.clone())
    }

    async fn create_role(
        &self,
        guild_id: &str,
        payload: CreateRolePayload,
    ) -> Result<Role, ClientError> {
        self.log(ApiCall::CreateRole { guild_id: guild_id.into(), name: payload.name.clone() });
        if self.fail_roles.load(Ordering::SeqCst) {
            return Err(ClientError::Forbidden(r#"{"message": "Missing Permissions"}"#.into()));
        }
        Ok(Role { id: self.id(), name: payload.name, ..Default::default() })
    }

    async fn add_member_role(
        &self,
        _guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ClientError> {
        self.log(ApiCall::AddMemberRole { user_id: user_id.into(), role_id: role_id.into() });
        Ok(())
    }

    async fn edit_member(
        &self,
        _guild_id: &str,
        user_id: &str,
        payload: EditMemberPayload,
    ) -> Result<Member, ClientError> {
        self.log(ApiCall::EditMember { user_id: user_id.into(), roles: payload.roles.clone() });
        let mut member = self.member(user_id).ok_or_else(Self::not_found)?;
        if let Some(roles) = payload.roles {
            member.roles = roles;
        }
        Ok(member)
    }

    async fn edit_channel_permissions(
        &self,
        channel_id: &str,
        overwrite_id: &str,
        payload: EditOverwritePayload,
    ) -> Result<(), ClientError> {
        self.log(ApiCall::EditPermissions {
            channel_id: channel_id.into(),
            overwrite_id: overwrite_id.into(),
            allow: payload.allow,
        });
        Ok(())
    }

    async fn create_dm(&self, user_id: &str) -> Result<Channel, ClientError> {
        self.log(ApiCall::CreateDm(user_id.into()));
        Ok(Channel { id: format!("dm-{}", user_id), kind: Some(1), ..Default::default() })
    }
}

pub fn test_config(data_file: &std::path::Path) -> Config {
    let data_file = data_file.to_string_lossy().to_string();
    Config::from_lookup(|key| {
        let value = match key {
            "DISCORD_BOT_TOKEN" => "test-token",
            "BOT_OWNER_IDS" => OWNER_ID,
            "TOURNAMENT_CHANNEL_ID" => TOURNAMENT_CHANNEL_ID,
            "ANNOUNCE_CHANNEL_ID" => ANNOUNCE_CHANNEL_ID,
            "DISCORD_CDN_URL" => "https://cdn.test",
            "DATA_FILE" => data_file.as_str(),
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config is valid")
}

pub struct Fixture {
    pub api: Arc<MockApi>,
    pub store: Arc<JsonActivityStore>,
    pub state: Arc<BotState>,
    pub router: Router,
    _dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new(api: MockApi) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = test_config(&dir.path().join("data.json"));
        Self {
            api: Arc::new(api),
            store: Arc::new(JsonActivityStore::new(config.data_file.clone())),
            router: crate::commands::standard_router(&config),
            state: Arc::new(BotState::new(config)),
            _dir: dir,
        }
    }

    /// A guild message from `author_id`, carrying the member's roles the way
    /// the gateway does.
    pub fn message(&self, author_id: &str, content: &str) -> Message {
        let member = self.api.member(author_id);
        let author = member
            .as_ref()
            .and_then(|m| m.user.clone())
            .unwrap_or_else(|| user(author_id, &format!("user{}", author_id)));
        Message {
            id: format!("msg-{}", content.len()),
            channel_id: CHANNEL_ID.into(),
            guild_id: self.api.guild.as_ref().map(|g| g.id.clone()),
            author,
            member,
            content: content.into(),
            timestamp: Some("2025-05-06T07:08:09.000000+00:00".into()),
        }
    }

    pub fn context<'a>(&'a self, message: &'a Message) -> CommandContext<'a> {
        CommandContext {
            api: self.api.as_ref(),
            store: self.store.as_ref(),
            state: &self.state,
            router: &self.router,
            message,
            latency: Some(Duration::from_millis(42)),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.api.clone(),
            self.store.clone(),
            self.state.clone(),
            crate::commands::standard_router(&self.state.config),
        )
    }
}
