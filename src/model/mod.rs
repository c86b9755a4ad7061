pub mod permissions;

use serde::{Deserialize, Serialize};

pub use permissions::Permissions;

pub type Snowflake = String;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    #[serde(default)]
    pub username: String,
    pub global_name: Option<String>,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: Option<bool>,
    #[serde(default)]
    pub system: Option<bool>,
}

impl User {
    pub fn is_bot(&self) -> bool {
        self.bot.unwrap_or(false)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Custom avatar if the user has one, otherwise the platform default
    /// picked from the id the way the client does it.
    pub fn avatar_url(&self, cdn: &str) -> String {
        match &self.avatar {
            Some(hash) => {
                let ext = if hash.starts_with("a_") { "gif" } else { "png" };
                format!("{}/avatars/{}/{}.{}?size=1024", cdn, self.id, hash, ext)
            }
            None => {
                let index = self.id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0);
                format!("{}/embed/avatars/{}.png", cdn, index)
            }
        }
    }

    /// Snowflakes carry their creation time in the top 42 bits.
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        const EPOCH_MS: i64 = 1_420_070_400_000;
        let id = self.id.parse::<u64>().ok()?;
        chrono::DateTime::from_timestamp_millis((id >> 22) as i64 + EPOCH_MS)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub member_count: Option<u64>,
    pub approximate_member_count: Option<u64>,
    pub approximate_presence_count: Option<u64>,
    pub description: Option<String>,
    pub premium_subscription_count: Option<u64>,
}

impl Guild {
    pub fn role_by_id(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Exact match first, then case-insensitive.
    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles
            .iter()
            .find(|r| r.name == name)
            .or_else(|| self.roles.iter().find(|r| r.name.eq_ignore_ascii_case(name)))
    }

    pub fn icon_url(&self, cdn: &str) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("{}/icons/{}/{}.png", cdn, self.id, hash))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    pub user: Option<User>,
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    pub joined_at: Option<String>,
    pub permissions: Option<String>,
}

impl Member {
    pub fn display_name(&self) -> &str {
        if let Some(nick) = &self.nick {
            return nick.as_str();
        }
        self.user
            .as_ref()
            .map(|u| u.global_name.as_deref().unwrap_or(u.username.as_str()))
            .unwrap_or("")
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    pub color: Option<u64>,
    pub position: Option<i64>,
    pub permissions: Option<String>,
    pub managed: Option<bool>,
}

impl Role {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub permission_overwrites: Option<Vec<PermissionOverwrite>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OverwriteType {
    Role = 0,
    Member = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: u8,
    pub allow: Option<String>,
    pub deny: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author: User,
    pub member: Option<Member>,
    #[serde(default)]
    pub content: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub timestamp: Option<String>,
    pub color: Option<u64>,
    pub footer: Option<EmbedFooter>,
    pub image: Option<EmbedMedia>,
    pub thumbnail: Option<EmbedMedia>,
    pub fields: Option<Vec<EmbedField>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Colors used by the bot's embeds.
pub mod colors {
    pub const GREEN: u64 = 0x2ECC71;
    pub const BLUE: u64 = 0x3498DB;
    pub const PURPLE: u64 = 0x9B59B6;
    pub const ORANGE: u64 = 0xE67E22;
    pub const TEAL: u64 = 0x1ABC9C;
    pub const RED: u64 = 0xE74C3C;
    pub const GOLD: u64 = 0xF1C40F;
}

// The platform rejects a whole embed if any of these is exceeded.
const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_NAME_LIMIT: usize = 256;
const FIELD_VALUE_LIMIT: usize = 1024;

/// Cuts `text` to at most `limit` characters, ending with an ellipsis.
fn clip(mut text: String, limit: usize) -> String {
    if let Some((end, _)) = text.char_indices().nth(limit) {
        let keep = text[..end].char_indices().nth(limit - 1).map_or(end, |(i, _)| i);
        text.truncate(keep);
        text.push('…');
    }
    text
}

#[derive(Debug, Default)]
pub struct EmbedBuilder(Embed);

impl EmbedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.0.description = Some(clip(desc.into(), DESCRIPTION_LIMIT));
        self
    }
    pub fn color(mut self, color: u64) -> Self {
        self.0.color = Some(color);
        self
    }
    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.0.image = Some(EmbedMedia { url: url.into() });
        self
    }
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.0.thumbnail = Some(EmbedMedia { url: url.into() });
        self
    }
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        let fields = self.0.fields.get_or_insert_with(Vec::new);
        fields.push(EmbedField {
            name: clip(name.into(), FIELD_NAME_LIMIT),
            value: clip(value.into(), FIELD_VALUE_LIMIT),
            inline,
        });
        self
    }
    pub fn build(self) -> Embed {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ready {
    pub v: Option<u64>,
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct GatewayBotResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct MessageCreatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
}

impl MessageCreatePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), embeds: None }
    }

    pub fn embed(embed: Embed) -> Self {
        Self { content: None, embeds: Some(vec![embed]) }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct EditMemberPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Snowflake>>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateRolePayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentionable: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditOverwritePayload {
    #[serde(rename = "type")]
    pub kind: u8,
    pub allow: String,
    pub deny: String,
}

impl EditOverwritePayload {
    pub fn new(kind: OverwriteType, allow: Permissions, deny: Permissions) -> Self {
        Self {
            kind: kind as u8,
            allow: allow.bits().to_string(),
            deny: deny.bits().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, avatar: Option<&str>) -> User {
        User { id: id.into(), avatar: avatar.map(String::from), ..Default::default() }
    }

    #[test]
    fn long_field_values_are_clipped() {
        let embed = EmbedBuilder::new()
            .description("é".repeat(5000))
            .field("Question", "x".repeat(1500), false)
            .field("Answer", "Yes.", false)
            .build();

        assert_eq!(embed.description.unwrap().chars().count(), DESCRIPTION_LIMIT);
        let fields = embed.fields.unwrap();
        assert_eq!(fields[0].value.chars().count(), FIELD_VALUE_LIMIT);
        assert!(fields[0].value.ends_with('…'));
        assert_eq!(fields[1].value, "Yes.");
    }

    #[test]
    fn clip_keeps_text_at_the_limit() {
        assert_eq!(clip("abc".into(), 3), "abc");
        assert_eq!(clip("abcd".into(), 3), "ab…");
    }

    #[test]
    fn avatar_url_prefers_custom_hash() {
        let u = user("80351110224678912", Some("a_1f2e"));
        assert_eq!(
            u.avatar_url("https://cdn.example"),
            "https://cdn.example/avatars/80351110224678912/a_1f2e.gif?size=1024"
        );
    }

    #[test]
    fn avatar_url_falls_back_to_default_index() {
        let u = user("80351110224678912", None);
        let index = (80351110224678912u64 >> 22) % 6;
        assert_eq!(
            u.avatar_url("https://cdn.example"),
            format!("https://cdn.example/embed/avatars/{index}.png")
        );
    }

    #[test]
    fn message_create_decodes_with_missing_optional_fields() {
        let raw = r#"{
            "id": "1", "channel_id": "2",
            "author": {"id": "3", "username": "kim"},
            "content": "-ping"
        }"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.content, "-ping");
        assert!(msg.guild_id.is_none());
        assert!(!msg.author.is_bot());
    }

    #[test]
    fn role_lookup_by_name_falls_back_to_case_insensitive() {
        let guild = Guild {
            id: "1".into(),
            roles: vec![Role { id: "5".into(), name: "Referee".into(), ..Default::default() }],
            ..Default::default()
        };
        assert_eq!(guild.role_by_name("referee").map(|r| r.id.as_str()), Some("5"));
        assert!(guild.role_by_name("player").is_none());
    }

    #[test]
    fn payload_skips_absent_fields() {
        let body = serde_json::to_value(MessageCreatePayload::text("hi")).unwrap();
        assert_eq!(body, serde_json::json!({ "content": "hi" }));
    }
}
