use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::ServerApi;
use crate::error::ClientError;
use crate::model::*;

/// Thin REST client. Every request carries the bot token; non-2xx answers are
/// turned into [`ClientError`] variants by [`classify`].
pub struct Http {
    client: reqwest::Client,
    pub base_url: String,
    token: String,
}

impl Http {
    pub fn new(token: &str, base_url: String) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bot {}", token);
        let auth = HeaderValue::from_str(&auth_value).map_err(|_| ClientError::InvalidToken)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn get_token(&self) -> &str {
        &self.token
    }

    pub async fn get_gateway(&self) -> Result<String, ClientError> {
        let url = format!("{}/gateway/bot", self.base_url);
        let res: GatewayBotResponse = read(self.client.get(&url).send().await?).await?;
        Ok(res.url)
    }
}

#[async_trait]
impl ServerApi for Http {
    async fn send_message(
        &self,
        channel_id: &str,
        payload: MessageCreatePayload,
    ) -> Result<Message, ClientError> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);
        read(self.client.post(&url).json(&payload).send().await?).await
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ClientError> {
        let emoji: String = url::form_urlencoded::byte_serialize(emoji.as_bytes()).collect();
        let url = format!(
            "{}/channels/{}/messages/{}/reactions/{}/@me",
            self.base_url, channel_id, message_id, emoji
        );
        check(self.client.put(&url).body("").send().await?).await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<User, ClientError> {
        let url = format!("{}/users/{}", self.base_url, user_id);
        read(self.client.get(&url).send().await?).await
    }

    async fn get_guild(&self, guild_id: &str) -> Result<Guild, ClientError> {
        let url = format!("{}/guilds/{}?with_counts=true", self.base_url, guild_id);
        read(self.client.get(&url).send().await?).await
    }

    async fn get_guild_member(&self, guild_id: &str, user_id: &str) -> Result<Member, ClientError> {
        let url = format!("{}/guilds/{}/members/{}", self.base_url, guild_id, user_id);
        read(self.client.get(&url).send().await?).await
    }

    async fn get_guild_members(&self, guild_id: &str) -> Result<Vec<Member>, ClientError> {
        let url = format!("{}/guilds/{}/members?limit=1000", self.base_url, guild_id);
        read(self.client.get(&url).send().await?).await
    }

    async fn get_guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>, ClientError> {
        let url = format!("{}/guilds/{}/channels", self.base_url, guild_id);
        read(self.client.get(&url).send().await?).await
    }

    async fn create_role(
        &self,
        guild_id: &str,
        payload: CreateRolePayload,
    ) -> Result<Role, ClientError> {
        let url = format!("{}/guilds/{}/roles", self.base_url, guild_id);
        read(self.client.post(&url).json(&payload).send().await?).await
    }

    async fn add_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/guilds/{}/members/{}/roles/{}",
            self.base_url, guild_id, user_id, role_id
        );
        check(self.client.put(&url).body("").send().await?).await?;
        Ok(())
    }

    async fn edit_member(
        &self,
        guild_id: &str,
        user_id: &str,
        payload: EditMemberPayload,
    ) -> Result<Member, ClientError> {
        let url = format!("{}/guilds/{}/members/{}", self.base_url, guild_id, user_id);
        read(self.client.patch(&url).json(&payload).send().await?).await
    }

    async fn edit_channel_permissions(
        &self,
        channel_id: &str,
        overwrite_id: &str,
        payload: EditOverwritePayload,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/channels/{}/permissions/{}",
            self.base_url, channel_id, overwrite_id
        );
        check(self.client.put(&url).json(&payload).send().await?).await?;
        Ok(())
    }

    async fn create_dm(&self, user_id: &str) -> Result<Channel, ClientError> {
        let url = format!("{}/users/@me/channels", self.base_url);
        let body = json!({ "recipient_id": user_id });
        read(self.client.post(&url).json(&body).send().await?).await
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(status.as_u16(), body))
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = check(response).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// 403 and 404 get their own variants; commands branch on them.
fn classify(status: u16, body: String) -> ClientError {
    match status {
        403 => ClientError::Forbidden(body),
        404 => ClientError::NotFound(body),
        _ => ClientError::Api(format!("HTTP {}: {}", status, body)),
    }
}
