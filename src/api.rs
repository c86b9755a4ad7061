//! The remote server-state operations the bot needs, as a trait so the
//! dispatcher and commands can run against a test double.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::model::*;

#[async_trait]
pub trait ServerApi: Send + Sync {
    async fn send_message(
        &self,
        channel_id: &str,
        payload: MessageCreatePayload,
    ) -> Result<Message, ClientError>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ClientError>;

    async fn get_user(&self, user_id: &str) -> Result<User, ClientError>;

    async fn get_guild(&self, guild_id: &str) -> Result<Guild, ClientError>;

    async fn get_guild_member(&self, guild_id: &str, user_id: &str) -> Result<Member, ClientError>;

    async fn get_guild_members(&self, guild_id: &str) -> Result<Vec<Member>, ClientError>;

    async fn get_guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>, ClientError>;

    async fn create_role(
        &self,
        guild_id: &str,
        payload: CreateRolePayload,
    ) -> Result<Role, ClientError>;

    async fn add_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ClientError>;

    async fn edit_member(
        &self,
        guild_id: &str,
        user_id: &str,
        payload: EditMemberPayload,
    ) -> Result<Member, ClientError>;

    async fn edit_channel_permissions(
        &self,
        channel_id: &str,
        overwrite_id: &str,
        payload: EditOverwritePayload,
    ) -> Result<(), ClientError>;

    async fn create_dm(&self, user_id: &str) -> Result<Channel, ClientError>;

    async fn say(&self, channel_id: &str, content: &str) -> Result<Message, ClientError> {
        self.send_message(channel_id, MessageCreatePayload::text(content)).await
    }

    async fn send_embed(&self, channel_id: &str, embed: Embed) -> Result<Message, ClientError> {
        self.send_message(channel_id, MessageCreatePayload::embed(embed)).await
    }
}
