//! Guild operations used by the synchronizer

use crate::client::DiscordClient;
use crate::error::{DiscordError, DiscordResult};
use crate::model::ChannelInfo;
use crate::permissions::{compute_member_permissions, Permissions};
use async_trait::async_trait;
use cekincki_types::{ChannelId, GuildId, GuildMember, RoleId, RoleInfo, UserId};

const CREATE_ROLE_REASON: &str = "Ensure cekincki role exists";
const SYNC_ROLE_REASON: &str = "Cekincki role sync";

/// One guild, seen through the bot account
#[async_trait]
pub trait GuildGateway: Send + Sync {
    async fn guild_name(&self) -> DiscordResult<String>;

    /// All members, bots included
    async fn members(&self) -> DiscordResult<Vec<GuildMember>>;

    /// A single member; `None` when the user is not in the guild
    async fn member(&self, user_id: &UserId) -> DiscordResult<Option<GuildMember>>;

    async fn roles(&self) -> DiscordResult<Vec<RoleInfo>>;

    /// Whether the bot holds Manage Roles in this guild
    async fn can_manage_roles(&self) -> DiscordResult<bool>;

    async fn create_role(&self, name: &str) -> DiscordResult<RoleInfo>;

    async fn add_role(&self, user_id: &UserId, role_id: &RoleId) -> DiscordResult<()>;

    async fn remove_role(&self, user_id: &UserId, role_id: &RoleId) -> DiscordResult<()>;

    async fn send_dm(&self, user_id: &UserId, content: &str) -> DiscordResult<()>;

    /// `None` when the channel does not exist or is not visible
    async fn channel(&self, channel_id: &ChannelId) -> DiscordResult<Option<ChannelInfo>>;

    async fn send_channel_message(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> DiscordResult<()>;
}

/// `GuildGateway` over the REST API
#[derive(Debug, Clone)]
pub struct DiscordGateway {
    client: DiscordClient,
    guild_id: GuildId,
}

impl DiscordGateway {
    pub fn new(client: DiscordClient, guild_id: GuildId) -> Self {
        Self { client, guild_id }
    }
}

#[async_trait]
impl GuildGateway for DiscordGateway {
    async fn guild_name(&self) -> DiscordResult<String> {
        Ok(self.client.guild(&self.guild_id).await?.name)
    }

    async fn members(&self) -> DiscordResult<Vec<GuildMember>> {
        let members = self.client.list_members(&self.guild_id).await?;
        Ok(members
            .into_iter()
            .filter_map(|m| m.into_guild_member())
            .collect())
    }

    async fn member(&self, user_id: &UserId) -> DiscordResult<Option<GuildMember>> {
        match self.client.guild_member(&self.guild_id, user_id).await {
            Ok(member) => Ok(member.into_guild_member()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn roles(&self) -> DiscordResult<Vec<RoleInfo>> {
        let roles = self.client.list_roles(&self.guild_id).await?;
        Ok(roles.into_iter().map(RoleInfo::from).collect())
    }

    async fn can_manage_roles(&self) -> DiscordResult<bool> {
        let me = self.client.current_user().await?;
        let guild = self.client.guild(&self.guild_id).await?;
        let member = self
            .client
            .guild_member(&self.guild_id, &me.id)
            .await?
            .into_guild_member()
            .ok_or_else(|| DiscordError::Config("bot member payload without user".to_string()))?;

        let perms = compute_member_permissions(&guild, &member, &guild.roles);
        Ok(perms.contains(Permissions::MANAGE_ROLES))
    }

    async fn create_role(&self, name: &str) -> DiscordResult<RoleInfo> {
        let role = self
            .client
            .create_role(&self.guild_id, name, CREATE_ROLE_REASON)
            .await?;
        tracing::info!(role = %role.name, role_id = %role.id, "Created role");
        Ok(role.into())
    }

    async fn add_role(&self, user_id: &UserId, role_id: &RoleId) -> DiscordResult<()> {
        self.client
            .add_member_role(&self.guild_id, user_id, role_id, SYNC_ROLE_REASON)
            .await
    }

    async fn remove_role(&self, user_id: &UserId, role_id: &RoleId) -> DiscordResult<()> {
        self.client
            .remove_member_role(&self.guild_id, user_id, role_id, SYNC_ROLE_REASON)
            .await
    }

    async fn send_dm(&self, user_id: &UserId, content: &str) -> DiscordResult<()> {
        let channel_id = self.client.open_dm(user_id).await?;
        self.client.send_message(&channel_id, content).await
    }

    async fn channel(&self, channel_id: &ChannelId) -> DiscordResult<Option<ChannelInfo>> {
        match self.client.channel(channel_id).await {
            Ok(channel) => Ok(Some(channel)),
            Err(e) if e.is_not_found() || e.is_forbidden() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send_channel_message(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> DiscordResult<()> {
        self.client.send_message(channel_id, content).await
    }
}
