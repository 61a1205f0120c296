//! In-memory guild for development and testing

use crate::error::{DiscordError, DiscordResult};
use crate::gateway::GuildGateway;
use crate::model::ChannelInfo;
use async_trait::async_trait;
use cekincki_types::{ChannelId, GuildMember, RoleId, RoleInfo, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A fake guild that records every mutation
#[derive(Debug)]
pub struct InMemoryGuild {
    name: String,
    members: Arc<RwLock<Vec<GuildMember>>>,
    roles: Arc<RwLock<Vec<RoleInfo>>>,
    channels: Arc<RwLock<HashMap<ChannelId, ChannelInfo>>>,
    dms: Arc<RwLock<Vec<(UserId, String)>>>,
    channel_messages: Arc<RwLock<Vec<(ChannelId, String)>>>,
    dm_blocked: Arc<RwLock<HashSet<UserId>>>,
    manage_roles: AtomicBool,
    fail_role_creation: AtomicBool,
    fail_members: AtomicBool,
    role_creations: AtomicU64,
    next_id: AtomicU64,
}

impl InMemoryGuild {
    /// A guild where the bot may manage roles
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Arc::new(RwLock::new(Vec::new())),
            roles: Arc::new(RwLock::new(Vec::new())),
            channels: Arc::new(RwLock::new(HashMap::new())),
            dms: Arc::new(RwLock::new(Vec::new())),
            channel_messages: Arc::new(RwLock::new(Vec::new())),
            dm_blocked: Arc::new(RwLock::new(HashSet::new())),
            manage_roles: AtomicBool::new(true),
            fail_role_creation: AtomicBool::new(false),
            fail_members: AtomicBool::new(false),
            role_creations: AtomicU64::new(0),
            next_id: AtomicU64::new(1_000),
        }
    }

    pub async fn add_member(&self, member: GuildMember) {
        let mut members = self.members.write().await;
        members.retain(|m| m.user_id != member.user_id);
        members.push(member);
    }

    pub async fn set_nick(&self, user_id: &UserId, nick: &str) {
        if let Some(member) = self
            .members
            .write()
            .await
            .iter_mut()
            .find(|m| &m.user_id == user_id)
        {
            member.nick = Some(nick.to_string());
        }
    }

    /// Register an existing role and return its id
    pub async fn add_existing_role(&self, name: &str) -> RoleId {
        let role = RoleInfo::new(self.fresh_id(), name);
        let id = role.id.clone();
        self.roles.write().await.push(role);
        id
    }

    pub async fn add_channel(&self, id: &str, name: &str, text_based: bool) {
        let channel = ChannelInfo {
            id: ChannelId::new(id),
            name: Some(name.to_string()),
            text_based,
        };
        self.channels.write().await.insert(channel.id.clone(), channel);
    }

    pub fn set_manage_roles(&self, allowed: bool) {
        self.manage_roles.store(allowed, Ordering::SeqCst);
    }

    pub fn set_fail_role_creation(&self, failing: bool) {
        self.fail_role_creation.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_members(&self, failing: bool) {
        self.fail_members.store(failing, Ordering::SeqCst);
    }

    /// Make DMs to `user_id` fail as if the user closed their DMs
    pub async fn block_dms(&self, user_id: &UserId) {
        self.dm_blocked.write().await.insert(user_id.clone());
    }

    pub async fn member_now(&self, user_id: &UserId) -> Option<GuildMember> {
        self.members
            .read()
            .await
            .iter()
            .find(|m| &m.user_id == user_id)
            .cloned()
    }

    /// Names of the roles `user_id` currently holds, sorted
    pub async fn member_role_names(&self, user_id: &UserId) -> Vec<String> {
        let Some(member) = self.member_now(user_id).await else {
            return Vec::new();
        };
        let roles = self.roles.read().await;
        let mut names: Vec<String> = roles
            .iter()
            .filter(|r| member.has_role(&r.id))
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        names
    }

    pub async fn role_names(&self) -> Vec<String> {
        self.roles.read().await.iter().map(|r| r.name.clone()).collect()
    }

    pub async fn dms(&self) -> Vec<(UserId, String)> {
        self.dms.read().await.clone()
    }

    pub async fn channel_messages(&self) -> Vec<(ChannelId, String)> {
        self.channel_messages.read().await.clone()
    }

    pub fn role_creations(&self) -> u64 {
        self.role_creations.load(Ordering::SeqCst)
    }

    fn fresh_id(&self) -> RoleId {
        RoleId::new(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    fn forbidden(message: &str) -> DiscordError {
        DiscordError::Api {
            status: 403,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl GuildGateway for InMemoryGuild {
    async fn guild_name(&self) -> DiscordResult<String> {
        Ok(self.name.clone())
    }

    async fn members(&self) -> DiscordResult<Vec<GuildMember>> {
        if self.fail_members.load(Ordering::SeqCst) {
            return Err(DiscordError::Api {
                status: 503,
                message: "members unavailable".to_string(),
            });
        }
        Ok(self.members.read().await.clone())
    }

    async fn member(&self, user_id: &UserId) -> DiscordResult<Option<GuildMember>> {
        Ok(self.member_now(user_id).await)
    }

    async fn roles(&self) -> DiscordResult<Vec<RoleInfo>> {
        Ok(self.roles.read().await.clone())
    }

    async fn can_manage_roles(&self) -> DiscordResult<bool> {
        Ok(self.manage_roles.load(Ordering::SeqCst))
    }

    async fn create_role(&self, name: &str) -> DiscordResult<RoleInfo> {
        if self.fail_role_creation.load(Ordering::SeqCst) {
            return Err(Self::forbidden("Missing Permissions"));
        }
        let role = RoleInfo::new(self.fresh_id(), name);
        self.roles.write().await.push(role.clone());
        self.role_creations.fetch_add(1, Ordering::SeqCst);
        Ok(role)
    }

    async fn add_role(&self, user_id: &UserId, role_id: &RoleId) -> DiscordResult<()> {
        let mut members = self.members.write().await;
        let member = members
            .iter_mut()
            .find(|m| &m.user_id == user_id)
            .ok_or_else(|| DiscordError::Api {
                status: 404,
                message: "Unknown Member".to_string(),
            })?;
        if !member.has_role(role_id) {
            member.role_ids.push(role_id.clone());
        }
        Ok(())
    }

    async fn remove_role(&self, user_id: &UserId, role_id: &RoleId) -> DiscordResult<()> {
        let mut members = self.members.write().await;
        if let Some(member) = members.iter_mut().find(|m| &m.user_id == user_id) {
            member.role_ids.retain(|r| r != role_id);
        }
        Ok(())
    }

    async fn send_dm(&self, user_id: &UserId, content: &str) -> DiscordResult<()> {
        if self.dm_blocked.read().await.contains(user_id) {
            return Err(Self::forbidden("Cannot send messages to this user"));
        }
        self.dms
            .write()
            .await
            .push((user_id.clone(), content.to_string()));
        Ok(())
    }

    async fn channel(&self, channel_id: &ChannelId) -> DiscordResult<Option<ChannelInfo>> {
        Ok(self.channels.read().await.get(channel_id).cloned())
    }

    async fn send_channel_message(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> DiscordResult<()> {
        if !self.channels.read().await.contains_key(channel_id) {
            return Err(DiscordError::Api {
                status: 404,
                message: "Unknown Channel".to_string(),
            });
        }
        self.channel_messages
            .write()
            .await
            .push((channel_id.clone(), content.to_string()));
        Ok(())
    }
}
