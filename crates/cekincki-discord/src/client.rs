//! HTTP client for the Discord REST API

use crate::error::{DiscordError, DiscordResult};
use crate::interactions::CommandDefinition;
use crate::model::{Channel, ChannelInfo, Guild, Member, RateLimited, Role, User};
use cekincki_types::{ApplicationId, ChannelId, GuildId, RoleId, UserId};
use reqwest::{header::AUTHORIZATION, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

const MEMBER_PAGE_SIZE: usize = 1000;
const MAX_RATE_LIMIT_RETRIES: u32 = 3;
const MAX_RETRY_WAIT_SECS: f64 = 60.0;
const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// REST client authenticated as a bot
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
    token: String,
    max_retries: u32,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl DiscordClient {
    /// Create a client against the public API
    pub fn new(token: impl Into<String>) -> DiscordResult<Self> {
        Self::with_base_url(token, DEFAULT_DISCORD_API_BASE)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> DiscordResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DiscordError::Config("Missing DISCORD_TOKEN".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(
                "DiscordBot (https://github.com/cekincki/cekincki-bot, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            max_retries: MAX_RATE_LIMIT_RETRIES,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    // ========== Users ==========

    pub async fn current_user(&self) -> DiscordResult<User> {
        self.get("/users/@me").await
    }

    // ========== Guilds ==========

    pub async fn guild(&self, guild_id: &GuildId) -> DiscordResult<Guild> {
        self.get(&format!("/guilds/{}", guild_id)).await
    }

    pub async fn guild_member(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
    ) -> DiscordResult<Member> {
        self.get(&format!("/guilds/{}/members/{}", guild_id, user_id))
            .await
    }

    /// Every member of the guild, following the `after` cursor
    pub async fn list_members(&self, guild_id: &GuildId) -> DiscordResult<Vec<Member>> {
        let mut members = Vec::new();
        let mut after = String::from("0");

        loop {
            let page: Vec<Member> = self
                .get(&format!(
                    "/guilds/{}/members?limit={}&after={}",
                    guild_id, MEMBER_PAGE_SIZE, after
                ))
                .await?;

            let page_len = page.len();
            if let Some(last) = page.iter().rev().find_map(|m| m.user.as_ref()) {
                after = last.id.to_string();
            }
            members.extend(page);

            if page_len < MEMBER_PAGE_SIZE {
                break;
            }
        }

        tracing::debug!(guild_id = %guild_id, count = members.len(), "Fetched guild members");
        Ok(members)
    }

    // ========== Roles ==========

    pub async fn list_roles(&self, guild_id: &GuildId) -> DiscordResult<Vec<Role>> {
        self.get(&format!("/guilds/{}/roles", guild_id)).await
    }

    pub async fn create_role(
        &self,
        guild_id: &GuildId,
        name: &str,
        reason: &str,
    ) -> DiscordResult<Role> {
        let body = json!({ "name": name, "hoist": false, "mentionable": false });
        let response = self
            .execute(
                Method::POST,
                &format!("/guilds/{}/roles", guild_id),
                Some(&body),
                Some(reason),
            )
            .await?;
        Ok(response.json().await?)
    }

    pub async fn add_member_role(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        role_id: &RoleId,
        reason: &str,
    ) -> DiscordResult<()> {
        self.execute(
            Method::PUT,
            &format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id),
            None,
            Some(reason),
        )
        .await?;
        Ok(())
    }

    pub async fn remove_member_role(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        role_id: &RoleId,
        reason: &str,
    ) -> DiscordResult<()> {
        self.execute(
            Method::DELETE,
            &format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id),
            None,
            Some(reason),
        )
        .await?;
        Ok(())
    }

    // ========== Channels & messages ==========

    pub async fn channel(&self, channel_id: &ChannelId) -> DiscordResult<ChannelInfo> {
        let channel: Channel = self.get(&format!("/channels/{}", channel_id)).await?;
        Ok(channel.into())
    }

    /// Open (or reuse) the DM channel with a user
    pub async fn open_dm(&self, user_id: &UserId) -> DiscordResult<ChannelId> {
        let channel: Channel = self
            .post("/users/@me/channels", &json!({ "recipient_id": user_id }))
            .await?;
        Ok(channel.id)
    }

    pub async fn send_message(&self, channel_id: &ChannelId, content: &str) -> DiscordResult<()> {
        let body = json!({
            "content": content,
            "allowed_mentions": { "parse": ["users"] }
        });
        let _: Value = self
            .post(&format!("/channels/{}/messages", channel_id), &body)
            .await?;
        Ok(())
    }

    // ========== Application commands ==========

    /// Replace the application's guild commands with `commands`
    pub async fn register_guild_commands(
        &self,
        application_id: &ApplicationId,
        guild_id: &GuildId,
        commands: &[CommandDefinition],
    ) -> DiscordResult<usize> {
        let body = serde_json::to_value(commands)?;
        let response = self
            .execute(
                Method::PUT,
                &format!("/applications/{}/guilds/{}/commands", application_id, guild_id),
                Some(&body),
                None,
            )
            .await?;
        let registered: Vec<Value> = response.json().await?;
        Ok(registered.len())
    }

    /// Replace the deferred "thinking" response of an interaction
    pub async fn edit_original_interaction_response(
        &self,
        application_id: &ApplicationId,
        interaction_token: &str,
        content: &str,
    ) -> DiscordResult<()> {
        self.execute(
            Method::PATCH,
            &format!(
                "/webhooks/{}/{}/messages/@original",
                application_id, interaction_token
            ),
            Some(&json!({ "content": content })),
            None,
        )
        .await?;
        Ok(())
    }

    // ========== Internal HTTP helpers ==========

    async fn get<T: DeserializeOwned>(&self, path: &str) -> DiscordResult<T> {
        let response = self.execute(Method::GET, path, None, None).await?;
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> DiscordResult<T> {
        let response = self.execute(Method::POST, path, Some(body), None).await?;
        Ok(response.json().await?)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        reason: Option<&str>,
    ) -> DiscordResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header(AUTHORIZATION, format!("Bot {}", self.token));
            if let Some(reason) = reason {
                request = request.header(AUDIT_LOG_REASON, reason);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    return Err(DiscordError::RateLimited(format!("{} {}", method, path)));
                }
                let wait = response
                    .json::<RateLimited>()
                    .await
                    .map(|r| r.retry_after)
                    .unwrap_or(1.0)
                    .clamp(0.0, MAX_RETRY_WAIT_SECS);
                tracing::warn!(
                    method = %method,
                    path = %path,
                    retry_after = wait,
                    "Rate limited by Discord, retrying"
                );
                tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                attempt += 1;
                continue;
            }

            if status.is_success() {
                return Ok(response);
            }

            let message = response.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message,
            });
        }
    }
}
