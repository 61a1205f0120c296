//! Discord API v10 payloads (only the fields the daemon reads)

use cekincki_types::{ChannelId, GuildId, GuildMember, RoleId, RoleInfo, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

/// Guild member object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Absent in some interaction payloads
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl Member {
    pub fn into_guild_member(self) -> Option<GuildMember> {
        let user = self.user?;
        Some(GuildMember {
            user_id: user.id,
            username: user.username,
            discriminator: user.discriminator,
            global_name: user.global_name,
            nick: self.nick,
            bot: user.bot,
            role_ids: self.roles,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Permission bit set as a decimal string
    #[serde(default)]
    pub permissions: String,
    #[serde(default)]
    pub position: i64,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        RoleInfo {
            id: role.id,
            name: role.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Channel {
    pub id: ChannelId,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
}

/// Channel types that accept text messages
const TEXT_CHANNEL_TYPES: [u8; 9] = [0, 1, 2, 3, 5, 10, 11, 12, 13];

/// Minimal channel view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: Option<String>,
    pub text_based: bool,
}

impl From<Channel> for ChannelInfo {
    fn from(channel: Channel) -> Self {
        ChannelInfo {
            id: channel.id,
            name: channel.name,
            text_based: TEXT_CHANNEL_TYPES.contains(&channel.kind),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RateLimited {
    #[serde(default = "default_retry_after")]
    pub retry_after: f64,
}

fn default_retry_after() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_member_conversion() {
        let member: Member = serde_json::from_value(json!({
            "user": { "id": "1", "username": "ana", "discriminator": "0", "global_name": "Ana" },
            "nick": null,
            "roles": ["10", "11"],
            "joined_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let member = member.into_guild_member().unwrap();
        assert_eq!(member.display_name(), "Ana");
        assert_eq!(member.role_ids.len(), 2);
        assert!(!member.bot);
    }

    #[test]
    fn test_member_without_user() {
        let member: Member = serde_json::from_value(json!({ "roles": [] })).unwrap();
        assert!(member.into_guild_member().is_none());
    }

    #[test]
    fn test_channel_text_based() {
        let text: Channel =
            serde_json::from_value(json!({ "id": "5", "type": 0, "name": "general" })).unwrap();
        assert!(ChannelInfo::from(text).text_based);

        let category: Channel =
            serde_json::from_value(json!({ "id": "6", "type": 4, "name": "Info" })).unwrap();
        assert!(!ChannelInfo::from(category).text_based);
    }
}
