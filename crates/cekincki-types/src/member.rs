//! Guild member and role views

use crate::ids::{RoleId, UserId};
use serde::{Deserialize, Serialize};

/// A guild member as seen by the synchronizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMember {
    /// User id
    pub user_id: UserId,

    /// Account username
    pub username: String,

    /// Legacy discriminator (`"0"` for migrated accounts)
    #[serde(default)]
    pub discriminator: Option<String>,

    /// Global display name
    #[serde(default)]
    pub global_name: Option<String>,

    /// Guild-specific nickname
    #[serde(default)]
    pub nick: Option<String>,

    /// Whether the account is a bot
    #[serde(default)]
    pub bot: bool,

    /// Roles currently held by the member
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl GuildMember {
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            discriminator: None,
            global_name: None,
            nick: None,
            bot: false,
            role_ids: Vec::new(),
        }
    }

    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    pub fn with_global_name(mut self, name: impl Into<String>) -> Self {
        self.global_name = Some(name.into());
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.role_ids = roles.into_iter().collect();
        self
    }

    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// Name shown in the guild; this is the key rows are matched on.
    pub fn display_name(&self) -> &str {
        [self.nick.as_deref(), self.global_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    /// `username#1234` for legacy accounts, plain username otherwise
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if !d.is_empty() && d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.user_id)
    }

    pub fn has_role(&self, role_id: &RoleId) -> bool {
        self.role_ids.iter().any(|r| r == role_id)
    }
}

/// A guild role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
}

impl RoleInfo {
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_nick() {
        let member = GuildMember::new("1", "ana")
            .with_global_name("Ana G")
            .with_nick("Anči");
        assert_eq!(member.display_name(), "Anči");
    }

    #[test]
    fn test_display_name_falls_back_to_global_then_username() {
        let member = GuildMember::new("1", "ana").with_global_name("Ana G");
        assert_eq!(member.display_name(), "Ana G");

        let member = GuildMember::new("1", "ana");
        assert_eq!(member.display_name(), "ana");
    }

    #[test]
    fn test_empty_nick_is_ignored() {
        let member = GuildMember::new("1", "ana").with_nick("");
        assert_eq!(member.display_name(), "ana");
    }

    #[test]
    fn test_tag() {
        let mut member = GuildMember::new("1", "ana");
        assert_eq!(member.tag(), "ana");

        member.discriminator = Some("0".to_string());
        assert_eq!(member.tag(), "ana");

        member.discriminator = Some("4821".to_string());
        assert_eq!(member.tag(), "ana#4821");
    }

    #[test]
    fn test_mention() {
        let member = GuildMember::new("123", "ana");
        assert_eq!(member.mention(), "<@123>");
    }
}
