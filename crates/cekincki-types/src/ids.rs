//! Strongly-typed identifiers for Discord entities
//!
//! Discord ids are 64-bit snowflakes transported as decimal strings. They are
//! kept as strings and wrapped in newtype structs for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a Discord user
    UserId
);
snowflake_id!(
    /// Identifier of a guild role
    RoleId
);
snowflake_id!(
    /// Identifier of a guild (server)
    GuildId
);
snowflake_id!(
    /// Identifier of a text channel or DM channel
    ChannelId
);
snowflake_id!(
    /// Identifier of the bot application
    ApplicationId
);

impl GuildId {
    /// The `@everyone` role shares its id with the guild.
    pub fn everyone_role(&self) -> RoleId {
        RoleId(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_snowflake() {
        let id = UserId::new("80351110224678912");
        assert_eq!(id.to_string(), "80351110224678912");
    }

    #[test]
    fn test_serde_transparent() {
        let id = RoleId::new("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        let back: RoleId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_everyone_role_matches_guild() {
        let guild = GuildId::new("1000");
        assert_eq!(guild.everyone_role().as_str(), "1000");
    }
}
