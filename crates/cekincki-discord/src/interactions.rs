//! Slash command definitions, interaction payloads and request verification
//!
//! Discord signs every request to the interactions endpoint with Ed25519
//! over `timestamp || body`; requests that fail verification must be
//! rejected with 401 or Discord disables the endpoint.

use crate::error::{DiscordError, DiscordResult};
use crate::model::{Member, User};
use cekincki_types::{ApplicationId, GuildId, UserId};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response flag that hides a message from everyone but the invoker
const EPHEMERAL: u64 = 1 << 6;

// ========== Incoming interactions ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    Other(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => InteractionType::Ping,
            2 => InteractionType::ApplicationCommand,
            other => InteractionType::Other(other),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(value: InteractionType) -> Self {
        match value {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::Other(other) => other,
        }
    }
}

/// An interaction delivered to the HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub application_id: ApplicationId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
    /// Set when invoked inside a guild
    #[serde(default)]
    pub member: Option<Member>,
    /// Set when invoked in a DM
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

/// A resolved option value as sent by Discord
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Interaction {
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.name.as_str())
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(Value::as_str)
    }

    /// Integer option; numeric strings are accepted too
    pub fn option_i64(&self, name: &str) -> Option<i64> {
        match self.option(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn invoker_id(&self) -> Option<&UserId> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
            .map(|u| &u.id)
    }
}

// ========== Responses ==========

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: 1, data: None }
    }

    pub fn message(content: impl Into<String>, ephemeral: bool) -> Self {
        let mut data = json!({ "content": content.into() });
        if ephemeral {
            data["flags"] = json!(EPHEMERAL);
        }
        Self {
            kind: 4,
            data: Some(data),
        }
    }

    /// "Bot is thinking"; the real answer follows as an edit of the original
    pub fn deferred(ephemeral: bool) -> Self {
        Self {
            kind: 5,
            data: ephemeral.then(|| json!({ "flags": EPHEMERAL })),
        }
    }
}

// ========== Command registration ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum CommandOptionType {
    String,
    Integer,
    User,
}

impl From<CommandOptionType> for u8 {
    fn from(value: CommandOptionType) -> Self {
        match value {
            CommandOptionType::String => 3,
            CommandOptionType::Integer => 4,
            CommandOptionType::User => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOptionDefinition {
    #[serde(rename = "type")]
    pub kind: CommandOptionType,
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl CommandOptionDefinition {
    pub fn new(kind: CommandOptionType, name: &str, description: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            required: true,
        }
    }
}

/// A chat input command as registered through the bulk overwrite endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
    pub dm_permission: bool,
}

impl CommandDefinition {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            options: Vec::new(),
            default_member_permissions: None,
            dm_permission: false,
        }
    }

    pub fn option(mut self, option: CommandOptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    pub fn default_member_permissions(mut self, bits: u64) -> Self {
        self.default_member_permissions = Some(bits.to_string());
        self
    }
}

// ========== Verification ==========

/// Check `X-Signature-Ed25519` against `timestamp || body`
pub fn verify_interaction_signature(
    public_key_hex: &str,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> DiscordResult<()> {
    let key_bytes: [u8; 32] = hex::decode(public_key_hex.trim())
        .map_err(|e| DiscordError::Config(format!("Invalid DISCORD_PUBLIC_KEY: {}", e)))?
        .try_into()
        .map_err(|_| DiscordError::Config("DISCORD_PUBLIC_KEY must be 32 bytes".to_string()))?;
    let key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| DiscordError::Config(format!("Invalid DISCORD_PUBLIC_KEY: {}", e)))?;

    let sig_bytes: [u8; 64] = hex::decode(signature_hex.trim())
        .map_err(|e| DiscordError::InvalidSignature(e.to_string()))?
        .try_into()
        .map_err(|_| DiscordError::InvalidSignature("signature must be 64 bytes".to_string()))?;
    let signature = Signature::from_bytes(&sig_bytes);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify(&message, &signature)
        .map_err(|e| DiscordError::InvalidSignature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signed(body: &[u8], timestamp: &str) -> (String, String) {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = key.sign(&message);
        (
            hex::encode(key.verifying_key().to_bytes()),
            hex::encode(signature.to_bytes()),
        )
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"type":1}"#;
        let (public_key, signature) = signed(body, "1700000000");
        let result = verify_interaction_signature(&public_key, &signature, "1700000000", body);
        assert!(result.is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let (public_key, signature) = signed(br#"{"type":1}"#, "1700000000");
        let result =
            verify_interaction_signature(&public_key, &signature, "1700000000", br#"{"type":2}"#);
        assert!(matches!(result, Err(DiscordError::InvalidSignature(_))));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let (public_key, _) = signed(b"{}", "1");
        let result = verify_interaction_signature(&public_key, "zz", "1", b"{}");
        assert!(matches!(result, Err(DiscordError::InvalidSignature(_))));
    }

    #[test]
    fn test_bad_public_key_is_config_error() {
        let result = verify_interaction_signature("abcd", &"00".repeat(64), "1", b"{}");
        assert!(matches!(result, Err(DiscordError::Config(_))));
    }

    #[test]
    fn test_parse_command_interaction() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "900",
            "type": 2,
            "application_id": "42",
            "guild_id": "100",
            "token": "tok",
            "data": {
                "name": "set_cekincki",
                "options": [
                    { "name": "user", "type": 6, "value": "7" },
                    { "name": "value", "type": 4, "value": 25 }
                ]
            },
            "member": { "user": { "id": "1", "username": "mod" }, "roles": [] }
        }))
        .unwrap();

        assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
        assert_eq!(interaction.command_name(), Some("set_cekincki"));
        assert_eq!(interaction.option_str("user"), Some("7"));
        assert_eq!(interaction.option_i64("value"), Some(25));
        assert_eq!(interaction.invoker_id().map(|u| u.as_str()), Some("1"));
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(
            serde_json::to_value(InteractionResponse::pong()).unwrap(),
            json!({ "type": 1 })
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred(true)).unwrap(),
            json!({ "type": 5, "data": { "flags": 64 } })
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::message("hi", false)).unwrap(),
            json!({ "type": 4, "data": { "content": "hi" } })
        );
    }

    #[test]
    fn test_command_definition_serialization() {
        let command = CommandDefinition::new("set_cekincki", "Set a value")
            .option(CommandOptionDefinition::new(CommandOptionType::User, "user", "Member"))
            .option(CommandOptionDefinition::new(CommandOptionType::Integer, "value", "New value"))
            .default_member_permissions(1 << 28);

        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["options"][0]["type"], 6);
        assert_eq!(value["options"][1]["type"], 4);
        assert_eq!(value["default_member_permissions"], "268435456");
        assert_eq!(value["dm_permission"], false);
    }
}
