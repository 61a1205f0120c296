//! Discord adapter for the cekincki daemon
//!
//! Everything goes through the REST API with a bot token; no gateway
//! connection is held. The crate provides:
//! - `DiscordClient`: rate-limit aware REST client
//! - `GuildGateway`: the guild operations the synchronizer needs, implemented
//!   by `DiscordGateway` (REST) and `InMemoryGuild` (tests)
//! - Permission math for the bot's effective guild permissions
//! - Interaction payloads, responses and Ed25519 request verification

pub mod client;
pub mod error;
pub mod gateway;
pub mod interactions;
pub mod memory;
pub mod model;
pub mod permissions;

pub use client::{DiscordClient, DEFAULT_DISCORD_API_BASE};
pub use error::{DiscordError, DiscordResult};
pub use gateway::{DiscordGateway, GuildGateway};
pub use interactions::{
    verify_interaction_signature, CommandDefinition, CommandOption, CommandOptionDefinition,
    CommandOptionType, Interaction, InteractionData, InteractionResponse, InteractionType,
};
pub use memory::InMemoryGuild;
pub use model::{ChannelInfo, Guild, Member, Role, User};
pub use permissions::{compute_member_permissions, Permissions};
