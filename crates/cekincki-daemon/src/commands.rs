//! Slash commands
//!
//! Commands are acknowledged with a deferred ephemeral response; the work
//! runs in the background and the result replaces the original response.

use crate::roles::SkipReason;
use crate::scheduler::Reconciler;
use async_trait::async_trait;
use cekincki_discord::{
    CommandDefinition, CommandOptionDefinition, CommandOptionType, DiscordClient, DiscordResult,
    Interaction, InteractionResponse, InteractionType, Permissions,
};
use cekincki_types::{ApplicationId, UserId};
use std::sync::Arc;

pub const SYNC_SHEET: &str = "sync_sheet";
pub const SET_CEKINCKI: &str = "set_cekincki";
pub const UPDATE_ROLES: &str = "update_roles";

/// Guild commands registered by `register-commands`
pub fn command_definitions() -> Vec<CommandDefinition> {
    let manage_roles = Permissions::MANAGE_ROLES.bits();
    vec![
        CommandDefinition::new(
            SYNC_SHEET,
            "Add all server members to the Google Sheet (no duplicates).",
        )
        .default_member_permissions(manage_roles),
        CommandDefinition::new(
            SET_CEKINCKI,
            "Set cekinčki value for a user and update their cekinčki role",
        )
        .option(CommandOptionDefinition::new(
            CommandOptionType::User,
            "user",
            "User to set",
        ))
        .option(CommandOptionDefinition::new(
            CommandOptionType::Integer,
            "value",
            "Integer value",
        ))
        .default_member_permissions(manage_roles),
        CommandDefinition::new(UPDATE_ROLES, "Update all member cekinčki roles from the Sheet")
            .default_member_permissions(manage_roles),
    ]
}

/// Delivers the final answer of a deferred interaction
#[async_trait]
pub trait Followup: Send + Sync {
    async fn edit_original(
        &self,
        application_id: &ApplicationId,
        interaction_token: &str,
        content: &str,
    ) -> DiscordResult<()>;
}

#[async_trait]
impl Followup for DiscordClient {
    async fn edit_original(
        &self,
        application_id: &ApplicationId,
        interaction_token: &str,
        content: &str,
    ) -> DiscordResult<()> {
        self.edit_original_interaction_response(application_id, interaction_token, content)
            .await
    }
}

/// Runs slash commands against the reconciler
#[derive(Clone)]
pub struct CommandHandler {
    reconciler: Arc<Reconciler>,
    followup: Arc<dyn Followup>,
}

impl CommandHandler {
    pub fn new(reconciler: Arc<Reconciler>, followup: Arc<dyn Followup>) -> Self {
        Self {
            reconciler,
            followup,
        }
    }

    /// Answer an interaction; command work continues in the background
    pub fn dispatch(&self, interaction: Interaction) -> InteractionResponse {
        match interaction.kind {
            InteractionType::Ping => InteractionResponse::pong(),
            InteractionType::ApplicationCommand => {
                let known = matches!(
                    interaction.command_name(),
                    Some(SYNC_SHEET | SET_CEKINCKI | UPDATE_ROLES)
                );
                if !known {
                    return InteractionResponse::message("Unknown command.", true);
                }

                let handler = self.clone();
                tokio::spawn(async move {
                    handler.run_and_reply(interaction).await;
                });
                InteractionResponse::deferred(true)
            }
            InteractionType::Other(kind) => {
                tracing::debug!(kind, "Ignoring unsupported interaction type");
                InteractionResponse::message("Unsupported interaction.", true)
            }
        }
    }

    async fn run_and_reply(&self, interaction: Interaction) {
        let content = self.execute(&interaction).await;
        if let Err(e) = self
            .followup
            .edit_original(&interaction.application_id, &interaction.token, &content)
            .await
        {
            tracing::warn!(
                interaction_id = %interaction.id,
                error = %e,
                "Failed to deliver command result"
            );
        }
    }

    /// Run the command and produce the reply text
    pub async fn execute(&self, interaction: &Interaction) -> String {
        let command = interaction.command_name().unwrap_or_default();
        tracing::info!(
            command = %command,
            invoker = ?interaction.invoker_id().map(|u| u.as_str()),
            "Running command"
        );

        match command {
            SYNC_SHEET => match self.reconciler.add_missing_members().await {
                Ok(outcome) => format!(
                    "Inserted {} of {} members.",
                    outcome.inserted, outcome.total_members
                ),
                Err(e) => failed(e),
            },
            SET_CEKINCKI => {
                let (Some(user), Some(value)) =
                    (interaction.option_str("user"), interaction.option_i64("value"))
                else {
                    return "Both user and value are required.".to_string();
                };
                match self
                    .reconciler
                    .set_member_value(&UserId::new(user), value)
                    .await
                {
                    Ok(update) => {
                        let role = match (update.role.reason, update.role.target_name.as_deref()) {
                            (Some(SkipReason::MissingPermission), _) => {
                                "not changed (bot lacks Manage Roles)".to_string()
                            }
                            (Some(SkipReason::TargetRoleMissing), Some(name)) => {
                                format!("could not create '{}'", name)
                            }
                            (_, Some(name)) => format!("'{}'", name),
                            (_, None) => "unchanged".to_string(),
                        };
                        format!("Set {} to {}. Role: {}.", update.nickname, update.value, role)
                    }
                    Err(e) => failed(e),
                }
            }
            UPDATE_ROLES => {
                let report = self.reconciler.sync_guild().await;
                match report.error {
                    None => format!("Updated roles for {} member(s).", report.updated),
                    Some(e) => format!("Failed: {}", e),
                }
            }
            other => format!("Unknown command: {}", other),
        }
    }
}

fn failed(e: impl std::fmt::Display) -> String {
    tracing::warn!(error = %e, "Command failed");
    format!("Failed: {}", e)
}
