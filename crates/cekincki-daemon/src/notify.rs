//! Change notifications

use cekincki_discord::GuildGateway;
use cekincki_types::{render_template, ChannelId, GuildMember, NotificationContext, NotifyMode};
use std::sync::Arc;

/// What was delivered for one change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub dm_sent: bool,
    pub channel_sent: bool,
}

/// Delivers value-change messages; never fails
#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn GuildGateway>,
    mode: NotifyMode,
    channel_id: Option<ChannelId>,
    template: String,
}

impl Notifier {
    pub fn new(
        gateway: Arc<dyn GuildGateway>,
        mode: NotifyMode,
        channel_id: Option<ChannelId>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            mode,
            channel_id,
            template: template.into(),
        }
    }

    pub fn render(
        &self,
        member: &GuildMember,
        guild_name: &str,
        nickname: &str,
        old: i64,
        new: i64,
    ) -> String {
        let mention = member.mention();
        render_template(
            &self.template,
            &NotificationContext {
                nickname,
                old_value: old,
                new_value: new,
                guild_name,
                user_mention: &mention,
            },
        )
    }

    pub async fn notify(
        &self,
        member: &GuildMember,
        guild_name: &str,
        nickname: &str,
        old: i64,
        new: i64,
    ) -> NotifyOutcome {
        let content = self.render(member, guild_name, nickname, old, new);
        let mut outcome = NotifyOutcome::default();

        if self.mode.sends_dm() {
            match self.gateway.send_dm(&member.user_id, &content).await {
                Ok(()) => {
                    tracing::info!(user = %member.tag(), "DM sent");
                    outcome.dm_sent = true;
                }
                Err(e) => {
                    tracing::info!(user = %member.tag(), error = %e, "DM failed");
                }
            }
            if self.mode == NotifyMode::Dm {
                return outcome;
            }
        }

        if let (true, Some(channel_id)) = (self.mode.sends_channel(), &self.channel_id) {
            outcome.channel_sent = self.send_to_channel(channel_id, &content).await;
        }

        outcome
    }

    async fn send_to_channel(&self, channel_id: &ChannelId, content: &str) -> bool {
        let channel = match self.gateway.channel(channel_id).await {
            Ok(Some(channel)) if channel.text_based => channel,
            Ok(_) => {
                tracing::info!(
                    channel_id = %channel_id,
                    "Notify channel missing or not text based"
                );
                return false;
            }
            Err(e) => {
                tracing::info!(channel_id = %channel_id, error = %e, "Channel send failed");
                return false;
            }
        };

        match self.gateway.send_channel_message(channel_id, content).await {
            Ok(()) => {
                let name = channel.name.as_deref().unwrap_or(channel_id.as_str());
                tracing::info!(channel = %name, "Channel message sent");
                true
            }
            Err(e) => {
                tracing::info!(channel_id = %channel_id, error = %e, "Channel send failed");
                false
            }
        }
    }
}
