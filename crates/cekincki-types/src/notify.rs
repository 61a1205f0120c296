//! Change notification modes and message templates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Template used when none is configured
pub const DEFAULT_NOTIFY_TEMPLATE: &str = "Tvoji čekinčki so se posodobili iz {old} na {new}.";

/// Where change notifications are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// Direct message to the member
    #[default]
    Dm,

    /// Message in the configured notification channel
    Channel,

    /// Direct message, then channel message
    Both,
}

impl NotifyMode {
    /// Case-insensitive parse; anything unrecognised is `Dm`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "channel" => NotifyMode::Channel,
            "both" => NotifyMode::Both,
            _ => NotifyMode::Dm,
        }
    }

    pub fn sends_dm(&self) -> bool {
        matches!(self, NotifyMode::Dm | NotifyMode::Both)
    }

    pub fn sends_channel(&self) -> bool {
        matches!(self, NotifyMode::Channel | NotifyMode::Both)
    }
}

impl fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyMode::Dm => f.write_str("dm"),
            NotifyMode::Channel => f.write_str("channel"),
            NotifyMode::Both => f.write_str("both"),
        }
    }
}

/// Values substituted into a notification template
#[derive(Debug, Clone)]
pub struct NotificationContext<'a> {
    pub nickname: &'a str,
    pub old_value: i64,
    pub new_value: i64,
    pub guild_name: &'a str,
    pub user_mention: &'a str,
}

/// Replace `{nickname}`, `{old}`, `{new}`, `{guild}` and `{userMention}`.
///
/// Every occurrence is replaced; unknown placeholders stay as written.
pub fn render_template(template: &str, ctx: &NotificationContext<'_>) -> String {
    let old = ctx.old_value.to_string();
    let new = ctx.new_value.to_string();
    let tokens: [(&str, &str); 5] = [
        ("{nickname}", ctx.nickname),
        ("{old}", &old),
        ("{new}", &new),
        ("{guild}", ctx.guild_name),
        ("{userMention}", ctx.user_mention),
    ];

    tokens
        .iter()
        .fold(template.to_string(), |msg, (token, value)| {
            msg.replace(token, value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> NotificationContext<'static> {
        NotificationContext {
            nickname: "Ana",
            old_value: 5,
            new_value: 12,
            guild_name: "Klub",
            user_mention: "<@1>",
        }
    }

    #[test]
    fn test_default_template() {
        assert_eq!(
            render_template(DEFAULT_NOTIFY_TEMPLATE, &ctx()),
            "Tvoji čekinčki so se posodobili iz 5 na 12."
        );
    }

    #[test]
    fn test_all_tokens_and_repeats() {
        let rendered = render_template(
            "{userMention} {nickname}@{guild}: {old}->{new} ({new}) {unknown}",
            &ctx(),
        );
        assert_eq!(rendered, "<@1> Ana@Klub: 5->12 (12) {unknown}");
    }

    #[test]
    fn test_notify_mode_parse_lenient() {
        assert_eq!(NotifyMode::parse_lenient("DM"), NotifyMode::Dm);
        assert_eq!(NotifyMode::parse_lenient("Channel"), NotifyMode::Channel);
        assert_eq!(NotifyMode::parse_lenient("both"), NotifyMode::Both);
        assert_eq!(NotifyMode::parse_lenient("pigeon"), NotifyMode::Dm);
    }

    #[test]
    fn test_notify_mode_targets() {
        assert!(NotifyMode::Both.sends_dm() && NotifyMode::Both.sends_channel());
        assert!(!NotifyMode::Dm.sends_channel());
        assert!(!NotifyMode::Channel.sends_dm());
    }
}
