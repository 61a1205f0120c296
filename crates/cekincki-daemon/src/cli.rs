//! Command line interface
//!
//! Every setting can also come from the environment under the variable
//! names operators already use (`DISCORD_TOKEN`, `SPREADSHEET_ID`, ...).
//! Values given here win over the configuration file.

use crate::config::{parse_interval_secs, parse_notify_flag, parse_port, DaemonConfig};
use crate::error::{DaemonError, DaemonResult};
use cekincki_types::{NotifyMode, RoleMode, TierLadder};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cekincki daemon CLI
#[derive(Debug, Parser)]
#[command(name = "cekinckid")]
#[command(
    about = "Cekincki - Discord roster to Google Sheets role synchronizer",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, env = "CEKINCKI_CONFIG", global = true)]
    pub config: Option<String>,

    /// Log level
    #[arg(long, env = "CEKINCKI_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "CEKINCKI_LOG_JSON", global = true)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the synchronizer (default)
    Run,
    /// Register the slash commands for the guild
    RegisterCommands,
    /// Check Google service account credentials
    CheckGoogle,
}

/// Settings that override the configuration file
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true, global = true)]
    pub discord_token: Option<String>,

    /// Guild to synchronize
    #[arg(long, env = "GUILD_ID", global = true)]
    pub guild_id: Option<String>,

    /// Application id used for slash commands
    #[arg(long, env = "CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Hex public key for interaction verification
    #[arg(long, env = "DISCORD_PUBLIC_KEY", global = true)]
    pub public_key: Option<String>,

    /// Spreadsheet id
    #[arg(long, env = "SPREADSHEET_ID", global = true)]
    pub spreadsheet_id: Option<String>,

    /// Roster tab name
    #[arg(long, env = "SHEET_NAME", global = true)]
    pub sheet_name: Option<String>,

    /// Seconds between passes
    #[arg(long, env = "SYNC_INTERVAL_SECONDS", global = true)]
    pub sync_interval: Option<String>,

    /// Managed role prefix
    #[arg(long, env = "CEKINCKI_ROLE_PREFIX", global = true)]
    pub role_prefix: Option<String>,

    /// Tier ladder as a JSON array of {min, name}
    #[arg(long, env = "CEKINCKI_TIERS", global = true)]
    pub tiers: Option<String>,

    /// `value` or `tier`
    #[arg(long, env = "CEKINCKI_ROLE_MODE", global = true)]
    pub role_mode: Option<String>,

    /// Anything other than `false` enables notifications
    #[arg(long, env = "NOTIFY_ON_CHANGE", global = true)]
    pub notify_on_change: Option<String>,

    /// `dm`, `channel` or `both`
    #[arg(long, env = "NOTIFY_MODE", global = true)]
    pub notify_mode: Option<String>,

    /// Channel for channel notifications
    #[arg(long, env = "NOTIFY_CHANNEL_ID", global = true)]
    pub notify_channel_id: Option<String>,

    /// Notification message template
    #[arg(long, env = "NOTIFY_TEMPLATE", global = true)]
    pub notify_template: Option<String>,

    /// HTTP port; unset or 0 disables the server
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<String>,

    /// Fallback for PORT
    #[arg(long, env = "KEEPALIVE_PORT", global = true)]
    pub keepalive_port: Option<String>,

    /// Service account key file
    #[arg(long, env = "GCP_CREDENTIALS_PATH", global = true)]
    pub gcp_credentials_path: Option<PathBuf>,

    /// Service account key file, standard Google variable
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", global = true)]
    pub google_application_credentials: Option<PathBuf>,

    /// Inline service account key JSON
    #[arg(long, env = "GCP_CREDENTIALS_JSON", hide_env_values = true, global = true)]
    pub gcp_credentials_json: Option<String>,
}

fn set(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *target = Some(value.trim().to_string());
    }
}

impl Overrides {
    pub fn apply(self, config: &mut DaemonConfig) -> DaemonResult<()> {
        set(&mut config.discord.token, self.discord_token);
        set(&mut config.discord.guild_id, self.guild_id);
        set(&mut config.discord.application_id, self.client_id);
        set(&mut config.discord.public_key, self.public_key);
        set(&mut config.sheets.spreadsheet_id, self.spreadsheet_id);
        set(&mut config.notify.channel_id, self.notify_channel_id);

        if let Some(name) = self.sheet_name.filter(|v| !v.trim().is_empty()) {
            config.sheets.sheet_name = name;
        }
        if let Some(raw) = self.sync_interval {
            config.sync.interval_secs = parse_interval_secs(&raw);
        }
        if let Some(prefix) = self.role_prefix.filter(|v| !v.is_empty()) {
            config.roles.prefix = prefix;
        }
        if let Some(raw) = self.tiers {
            config.roles.tiers = TierLadder::from_json(&raw);
        }
        if let Some(raw) = self.role_mode {
            config.roles.mode = raw
                .parse::<RoleMode>()
                .map_err(|e| DaemonError::Config(e.to_string()))?;
        }
        if let Some(raw) = self.notify_on_change {
            config.notify.enabled = parse_notify_flag(&raw);
        }
        if let Some(raw) = self.notify_mode {
            config.notify.mode = NotifyMode::parse_lenient(&raw);
        }
        if let Some(template) = self.notify_template.filter(|v| !v.is_empty()) {
            config.notify.template = template;
        }
        if let Some(raw) = self.port.or(self.keepalive_port) {
            config.server.port = parse_port(&raw);
        }

        let path = self
            .gcp_credentials_path
            .or(self.google_application_credentials)
            .filter(|p| !p.as_os_str().is_empty());
        if path.is_some() {
            config.sheets.credentials.path = path;
        }
        set(&mut config.sheets.credentials.inline_json, self.gcp_credentials_json);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(args: &[&str]) -> Overrides {
        let mut argv = vec!["cekinckid"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().overrides
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from(["cekinckid", "check-google"]).unwrap();
        assert_eq!(cli.command, Some(Command::CheckGoogle));

        let cli =
            Cli::try_parse_from(["cekinckid", "register-commands", "--client-id", "42"]).unwrap();
        assert_eq!(cli.command, Some(Command::RegisterCommands));
        assert_eq!(cli.overrides.client_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = DaemonConfig::default();
        overrides(&[
            "--discord-token",
            "t",
            "--guild-id",
            "100",
            "--spreadsheet-id",
            "s",
            "--sync-interval",
            "0",
            "--role-mode",
            "tier",
            "--tiers",
            r#"[{"min": 0, "name": "A"}, {"min": 3, "name": "B"}]"#,
            "--notify-on-change",
            "False",
            "--notify-mode",
            "BOTH",
            "--port",
            "9000",
        ])
        .apply(&mut config)
        .unwrap();

        assert!(config.validate_for_run().is_ok());
        assert_eq!(config.sync.interval_secs, 300);
        assert_eq!(config.roles.mode, RoleMode::Tier);
        assert_eq!(config.roles.tiers.tier_for(4).name, "B");
        assert!(!config.notify.enabled);
        assert_eq!(config.notify.mode, NotifyMode::Both);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_port_wins_over_keepalive_port() {
        let mut config = DaemonConfig::default();
        overrides(&["--port", "8080", "--keepalive-port", "9000"])
            .apply(&mut config)
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_role_mode_rejected() {
        let mut config = DaemonConfig::default();
        let result = overrides(&["--role-mode", "rainbow"]).apply(&mut config);
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }

    #[test]
    fn test_bad_tiers_fall_back_to_default() {
        let mut config = DaemonConfig::default();
        overrides(&["--tiers", "not json"]).apply(&mut config).unwrap();
        assert_eq!(config.roles.tiers, TierLadder::default());
    }
}
