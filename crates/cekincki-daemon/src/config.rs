//! Configuration for cekincki-daemon

use crate::error::{DaemonError, DaemonResult};
use cekincki_sheets::{CredentialSettings, DEFAULT_SHEETS_API_BASE};
use cekincki_types::{
    ApplicationId, ChannelId, GuildId, NotifyMode, RoleMode, TierLadder,
    DEFAULT_NOTIFY_TEMPLATE, DEFAULT_ROLE_PREFIX, DEFAULT_SHEET_NAME,
};
use cekincki_discord::DEFAULT_DISCORD_API_BASE;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Interval used when none (or an unusable one) is configured
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Discord configuration
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Spreadsheet configuration
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Synchronization configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Role naming
    #[serde(default)]
    pub roles: RolesConfig,

    /// Change notifications
    #[serde(default)]
    pub notify: NotifyConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Discord configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token
    #[serde(default)]
    pub token: Option<String>,

    /// Guild the daemon synchronizes
    #[serde(default)]
    pub guild_id: Option<String>,

    /// Application (client) id, needed for slash commands
    #[serde(default)]
    pub application_id: Option<String>,

    /// Hex Ed25519 key used to verify interaction requests
    #[serde(default)]
    pub public_key: Option<String>,

    /// REST API base URL
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            guild_id: None,
            application_id: None,
            public_key: None,
            api_base: default_discord_api_base(),
        }
    }
}

impl DiscordConfig {
    pub fn guild_id(&self) -> Option<GuildId> {
        non_empty(&self.guild_id).map(GuildId::new)
    }

    pub fn application_id(&self) -> Option<ApplicationId> {
        non_empty(&self.application_id).map(ApplicationId::new)
    }

    pub fn public_key(&self) -> Option<&str> {
        non_empty(&self.public_key)
    }
}

/// Spreadsheet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet id
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// Roster tab name
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Service account credentials
    #[serde(default)]
    pub credentials: CredentialSettings,

    /// Sheets API base URL
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheet_name: default_sheet_name(),
            credentials: CredentialSettings::default(),
            api_base: default_sheets_api_base(),
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between periodic passes
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
        }
    }
}

impl SyncConfig {
    /// Interval to schedule with; zero falls back to the default
    pub fn effective_interval_secs(&self) -> u64 {
        if self.interval_secs == 0 {
            DEFAULT_SYNC_INTERVAL_SECS
        } else {
            self.interval_secs
        }
    }
}

/// Role naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Prefix of every managed role
    #[serde(default = "default_role_prefix")]
    pub prefix: String,

    /// One role per value, or one per tier
    #[serde(default)]
    pub mode: RoleMode,

    /// Tier ladder used in tier mode
    #[serde(default)]
    pub tiers: TierLadder,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            prefix: default_role_prefix(),
            mode: RoleMode::default(),
            tiers: TierLadder::default(),
        }
    }
}

/// Change notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Send notifications on value changes
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delivery mode
    #[serde(default)]
    pub mode: NotifyMode,

    /// Channel for `channel` and `both` modes
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Message template
    #[serde(default = "default_notify_template")]
    pub template: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: NotifyMode::default(),
            channel_id: None,
            template: default_notify_template(),
        }
    }
}

impl NotifyConfig {
    pub fn channel_id(&self) -> Option<ChannelId> {
        non_empty(&self.channel_id).map(ChannelId::new)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port; 0 disables the server
    #[serde(default)]
    pub port: u16,

    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            bind: default_bind(),
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// Listen address, when the server is enabled
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        (self.port > 0).then(|| SocketAddr::new(self.bind, self.port))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_discord_api_base() -> String {
    DEFAULT_DISCORD_API_BASE.to_string()
}

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_role_prefix() -> String {
    DEFAULT_ROLE_PREFIX.to_string()
}

fn default_notify_template() -> String {
    DEFAULT_NOTIFY_TEMPLATE.to_string()
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `NOTIFY_ON_CHANGE`: everything except `false` enables notifications.
pub fn parse_notify_flag(raw: &str) -> bool {
    !raw.trim().eq_ignore_ascii_case("false")
}

/// `SYNC_INTERVAL_SECONDS`: non-numeric and non-positive input yields the default.
pub fn parse_interval_secs(raw: &str) -> u64 {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => secs as u64,
        _ => DEFAULT_SYNC_INTERVAL_SECS,
    }
}

/// `PORT` / `KEEPALIVE_PORT`: anything that is not a positive port disables the server.
pub fn parse_port(raw: &str) -> u16 {
    raw.trim().parse::<u16>().unwrap_or(0)
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and `CEKINCKI__*` variables
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Nested keys use a double underscore: CEKINCKI__SYNC__INTERVAL_SECS
        builder = builder.add_source(
            config::Environment::with_prefix("CEKINCKI")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(&self.discord.token)
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        non_empty(&self.sheets.spreadsheet_id)
    }

    /// Settings the `run` command cannot do without
    pub fn validate_for_run(&self) -> DaemonResult<()> {
        if self.token().is_none() {
            return Err(DaemonError::Config("Missing DISCORD_TOKEN in env".to_string()));
        }
        if self.discord.guild_id().is_none() {
            return Err(DaemonError::Config("Missing GUILD_ID in env".to_string()));
        }
        if self.spreadsheet_id().is_none() {
            return Err(DaemonError::Config("Missing SPREADSHEET_ID in env".to_string()));
        }
        Ok(())
    }

    /// Settings needed to register slash commands
    pub fn validate_for_registration(&self) -> DaemonResult<()> {
        if self.token().is_none()
            || self.discord.application_id().is_none()
            || self.discord.guild_id().is_none()
        {
            return Err(DaemonError::Config(
                "DISCORD_TOKEN, CLIENT_ID, and GUILD_ID must be set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.sheets.sheet_name, "cekincki");
        assert_eq!(config.sync.interval_secs, 300);
        assert_eq!(config.roles.prefix, "Cekinčki:");
        assert_eq!(config.roles.mode, RoleMode::Value);
        assert!(config.notify.enabled);
        assert_eq!(config.notify.mode, NotifyMode::Dm);
        assert!(config.server.listen_addr().is_none());
    }

    #[test]
    fn test_zero_interval_falls_back() {
        let sync = SyncConfig { interval_secs: 0 };
        assert_eq!(sync.effective_interval_secs(), 300);
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval_secs("60"), 60);
        assert_eq!(parse_interval_secs("0"), 300);
        assert_eq!(parse_interval_secs("-5"), 300);
        assert_eq!(parse_interval_secs("soon"), 300);
    }

    #[test]
    fn test_notify_flag() {
        assert!(parse_notify_flag("true"));
        assert!(parse_notify_flag("yes"));
        assert!(parse_notify_flag(""));
        assert!(!parse_notify_flag("FALSE"));
        assert!(!parse_notify_flag(" false "));
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8080"), 8080);
        assert_eq!(parse_port("-1"), 0);
        assert_eq!(parse_port(""), 0);
    }

    #[test]
    fn test_validate_for_run() {
        let mut config = DaemonConfig::default();
        let err = config.validate_for_run().unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));

        config.discord.token = Some("token".to_string());
        config.discord.guild_id = Some("100".to_string());
        let err = config.validate_for_run().unwrap_err();
        assert!(err.to_string().contains("SPREADSHEET_ID"));

        config.sheets.spreadsheet_id = Some("sheet".to_string());
        assert!(config.validate_for_run().is_ok());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut config = DaemonConfig::default();
        config.discord.token = Some("  ".to_string());
        assert!(config.token().is_none());
        assert!(config.validate_for_registration().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[sheets]
spreadsheet_id = "abc"
sheet_name = "points"

[roles]
mode = "tier"
tiers = [{{ min = 0, name = "Zero" }}, {{ min = 5, name = "Five" }}]

[notify]
mode = "both"
"#
        )
        .unwrap();

        let config = DaemonConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.spreadsheet_id(), Some("abc"));
        assert_eq!(config.sheets.sheet_name, "points");
        assert_eq!(config.roles.mode, RoleMode::Tier);
        assert_eq!(config.roles.tiers.tier_for(7).name, "Five");
        assert_eq!(config.notify.mode, NotifyMode::Both);
        assert_eq!(config.sync.interval_secs, 300);
    }
}
