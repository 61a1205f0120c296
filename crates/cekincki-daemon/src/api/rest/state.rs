//! Application state for API handlers

use crate::commands::CommandHandler;
use crate::scheduler::Reconciler;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Reconciler, for the last sync report
    pub reconciler: Arc<Reconciler>,

    /// Slash command handler
    pub commands: Arc<CommandHandler>,

    /// Hex Ed25519 key for interaction verification; interactions are refused without it
    pub public_key: Option<String>,

    /// Synchronized guild
    pub guild_id: String,

    /// Target spreadsheet
    pub spreadsheet_id: String,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        reconciler: Arc<Reconciler>,
        commands: Arc<CommandHandler>,
        public_key: Option<String>,
        guild_id: impl Into<String>,
        spreadsheet_id: impl Into<String>,
    ) -> Self {
        Self {
            reconciler,
            commands,
            public_key,
            guild_id: guild_id.into(),
            spreadsheet_id: spreadsheet_id.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        format_uptime((chrono::Utc::now() - self.started_at).num_seconds())
    }
}

fn format_uptime(secs: i64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}
