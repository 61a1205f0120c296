//! Keepalive and status handlers

use crate::api::rest::state::AppState;
use crate::scheduler::SyncReport;
use axum::{extract::State, Json};
use serde::Serialize;

/// Liveness check
pub async fn health_check() -> &'static str {
    "ok"
}

/// Any path without a route
pub async fn banner() -> &'static str {
    "cekincki bot running"
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub guild_id: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub interactions_enabled: bool,
    pub last_sync: Option<SyncReport>,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> Json<DaemonStatusResponse> {
    let last_sync = state.reconciler.last_report().await;
    let status = match &last_sync {
        Some(report) if !report.is_ok() => "degraded",
        _ => "running",
    };

    Json(DaemonStatusResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        guild_id: state.guild_id.clone(),
        spreadsheet_id: state.spreadsheet_id.clone(),
        sheet_name: state.reconciler.roster().tab().to_string(),
        interactions_enabled: state.public_key.is_some(),
        last_sync,
    })
}
