//! Roster reconciliation

use crate::error::{DaemonError, DaemonResult};
use crate::notify::Notifier;
use crate::roles::{RoleApplier, RoleChange};
use cekincki_discord::GuildGateway;
use cekincki_sheets::{BulkSyncOutcome, RosterSheet, UpsertOutcome};
use cekincki_types::{GuildMember, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Summary of one synchronization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Guild members fetched, bots included
    pub members: usize,
    /// Rows appended for members missing from the sheet
    pub inserted: usize,
    /// Members whose roles changed
    pub updated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of setting one member's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberUpdate {
    pub nickname: String,
    pub value: i64,
    pub sheet: UpsertOutcome,
    pub role: RoleChange,
}

#[derive(Default)]
struct PassCounts {
    members: usize,
    inserted: usize,
    updated: usize,
}

/// Reconciles guild roles against the roster sheet.
///
/// Passes never overlap; a manual pass waits for a running periodic one.
pub struct Reconciler {
    gateway: Arc<dyn GuildGateway>,
    roster: RosterSheet,
    roles: RoleApplier,
    notifier: Notifier,
    notify_enabled: bool,
    /// Last value seen per nickname, for change detection
    last_values: Mutex<HashMap<String, i64>>,
    /// Members present at the end of the previous pass
    known_members: Mutex<Option<HashSet<UserId>>>,
    pass_lock: Mutex<()>,
    last_report: RwLock<Option<SyncReport>>,
}

impl Reconciler {
    pub fn new(
        gateway: Arc<dyn GuildGateway>,
        roster: RosterSheet,
        roles: RoleApplier,
        notifier: Notifier,
        notify_enabled: bool,
    ) -> Self {
        Self {
            gateway,
            roster,
            roles,
            notifier,
            notify_enabled,
            last_values: Mutex::new(HashMap::new()),
            known_members: Mutex::new(None),
            pass_lock: Mutex::new(()),
            last_report: RwLock::new(None),
        }
    }

    pub fn roster(&self) -> &RosterSheet {
        &self.roster
    }

    pub async fn last_report(&self) -> Option<SyncReport> {
        self.last_report.read().await.clone()
    }

    /// Last value seen for `nickname` in the sheet
    pub async fn last_value(&self, nickname: &str) -> Option<i64> {
        self.last_values.lock().await.get(nickname).copied()
    }

    /// Run one full pass. Failures are reported, not returned.
    pub async fn sync_guild(&self) -> SyncReport {
        let _pass = self.pass_lock.lock().await;

        let report = match self.run_pass().await {
            Ok(counts) => SyncReport {
                members: counts.members,
                inserted: counts.inserted,
                updated: counts.updated,
                error: None,
                finished_at: Utc::now(),
            },
            Err(e) => {
                tracing::error!(error = %e, "Sync failed");
                SyncReport {
                    members: 0,
                    inserted: 0,
                    updated: 0,
                    error: Some(e.to_string()),
                    finished_at: Utc::now(),
                }
            }
        };

        *self.last_report.write().await = Some(report.clone());
        report
    }

    async fn run_pass(&self) -> DaemonResult<PassCounts> {
        let members = self.gateway.members().await?;
        let mut counts = PassCounts {
            members: members.len(),
            ..Default::default()
        };

        let mut roles = self.roles.begin_pass().await?;
        if !roles.can_manage() {
            let guild = self.gateway.guild_name().await?;
            tracing::warn!(guild = %guild, "Missing Manage Roles in guild {}", guild);
            return Ok(counts);
        }
        tracing::info!(count = counts.members, "Members fetched");

        let humans: Vec<GuildMember> = members.into_iter().filter(|m| !m.bot).collect();
        self.log_joins(&humans).await;

        let BulkSyncOutcome {
            inserted,
            total_members,
        } = self.roster.bulk_sync_members(&humans).await?;
        counts.inserted = inserted;
        tracing::info!(
            inserted,
            total = total_members,
            "Sheet add missing: inserted {} of {}",
            inserted,
            total_members
        );

        let snapshot = self.roster.read_all().await?;
        let mut guild_name: Option<String> = None;

        for member in &humans {
            let nickname = member.display_name();
            let Some(entry) = snapshot.get(nickname) else {
                continue;
            };
            let value = entry.value;

            let previous = self
                .last_values
                .lock()
                .await
                .insert(nickname.to_string(), value);
            let value_changed = previous.is_some_and(|p| p != value);
            if let (true, Some(prev)) = (value_changed, previous) {
                tracing::info!(
                    nickname = %nickname,
                    old = prev,
                    new = value,
                    "Value change detected"
                );
            }

            let change = roles.apply(member, value).await;
            if !change.changed {
                continue;
            }

            counts.updated += 1;
            tracing::info!(
                nickname = %nickname,
                role = change.target_name.as_deref().unwrap_or_default(),
                value,
                removed = ?change.removed_names,
                "Updated member role"
            );

            if let (true, true, Some(prev)) = (self.notify_enabled, value_changed, previous) {
                if guild_name.is_none() {
                    guild_name = Some(self.gateway.guild_name().await.unwrap_or_default());
                }
                let guild = guild_name.as_deref().unwrap_or_default();
                self.notifier.notify(member, guild, nickname, prev, value).await;
            }
        }

        Ok(counts)
    }

    async fn log_joins(&self, humans: &[GuildMember]) {
        let current: HashSet<UserId> = humans.iter().map(|m| m.user_id.clone()).collect();
        let mut known = self.known_members.lock().await;
        if let Some(previous) = known.as_ref() {
            for member in humans.iter().filter(|m| !previous.contains(&m.user_id)) {
                tracing::info!(
                    user_id = %member.user_id,
                    nickname = %member.display_name(),
                    "Member joined"
                );
            }
        }
        *known = Some(current);
    }

    /// Add every non-bot member missing from the sheet
    pub async fn add_missing_members(&self) -> DaemonResult<BulkSyncOutcome> {
        let _pass = self.pass_lock.lock().await;
        let humans: Vec<GuildMember> = self
            .gateway
            .members()
            .await?
            .into_iter()
            .filter(|m| !m.bot)
            .collect();
        Ok(self.roster.bulk_sync_members(&humans).await?)
    }

    /// Write `value` to the member's row and apply the matching role.
    ///
    /// The value is recorded as seen so the next pass does not report it
    /// as a sheet change.
    pub async fn set_member_value(
        &self,
        user_id: &UserId,
        value: i64,
    ) -> DaemonResult<MemberUpdate> {
        let _pass = self.pass_lock.lock().await;
        let member = self
            .gateway
            .member(user_id)
            .await?
            .ok_or_else(|| DaemonError::NotFound(format!("member {}", user_id)))?;

        let sheet = self.roster.upsert_member_record(&member, value).await?;
        let nickname = member.display_name().to_string();
        self.last_values.lock().await.insert(nickname.clone(), value);

        let role = self.roles.apply_member_role(&member, value).await?;
        tracing::info!(
            nickname = %nickname,
            value,
            role = change_target(&role),
            "Member value set"
        );

        Ok(MemberUpdate {
            nickname,
            value,
            sheet,
            role,
        })
    }
}

fn change_target(change: &RoleChange) -> &str {
    change.target_name.as_deref().unwrap_or_default()
}
