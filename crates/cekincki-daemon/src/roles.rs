//! Points role assignment
//!
//! A member wears exactly one managed role: the one named for their value
//! (or tier). Every other role whose name carries the managed prefix is
//! removed. The guild role directory is read once per pass and roles created
//! during the pass are added to it, so a role is never created twice.

use cekincki_discord::{DiscordResult, GuildGateway};
use cekincki_types::{
    is_managed_role, target_role_name, GuildMember, RoleInfo, RoleMode, TierLadder,
};
use serde::Serialize;
use std::sync::Arc;

/// Why no role was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    MissingPermission,
    TargetRoleMissing,
}

/// Outcome of applying a member's role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleChange {
    /// A role was added or removed
    pub changed: bool,
    pub target_name: Option<String>,
    /// The target role was added
    pub added: bool,
    pub removed_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
}

impl RoleChange {
    fn skipped(reason: SkipReason, target_name: Option<String>) -> Self {
        Self {
            changed: false,
            target_name,
            added: false,
            removed_names: Vec::new(),
            reason: Some(reason),
        }
    }
}

/// Role naming plus the guild to apply it in
#[derive(Clone)]
pub struct RoleApplier {
    gateway: Arc<dyn GuildGateway>,
    prefix: String,
    mode: RoleMode,
    ladder: TierLadder,
}

impl RoleApplier {
    pub fn new(
        gateway: Arc<dyn GuildGateway>,
        prefix: impl Into<String>,
        mode: RoleMode,
        ladder: TierLadder,
    ) -> Self {
        Self {
            gateway,
            prefix: prefix.into(),
            mode,
            ladder,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn target_name(&self, value: i64) -> String {
        target_role_name(self.mode, &self.prefix, &self.ladder, value)
    }

    /// Check permissions and read the role directory for one pass.
    ///
    /// Without Manage Roles the directory is not read and every `apply`
    /// reports `MissingPermission`.
    pub async fn begin_pass(&self) -> DiscordResult<RolePass<'_>> {
        let can_manage = self.gateway.can_manage_roles().await?;
        let directory = if can_manage {
            self.gateway.roles().await?
        } else {
            Vec::new()
        };
        Ok(RolePass {
            applier: self,
            can_manage,
            directory,
        })
    }

    /// Apply one member's role outside of a pass
    pub async fn apply_member_role(
        &self,
        member: &GuildMember,
        value: i64,
    ) -> DiscordResult<RoleChange> {
        let mut pass = self.begin_pass().await?;
        Ok(pass.apply(member, value).await)
    }
}

/// Role directory snapshot for one synchronization pass
pub struct RolePass<'a> {
    applier: &'a RoleApplier,
    can_manage: bool,
    directory: Vec<RoleInfo>,
}

impl RolePass<'_> {
    pub fn can_manage(&self) -> bool {
        self.can_manage
    }

    async fn ensure_role(&mut self, name: &str) -> Option<RoleInfo> {
        if let Some(role) = self.directory.iter().find(|r| r.name == name) {
            return Some(role.clone());
        }

        match self.applier.gateway.create_role(name).await {
            Ok(role) => {
                self.directory.push(role.clone());
                Some(role)
            }
            Err(e) => {
                tracing::warn!(role = %name, error = %e, "Failed to create role");
                None
            }
        }
    }

    /// Give `member` the role for `value` and strip other managed roles.
    ///
    /// Individual add/remove failures are logged and do not stop the rest.
    pub async fn apply(&mut self, member: &GuildMember, value: i64) -> RoleChange {
        if !self.can_manage {
            return RoleChange::skipped(SkipReason::MissingPermission, None);
        }

        let target_name = self.applier.target_name(value);
        let Some(target) = self.ensure_role(&target_name).await else {
            return RoleChange::skipped(SkipReason::TargetRoleMissing, Some(target_name));
        };

        let gateway = &self.applier.gateway;
        let had_target = member.has_role(&target.id);
        if !had_target {
            if let Err(e) = gateway.add_role(&member.user_id, &target.id).await {
                tracing::warn!(
                    user_id = %member.user_id,
                    role = %target.name,
                    error = %e,
                    "Failed to add role"
                );
            }
        }

        let prefix = self.applier.prefix.as_str();
        let stale: Vec<&RoleInfo> = self
            .directory
            .iter()
            .filter(|r| r.id != target.id && member.has_role(&r.id))
            .filter(|r| is_managed_role(prefix, &r.name))
            .collect();

        let mut removed_names = Vec::with_capacity(stale.len());
        for role in stale {
            if let Err(e) = gateway.remove_role(&member.user_id, &role.id).await {
                tracing::warn!(
                    user_id = %member.user_id,
                    role = %role.name,
                    error = %e,
                    "Failed to remove role"
                );
            }
            removed_names.push(role.name.clone());
        }

        RoleChange {
            changed: !had_target || !removed_names.is_empty(),
            target_name: Some(target_name),
            added: !had_target,
            removed_names,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cekincki_discord::InMemoryGuild;
    use cekincki_types::{Tier, UserId};

    const PREFIX: &str = "Cekinčki:";

    fn applier(guild: &Arc<InMemoryGuild>, mode: RoleMode) -> RoleApplier {
        RoleApplier::new(guild.clone(), PREFIX, mode, TierLadder::default())
    }

    #[tokio::test]
    async fn test_creates_and_adds_target_role() {
        let guild = Arc::new(InMemoryGuild::new("Klub"));
        let ana = GuildMember::new("1", "ana");
        guild.add_member(ana.clone()).await;

        let change = applier(&guild, RoleMode::Value).apply_member_role(&ana, 12).await.unwrap();

        assert!(change.changed);
        assert!(change.added);
        assert_eq!(change.target_name.as_deref(), Some("Cekinčki: 12"));
        assert_eq!(guild.member_role_names(&UserId::new("1")).await, vec!["Cekinčki: 12"]);
    }

    #[tokio::test]
    async fn test_swaps_stale_managed_roles_and_keeps_others() {
        let guild = Arc::new(InMemoryGuild::new("Klub"));
        let old = guild.add_existing_role("Cekinčki: 3").await;
        let other = guild.add_existing_role("Moderator").await;
        let lookalike = guild.add_existing_role("Cekinčki:fan").await;
        let ana = GuildMember::new("1", "ana").with_roles([old, other, lookalike]);
        guild.add_member(ana.clone()).await;

        let change = applier(&guild, RoleMode::Value).apply_member_role(&ana, 4).await.unwrap();

        assert!(change.changed);
        assert_eq!(change.removed_names, vec!["Cekinčki: 3"]);
        assert_eq!(
            guild.member_role_names(&UserId::new("1")).await,
            vec!["Cekinčki: 4", "Cekinčki:fan", "Moderator"]
        );
    }

    #[tokio::test]
    async fn test_unchanged_when_already_correct() {
        let guild = Arc::new(InMemoryGuild::new("Klub"));
        let role = guild.add_existing_role("Cekinčki: 7").await;
        let ana = GuildMember::new("1", "ana").with_roles([role]);
        guild.add_member(ana.clone()).await;

        let change = applier(&guild, RoleMode::Value).apply_member_role(&ana, 7).await.unwrap();

        assert!(!change.changed);
        assert!(!change.added);
        assert!(change.removed_names.is_empty());
        assert_eq!(guild.role_creations(), 0);
    }

    #[tokio::test]
    async fn test_missing_permission() {
        let guild = Arc::new(InMemoryGuild::new("Klub"));
        guild.set_manage_roles(false);
        let ana = GuildMember::new("1", "ana");
        guild.add_member(ana.clone()).await;

        let change = applier(&guild, RoleMode::Value).apply_member_role(&ana, 1).await.unwrap();

        assert!(!change.changed);
        assert_eq!(change.reason, Some(SkipReason::MissingPermission));
        assert!(guild.role_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_target_role_missing_when_creation_fails() {
        let guild = Arc::new(InMemoryGuild::new("Klub"));
        guild.set_fail_role_creation(true);
        let ana = GuildMember::new("1", "ana");
        guild.add_member(ana.clone()).await;

        let change = applier(&guild, RoleMode::Value).apply_member_role(&ana, 1).await.unwrap();

        assert_eq!(change.reason, Some(SkipReason::TargetRoleMissing));
        assert_eq!(change.target_name.as_deref(), Some("Cekinčki: 1"));
    }

    #[tokio::test]
    async fn test_role_created_once_per_pass() {
        let guild = Arc::new(InMemoryGuild::new("Klub"));
        let ana = GuildMember::new("1", "ana");
        let bor = GuildMember::new("2", "bor");
        guild.add_member(ana.clone()).await;
        guild.add_member(bor.clone()).await;

        let applier = applier(&guild, RoleMode::Value);
        let mut pass = applier.begin_pass().await.unwrap();
        pass.apply(&ana, 5).await;
        pass.apply(&bor, 5).await;

        assert_eq!(guild.role_creations(), 1);
        assert_eq!(guild.member_role_names(&UserId::new("2")).await, vec!["Cekinčki: 5"]);
    }

    #[tokio::test]
    async fn test_tier_mode() {
        let guild = Arc::new(InMemoryGuild::new("Klub"));
        let ana = GuildMember::new("1", "ana");
        guild.add_member(ana.clone()).await;

        let ladder =
            TierLadder::try_from(vec![Tier::new(0, "Low"), Tier::new(10, "High")]).unwrap();
        let applier = RoleApplier::new(guild.clone(), PREFIX, RoleMode::Tier, ladder);
        let change = applier.apply_member_role(&ana, 42).await.unwrap();

        assert_eq!(change.target_name.as_deref(), Some("Cekinčki: High"));
    }
}
