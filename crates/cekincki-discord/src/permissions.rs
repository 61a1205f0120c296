//! Effective guild permissions
//!
//! Base permissions are `@everyone` OR-ed with every role the member holds.
//! The guild owner and any member with `ADMINISTRATOR` hold every permission.
//! Channel overwrites are not considered; role management is guild-scoped.

use crate::model::{Guild, Role};
use cekincki_types::GuildMember;
use std::ops::BitOr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions(u64);

impl Permissions {
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_ROLES: Permissions = Permissions(1 << 28);
    pub const ALL: Permissions = Permissions(u64::MAX);

    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Parse the decimal string form used by the API; garbage is empty.
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().parse().unwrap_or(0))
    }

    pub fn contains(&self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

/// Guild-level permissions of `member`
pub fn compute_member_permissions(
    guild: &Guild,
    member: &GuildMember,
    roles: &[Role],
) -> Permissions {
    if member.user_id == guild.owner_id {
        return Permissions::ALL;
    }

    let everyone = guild.id.everyone_role();
    let perms = roles
        .iter()
        .filter(|role| role.id == everyone || member.has_role(&role.id))
        .fold(Permissions::default(), |acc, role| {
            acc | Permissions::parse(&role.permissions)
        });

    if perms.contains(Permissions::ADMINISTRATOR) {
        Permissions::ALL
    } else {
        perms
    }
}
