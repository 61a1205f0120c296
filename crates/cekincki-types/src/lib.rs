//! Cekincki Types - Core types for roster synchronization
//!
//! The cekincki daemon keeps a Discord guild roster and a Google Sheet in
//! step: every member gets a row, every row carries a points value, and every
//! member wears exactly one role derived from that value.
//!
//! ## Key Concepts
//!
//! - **GuildMember**: The daemon's view of a guild member (names, roles, bot flag)
//! - **SheetRow**: One data row of the enforced `nickname, username, cekincki` schema
//! - **RosterSnapshot**: All sheet rows keyed by nickname
//! - **TierLadder / RoleMode**: Mapping from a points value to a role name
//! - **NotifyMode / NotificationContext**: Change notifications

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod ids;
pub mod member;
pub mod notify;
pub mod roles;
pub mod sheet;

// Re-export main types
pub use ids::{ApplicationId, ChannelId, GuildId, RoleId, UserId};
pub use member::{GuildMember, RoleInfo};
pub use notify::{render_template, NotificationContext, NotifyMode, DEFAULT_NOTIFY_TEMPLATE};
pub use roles::{
    is_managed_role, target_role_name, tier_role_name, value_role_name, RoleMode, RoleModeError,
    Tier, TierLadder, DEFAULT_ROLE_PREFIX,
};
pub use sheet::{
    parse_points, quote_sheet_name, RosterSnapshot, SheetRow, DEFAULT_SHEET_NAME, SHEET_HEADER,
};
