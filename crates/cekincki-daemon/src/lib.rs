//! Cekincki daemon library
//!
//! This module provides the core components of the daemon:
//! - Role application and change notifications
//! - Reconciliation and the periodic scheduler
//! - Slash command handling
//! - The keepalive / status / interactions HTTP API
//! - Configuration and server lifecycle

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod notify;
pub mod roles;
pub mod scheduler;
pub mod server;

pub use commands::{command_definitions, CommandHandler, Followup};
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use notify::{Notifier, NotifyOutcome};
pub use roles::{RoleApplier, RoleChange, SkipReason};
pub use scheduler::{MemberUpdate, Reconciler, Scheduler, SyncReport};
pub use server::Server;
