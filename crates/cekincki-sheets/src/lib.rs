//! Google Sheets roster storage
//!
//! This crate provides:
//! - Service account credential loading and diagnostics
//! - OAuth access tokens via the JWT bearer flow
//! - A Sheets v4 REST backend and an in-memory backend
//! - `RosterSheet`, the nickname-keyed roster operations on top of a backend

pub mod auth;
pub mod backend;
pub mod client;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod roster;

pub use auth::{AccessTokenSource, StaticToken, TokenProvider, SHEETS_SCOPE};
pub use backend::SheetBackend;
pub use client::{SheetsClient, DEFAULT_SHEETS_API_BASE};
pub use credentials::{CredentialReport, CredentialSettings, CredentialSource, ServiceAccountKey};
pub use error::{SheetsError, SheetsResult};
pub use memory::InMemorySheet;
pub use roster::{BulkSyncOutcome, RosterSheet, UpsertOutcome};
