//! REST endpoints: keepalive, status and Discord interactions

pub mod handlers;
pub mod router;
pub mod state;
