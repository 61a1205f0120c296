//! API request handlers

mod health;
mod interactions;

pub use health::*;
pub use interactions::*;
