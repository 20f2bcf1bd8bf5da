//! # gridpulse_core
//!
//! Core domain logic for GridPulse accounts: credentials, session tokens,
//! the session cache and dependency liveness.

pub mod auth;
pub mod db;
pub mod health;
pub mod migrate;
pub mod models;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
