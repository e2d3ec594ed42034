//! HTTP client for an airlift server.
//!
//! Async client using `reqwest`, with password-header authentication for
//! the upload route and a cookie session for the admin routes.

pub mod admin;
pub mod client;
pub mod config;
pub mod retention;

pub use client::{Client, ClientError};
pub use config::ClientConfig;
pub use admin::{ConfigForm, ConfigFragments};
pub use retention::{RetentionLimits, RetentionUpdate, preview_retention, update_retention};

#[cfg(test)]
mod mock_server;
