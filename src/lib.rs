//! Polling client for the user-management REST API.
//!
//! The [`controller::SyncController`] mirrors the server's user collection
//! into a render surface, forwards form submissions and keeps a health
//! indicator up to date:
//!
//! ```text
//! GET  /api/users    every 5s   -> users list (or error placeholder)
//! GET  /api/health   every 10s  -> status indicator
//! POST /api/users    on submit  -> notice + immediate refresh
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`users`]: Users API types, client and mock
//! - [`view`]: View models and localized labels
//! - [`render`]: Render surfaces (HTML and console)
//! - [`poll`]: Recurring poll tasks and response ordering
//! - [`controller`]: The sync controller
//! - [`metrics`]: Request counters and latency histograms
//! - [`utils`]: Utility functions

pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod poll;
pub mod render;
pub mod users;
pub mod utils;
pub mod view;

pub use config::Config;
pub use controller::{SyncController, SyncSettings};
pub use error::{ApiError, ConsoleError, Result};
