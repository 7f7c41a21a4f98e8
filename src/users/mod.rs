//! Users API module.
//!
//! This module handles:
//! - Wire types for users, health and error bodies
//! - The `UsersApi` seam and its reqwest implementation
//! - Mock client for testing

pub mod client;
pub mod mock;
pub mod types;

pub use client::{HttpUsersApi, UsersApi};
pub use mock::{MockConfig, MockUsersApi};
pub use types::{FormInput, NewUser, User};
