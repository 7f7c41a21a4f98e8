//! Mock users API for unit testing.
//!
//! This module provides an in-memory implementation of [`UsersApi`] that can
//! be used in tests without making real network requests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ApiError;

use super::client::{UsersApi, HEALTH_PATH, USERS_PATH};
use super::types::{NewUser, User};

/// Configuration for mock client behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail list requests.
    pub fail_list: bool,
    /// Whether to fail create requests.
    pub fail_create: bool,
    /// `error` field sent with failed creations.
    pub create_error: Option<String>,
    /// Whether to fail health requests.
    pub fail_health: bool,
    /// Status reported by the health endpoint (`None` omits the field).
    pub health_status: Option<String>,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct MockState {
    config: MockConfig,
    users: Vec<User>,
    next_id: i64,
    submitted: Vec<NewUser>,
    list_latencies: VecDeque<Duration>,
    list_calls: usize,
    health_calls: usize,
}

/// Mock users API for testing.
#[derive(Debug, Clone)]
pub struct MockUsersApi {
    state: Arc<Mutex<MockState>>,
}

impl MockUsersApi {
    /// Create a new mock client with default configuration.
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a mock client with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                config,
                next_id: 1,
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored users.
    pub fn set_users(&self, users: Vec<User>) {
        let mut state = self.state();
        state.next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        state.users = users;
    }

    /// Change failure and latency behavior.
    pub fn update_config(&self, f: impl FnOnce(&mut MockConfig)) {
        f(&mut self.state().config);
    }

    /// Delay the next list request by `latency`, ahead of the configured latency.
    pub fn push_list_latency(&self, latency: Duration) {
        self.state().list_latencies.push_back(latency);
    }

    /// Payloads received by `create_user`, in order.
    pub fn submitted(&self) -> Vec<NewUser> {
        self.state().submitted.clone()
    }

    /// Number of list requests received.
    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    /// Number of health requests received.
    pub fn health_calls(&self) -> usize {
        self.state().health_calls
    }

    fn configured_latency(&self) -> Duration {
        Duration::from_millis(self.state().config.latency_ms)
    }

    async fn simulate_latency(latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockUsersApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsersApi for MockUsersApi {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let latency = {
            let mut state = self.state();
            state.list_calls += 1;
            state
                .list_latencies
                .pop_front()
                .unwrap_or(Duration::from_millis(state.config.latency_ms))
        };
        Self::simulate_latency(latency).await;

        let state = self.state();
        if state.config.fail_list {
            return Err(ApiError::Status {
                endpoint: USERS_PATH.to_string(),
                status: 500,
                message: None,
            });
        }

        Ok(state.users.clone())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        Self::simulate_latency(self.configured_latency()).await;

        let mut state = self.state();
        state.submitted.push(user.clone());

        if state.config.fail_create {
            return Err(ApiError::Status {
                endpoint: USERS_PATH.to_string(),
                status: 400,
                message: state.config.create_error.clone(),
            });
        }

        let created = User {
            id: state.next_id,
            name: user.name.clone(),
            email: user.email.clone(),
        };
        state.next_id += 1;
        state.users.push(created.clone());

        Ok(created)
    }

    async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        Self::simulate_latency(self.configured_latency()).await;

        self.state()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                endpoint: format!("{}/{}", USERS_PATH, id),
                status: 404,
                message: Some("User not found".to_string()),
            })
    }

    async fn health(&self) -> Result<String, ApiError> {
        let latency = {
            let mut state = self.state();
            state.health_calls += 1;
            Duration::from_millis(state.config.latency_ms)
        };
        Self::simulate_latency(latency).await;

        let state = self.state();
        if state.config.fail_health {
            return Err(ApiError::Status {
                endpoint: HEALTH_PATH.to_string(),
                status: 503,
                message: None,
            });
        }

        Ok(state
            .config
            .health_status
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "healthy".to_string()))
    }
}
