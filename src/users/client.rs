//! Users API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Config;
use crate::error::ApiError;
use crate::metrics::LatencyTimer;

use super::types::{ErrorBody, HealthResponse, NewUser, User, UsersResponse};

/// Users collection endpoint.
pub const USERS_PATH: &str = "/api/users";
/// Health check endpoint.
pub const HEALTH_PATH: &str = "/api/health";

/// Operations the controller needs from the server.
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// Fetch the full user collection.
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    /// Create a user and return the stored record.
    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError>;

    /// Fetch a single user by id.
    async fn get_user(&self, id: i64) -> Result<User, ApiError>;

    /// Query the health endpoint and return the reported status.
    async fn health(&self) -> Result<String, ApiError>;
}

/// reqwest-backed client for the users API.
#[derive(Debug, Clone)]
pub struct HttpUsersApi {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Origin the endpoints are resolved against.
    base_url: Url,
}

impl HttpUsersApi {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.api_base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|source| ApiError::Network {
                endpoint: base_url.to_string(),
                source,
            })?;

        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around an existing reqwest client.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request, turning transport failures and non-2xx statuses into errors.
    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Network {
            endpoint: path.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(status_error(path, status, response).await)
    }

    /// Read the body and decode it as JSON.
    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let body = response.bytes().await.map_err(|source| ApiError::Network {
            endpoint: path.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|e| ApiError::Malformed {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Build a status error, keeping the body's `error` field if it parses.
async fn status_error(path: &str, status: StatusCode, response: Response) -> ApiError {
    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty()),
        Err(_) => None,
    };

    ApiError::Status {
        endpoint: path.to_string(),
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl UsersApi for HttpUsersApi {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let _timer = LatencyTimer::new(USERS_PATH);
        let url = self.endpoint(USERS_PATH)?;

        let response = self.send(USERS_PATH, self.http.get(url)).await?;
        let users = Self::decode::<UsersResponse>(USERS_PATH, response)
            .await?
            .into_users();

        debug!(count = users.len(), "Fetched users");
        Ok(users)
    }

    #[instrument(skip(self, user), fields(name = %user.name))]
    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let _timer = LatencyTimer::new(USERS_PATH);
        let url = self.endpoint(USERS_PATH)?;

        let response = self
            .send(USERS_PATH, self.http.post(url).json(user))
            .await?;
        let created: User = Self::decode(USERS_PATH, response).await?;

        debug!(id = created.id, "Created user");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        let _timer = LatencyTimer::new("/api/users/{id}");
        let path = format!("{}/{}", USERS_PATH, id);
        let url = self.endpoint(&path)?;

        let response = self.send(&path, self.http.get(url)).await?;
        Self::decode(&path, response).await
    }

    #[instrument(skip(self))]
    async fn health(&self) -> Result<String, ApiError> {
        let _timer = LatencyTimer::new(HEALTH_PATH);
        let url = self.endpoint(HEALTH_PATH)?;

        let response = self.send(HEALTH_PATH, self.http.get(url)).await?;
        let health: HealthResponse = Self::decode(HEALTH_PATH, response).await?;

        Ok(health.status_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_works() {
        let config = Config {
            api_base_url: "http://localhost:5000".to_string(),
            ..Config::default()
        };
        let client = HttpUsersApi::new(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/");
    }

    #[test]
    fn client_creation_rejects_bad_url() {
        let config = Config {
            api_base_url: "::nope".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            HttpUsersApi::new(&config),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn endpoints_resolve_against_origin() {
        let client = HttpUsersApi::with_client(
            reqwest::Client::new(),
            Url::parse("http://example.com/app/index.html").unwrap(),
        );
        assert_eq!(
            client.endpoint(USERS_PATH).unwrap().as_str(),
            "http://example.com/api/users"
        );
        assert_eq!(
            client.endpoint(HEALTH_PATH).unwrap().as_str(),
            "http://example.com/api/health"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_failure() {
        let client = HttpUsersApi::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:1").unwrap(),
        );
        let err = client.list_users().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NetworkFailure);
    }
}
