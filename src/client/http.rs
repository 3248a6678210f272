//! Auth API client over HTTP.

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use std::future::Future;

use crate::auth::{RegisterRequest, TokenResponse};
use crate::domain::User;
use crate::handlers::API_PREFIX;
use crate::validation::ValidationError;

pub const GENERIC_ERROR: &str = "An error occurred";
pub const LOGIN_FAILED_FALLBACK: &str = "Login failed";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("{message}")]
    Remote { status: u16, message: String },
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// Whether the server rejected the request (as opposed to never answering)
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

/// Account operations. One request per call; no retries.
pub trait AuthApi: Send + Sync {
    fn register(&self, request: &RegisterRequest) -> impl Future<Output = Result<User, ClientError>> + Send;

    fn login(&self, username: &str, password: &str) -> impl Future<Output = Result<TokenResponse, ClientError>> + Send;

    fn current_user(&self, token: &str) -> impl Future<Output = Result<User, ClientError>> + Send;

    fn logout(&self, token: &str) -> impl Future<Output = Result<(), ClientError>> + Send;
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: Option<serde_json::Value>,
}

/// `detail` from an error body when it is a string
fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorDetail>(body)
        .ok()
        .and_then(|e| e.detail)
        .and_then(|d| d.as_str().map(String::from))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// reqwest-backed client for the FluentFusion API
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    http: Client,
    base_url: String,
}

impl HttpAuthClient {
    /// `base_url` is the server root, e.g. `http://localhost:8000`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}/auth{}", self.base_url, API_PREFIX, path)
    }

    async fn send(request: RequestBuilder, fallback: &str) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Remote {
            status: status.as_u16(),
            message: error_message(&body, fallback),
        })
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder, fallback: &str) -> Result<T, ClientError> {
        Ok(Self::send(request, fallback).await?.json().await?)
    }
}

impl AuthApi for HttpAuthClient {
    async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        Self::send_json(self.http.post(self.url("/register")).json(request), GENERIC_ERROR).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let form = [("username", username), ("password", password)];
        Self::send_json(self.http.post(self.url("/login")).form(&form), LOGIN_FAILED_FALLBACK).await
    }

    async fn current_user(&self, token: &str) -> Result<User, ClientError> {
        Self::send_json(self.http.get(self.url("/me")).bearer_auth(token), GENERIC_ERROR).await
    }

    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        Self::send(self.http.post(self.url("/logout")).bearer_auth(token), GENERIC_ERROR).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"detail":"Username already registered"}"#, GENERIC_ERROR), "Username already registered");
        assert_eq!(error_message("<html>bad gateway</html>", GENERIC_ERROR), GENERIC_ERROR);
        assert_eq!(error_message(r#"{"detail":[{"msg":"field required"}]}"#, GENERIC_ERROR), GENERIC_ERROR);
        assert_eq!(error_message("", LOGIN_FAILED_FALLBACK), LOGIN_FAILED_FALLBACK);
    }

    #[test]
    fn test_url_building() {
        let client = HttpAuthClient::new("http://localhost:8000/");
        assert_eq!(client.url("/login"), "http://localhost:8000/api/v1/auth/login");
    }
}
