//! OAuth 2.0 refresh-token exchange for Google APIs.
//!
//! The interactive consent flow happens once, outside this service; here we
//! only trade the stored refresh token for a short-lived access token.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

use super::PROVIDER_NAME;
use super::config::OAuthCredentials;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// A short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// Lifetime in seconds, when the endpoint reports it.
    pub expires_in: Option<i64>,
}

/// OAuth client for Google's token endpoint.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
    token_url: String,
}

impl OAuthClient {
    /// Creates a new OAuth client with the given credentials.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client")
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        Ok(Self {
            credentials,
            http_client,
            token_url: GOOGLE_TOKEN_URL.to_string(),
        })
    }

    /// Overrides the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<AccessToken> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("token refresh request failed: {}", e))
                    .with_provider(PROVIDER_NAME)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e))
                .with_provider(PROVIDER_NAME)
        })?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            ))
            .with_provider(PROVIDER_NAME));
        }

        let token = parse_token_response(&body)?;
        debug!(expires_in = ?token.expires_in, "refreshed access token");
        Ok(token)
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn parse_token_response(body: &str) -> ProviderResult<AccessToken> {
    let response: TokenResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("invalid token response: {}", e))
            .with_provider(PROVIDER_NAME)
    })?;

    if response.access_token.is_empty() {
        return Err(
            ProviderError::authentication("token endpoint returned an empty access token")
                .with_provider(PROVIDER_NAME),
        );
    }

    Ok(AccessToken {
        token: response.access_token,
        expires_in: response.expires_in,
    })
}
