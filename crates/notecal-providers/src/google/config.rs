//! Google Calendar gateway configuration.

use std::time::Duration;

/// OAuth 2.0 client credentials from the Google Cloud Console.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Checks that the credentials look like Google OAuth client credentials.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Everything needed to talk to Google Calendar on behalf of one account.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,

    /// Refresh token for the account whose calendars are edited.
    pub refresh_token: String,

    /// Timeout applied to token and calendar requests.
    pub timeout: Duration,
}

impl GoogleConfig {
    pub fn new(credentials: OAuthCredentials, refresh_token: impl Into<String>) -> Self {
        Self {
            credentials,
            refresh_token: refresh_token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Builder: set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates credentials and refresh token.
    pub fn validate(&self) -> Result<(), &'static str> {
        self.credentials.validate()?;
        if self.refresh_token.trim().is_empty() {
            return Err("refresh_token is required");
        }
        Ok(())
    }
}
