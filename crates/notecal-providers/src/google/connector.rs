//! Per-request gateway construction.

use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::gateway::{BoxFuture, CalendarGateway, GatewayConnector};

use super::PROVIDER_NAME;
use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;

/// Builds a freshly authenticated [`GoogleCalendarClient`] on every call.
#[derive(Debug, Clone)]
pub struct GoogleConnector {
    config: GoogleConfig,
    api_base_url: Option<String>,
    token_url: Option<String>,
}

impl GoogleConnector {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            api_base_url: None,
            token_url: None,
        }
    }

    /// Builder: point calendar requests at another base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Builder: point token refresh at another endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    async fn connect_google(&self) -> ProviderResult<GoogleCalendarClient> {
        self.config.validate().map_err(|e| {
            ProviderError::authentication(format!("invalid Google credentials: {}", e))
                .with_provider(PROVIDER_NAME)
        })?;

        let mut oauth = OAuthClient::new(self.config.credentials.clone(), self.config.timeout)?;
        if let Some(ref url) = self.token_url {
            oauth = oauth.with_token_url(url);
        }
        let access = oauth.refresh_token(&self.config.refresh_token).await?;
        debug!("acquired access token for request");

        let mut client = GoogleCalendarClient::new(access.token, self.config.timeout)?;
        if let Some(ref url) = self.api_base_url {
            client = client.with_base_url(url);
        }
        Ok(client)
    }
}

impl GatewayConnector for GoogleConnector {
    fn connect(&self) -> BoxFuture<'_, ProviderResult<Box<dyn CalendarGateway>>> {
        Box::pin(async move {
            let client = self.connect_google().await?;
            Ok(Box::new(client) as Box<dyn CalendarGateway>)
        })
    }
}
