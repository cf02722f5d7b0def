//! Google Calendar gateway.
//!
//! The service authenticates with a long-lived OAuth refresh token. For
//! every request [`GoogleConnector`] exchanges it for a short-lived access
//! token and builds a fresh [`GoogleCalendarClient`]; nothing is cached.
//!
//! ```ignore
//! use notecal_providers::google::{GoogleConfig, GoogleConnector, OAuthCredentials};
//!
//! let config = GoogleConfig::new(
//!     OAuthCredentials::new("id.apps.googleusercontent.com", "secret"),
//!     "refresh-token",
//! );
//! let gateway = GoogleConnector::new(config).connect().await?;
//! let event = gateway.get("primary", "ev-1").await?;
//! ```

mod client;
mod config;
mod connector;
mod oauth;

pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use connector::GoogleConnector;
pub use oauth::{AccessToken, OAuthClient};

/// Provider name attached to errors and logs.
pub(crate) const PROVIDER_NAME: &str = "google";
