//! Command-line interface definition.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use notecal_core::{TracingConfig, TracingOutputFormat, parse_time_zone};
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// notecal-server - create, update and delete calendar events from your notes
#[derive(Debug, Parser)]
#[command(name = "notecal-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "NOTECAL_BIND", default_value = "127.0.0.1:8787")]
    pub bind: SocketAddr,

    /// Time zone for updates that change the date without naming one
    #[arg(long, env = "NOTECAL_DEFAULT_TIME_ZONE", default_value = "Etc/UTC")]
    pub default_time_zone: String,

    /// Timeout in seconds for each request to Google
    #[arg(long, env = "NOTECAL_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Allowed CORS origins, comma separated (default: any)
    #[arg(long, env = "NOTECAL_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, default_value = "compact")]
    pub log_format: TracingOutputFormat,

    /// Google OAuth client id
    #[arg(long, env = "GOOGLE_CLIENT_ID", default_value = "", hide_env_values = true)]
    pub google_client_id: String,

    /// Google OAuth client secret
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub google_client_secret: String,

    /// Refresh token of the account whose calendars are edited
    #[arg(long, env = "GOOGLE_REFRESH_TOKEN", default_value = "", hide_env_values = true)]
    pub google_refresh_token: String,
}

impl Cli {
    /// Builds the server configuration, rejecting an unknown default zone.
    pub fn server_config(&self) -> ServerResult<ServerConfig> {
        let tz = parse_time_zone(&self.default_time_zone).ok_or_else(|| {
            ServerError::config(format!(
                "unknown time zone \"{}\" in NOTECAL_DEFAULT_TIME_ZONE",
                self.default_time_zone
            ))
        })?;

        let origins = self
            .cors_origins
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(ServerConfig::new(self.bind)
            .with_default_time_zone(tz)
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_cors_origins(origins))
    }

    pub fn tracing_config(&self) -> TracingConfig {
        let level = if self.debug { Level::DEBUG } else { Level::INFO };
        TracingConfig::server()
            .with_level(level)
            .with_format(self.log_format)
    }
}
