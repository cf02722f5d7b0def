use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use notecal_core::init_tracing;
use notecal_providers::google::{GoogleConfig, GoogleConnector, OAuthCredentials};
use notecal_server::{Cli, ServerError, ServerResult, serve};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()).map_err(ServerError::from) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let config = cli.server_config()?;

    let google = GoogleConfig::new(
        OAuthCredentials::new(&cli.google_client_id, &cli.google_client_secret),
        &cli.google_refresh_token,
    )
    .with_timeout(config.request_timeout);
    if let Err(e) = google.validate() {
        warn!("Google credentials incomplete, requests will be rejected: {}", e);
    }

    serve(config, Arc::new(GoogleConnector::new(google))).await
}
