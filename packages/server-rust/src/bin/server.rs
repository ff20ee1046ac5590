//! Stratum server entry point.

use anyhow::Context;
use stratum_server::config::Settings;
use stratum_server::network::{shutdown_signal, NetworkModule};
use stratum_server::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables take precedence.
    let dotenv = dotenvy::dotenv();

    let settings = Settings::load();
    let _telemetry_guard =
        telemetry::init_tracing(&settings).context("failed to initialize logging")?;

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %settings.environment,
        "starting {}",
        settings.app_name
    );

    let mut module = NetworkModule::new(settings);
    let port = module.start().await.context("failed to bind listener")?;
    tracing::info!(port, "health check at /health, API under /api/v1");

    module.serve(shutdown_signal()).await?;
    Ok(())
}
