use cmsglue_backend::{server, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings = Settings::from_env();
    tracing::info!(
        environment = %settings.environment,
        adapter = ?settings.adapter,
        "Starting cmsglue backend"
    );

    server::run(settings).await
}
