use anyhow::Result;
use cmsglue_backend::{server, Settings};

pub async fn run(settings: Settings) -> Result<()> {
    println!("🚀 Starting cmsglue server on {}...", settings.bind_address);
    println!("Press Ctrl+C to stop the server\n");
    server::run(settings).await?;
    println!("✅ Server stopped");
    Ok(())
}
