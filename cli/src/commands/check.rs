use anyhow::Result;
use cmsglue_backend::db::AdapterHandle;
use cmsglue_backend::Settings;

pub async fn run(settings: Settings) -> Result<()> {
    println!("🔍 Environment: {}", settings.environment);
    println!("🔌 Initializing {:?} adapter...", settings.adapter);

    let handle = AdapterHandle::from_settings(settings);
    let result = handle.create_adapter().await;
    handle.shutdown().await;

    let descriptor = match result {
        Ok(descriptor) => descriptor,
        Err(e) => {
            println!("❌ Adapter initialization failed: {:#}", e);
            return Err(e);
        }
    };

    println!("✅ Adapter ready");
    println!("{}", serde_json::to_string_pretty(&descriptor.describe())?);
    Ok(())
}
