use anyhow::Result;
use cmsglue_backend::db::AdapterHandle;
use cmsglue_backend::outcome::Outcome;
use cmsglue_backend::seed::{self, SeedAction};
use cmsglue_backend::{server, Settings};

pub async fn run(settings: Settings) -> Result<()> {
    println!("🌱 Starting data seeding...");

    let handle = AdapterHandle::from_settings(settings.clone());
    let result = async {
        let db = server::open_database(&handle).await?;
        let report = seed::seed_defaults(&db, &settings).await;
        db.close().await;
        Ok::<_, anyhow::Error>(report)
    }
    .await;
    handle.shutdown().await;

    let report = result?;
    for step in &report.steps {
        match &step.outcome {
            Outcome::Success(SeedAction::Created(what)) => {
                println!("  ✅ {}: created {}", step.name, what)
            }
            Outcome::Success(SeedAction::Skipped(what)) => {
                println!("  ⏭️  {}: {} already exists, skipped", step.name, what)
            }
            Outcome::Tolerated(e) | Outcome::Fatal(e) => {
                println!("  ❌ {}: {:#}", step.name, e)
            }
        }
    }

    if report.succeeded() {
        println!("✅ Data seeding completed successfully");
    } else {
        println!("⚠️  Data seeding finished with {} error(s)", report.failures());
    }
    Ok(())
}
