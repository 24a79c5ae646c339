//! Bootstrap data seeding.
//!
//! Steps run in order. A failing step is logged and the remaining steps
//! still run; nothing here ever stops the application from starting.

pub mod admin_user;

pub use admin_user::AdminUserSeed;

use async_trait::async_trait;

use crate::config::Settings;
use crate::db::UserStore;
use crate::outcome::Outcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedAction {
    Created(String),
    Skipped(String),
}

#[async_trait]
pub trait SeedStep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, store: &dyn UserStore) -> Outcome<SeedAction>;
}

#[derive(Debug)]
pub struct StepReport {
    pub name: &'static str,
    pub outcome: Outcome<SeedAction>,
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub steps: Vec<StepReport>,
}

impl SeedReport {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|step| step.outcome.is_success())
    }

    pub fn failures(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| !step.outcome.is_success())
            .count()
    }
}

pub async fn seed(store: &dyn UserStore, steps: &[Box<dyn SeedStep>]) -> SeedReport {
    tracing::info!(steps = steps.len(), "Starting data seeding");

    let mut report = SeedReport::default();
    for step in steps {
        let outcome = step.run(store).await.tolerated();
        match &outcome {
            Outcome::Success(action) => {
                tracing::debug!(step = step.name(), action = ?action, "Seed step finished");
            }
            Outcome::Tolerated(e) | Outcome::Fatal(e) => {
                tracing::error!(step = step.name(), error = %format!("{:#}", e), "Error during data seeding");
            }
        }
        report.steps.push(StepReport {
            name: step.name(),
            outcome,
        });
    }

    if report.succeeded() {
        tracing::info!("Data seeding completed successfully");
    } else {
        tracing::warn!(failures = report.failures(), "Data seeding finished with errors");
    }
    report
}

/// Run the default steps with credentials from `settings`.
pub async fn seed_defaults(store: &dyn UserStore, settings: &Settings) -> SeedReport {
    let steps: Vec<Box<dyn SeedStep>> = vec![Box::new(AdminUserSeed::new(settings.admin.clone()))];
    seed(store, &steps).await
}
