pub mod adapter;
pub mod embedded;
pub mod managed;
pub mod models;
pub mod users;

pub use adapter::{AdapterDescriptor, AdapterError, AdapterHandle, PoolConfig};
pub use embedded::{EmbeddedAdapter, EmbeddedPool, EngineFactory, SqliteEngineFactory};
pub use managed::{ManagedAdapter, PostgresConnector, SqlxConnector};
pub use models::*;
pub use users::UserStore;

use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

/// Schema migrations, shared by both backends.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Data-store handle built from an adapter descriptor.
#[derive(Clone, Debug)]
pub enum Database {
    Postgres(PgPool),
    Embedded(EmbeddedPool),
}

impl Database {
    /// Turn a descriptor into a usable store. Postgres pools connect lazily.
    pub fn from_descriptor(descriptor: &AdapterDescriptor) -> anyhow::Result<Self> {
        match descriptor {
            AdapterDescriptor::Pool(config) => {
                let options = config.connect_options()?;
                Ok(Database::Postgres(
                    config.pool_options().connect_lazy_with(options),
                ))
            }
            AdapterDescriptor::Embedded { pool, .. } => Ok(Database::Embedded(pool.clone())),
        }
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        match self {
            Database::Postgres(pool) => {
                MIGRATOR
                    .run(pool)
                    .await
                    .context("Failed to run migrations")?;
            }
            Database::Embedded(pool) => pool.migrate(&MIGRATOR).await?,
        }
        tracing::info!("Migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            Database::Postgres(pool) => pool.close().await,
            Database::Embedded(pool) => pool.end().await,
        }
    }

    /// Log current pool metrics
    pub fn log_pool_metrics(&self) {
        match self {
            Database::Postgres(pool) => {
                let size = pool.size();
                let num_idle = pool.num_idle();
                let active = size.saturating_sub(num_idle as u32);

                tracing::info!(
                    pool_size = size,
                    idle_connections = num_idle,
                    active_connections = active,
                    "Connection pool metrics"
                );
            }
            Database::Embedded(pool) => {
                tracing::info!(started = pool.is_started(), "Embedded engine metrics");
            }
        }
    }
}
