use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::Settings;
use crate::db::embedded::{EmbeddedAdapter, EmbeddedPool};
use crate::db::managed::ManagedAdapter;
use crate::db::Database;

pub const EMBEDDED_DATABASE_NAME: &str = "cmsglue_embedded";
pub const MIGRATION_DIR: &str = "./migrations";

/// Conditions callers of the adapter initializers can match on.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("DATABASE_URI environment variable is not defined")]
    MissingConnectionString,
    #[error("invalid DATABASE_URI")]
    InvalidConnectionString(#[source] sqlx::Error),
    #[error("failed to open connection pool")]
    Connect(#[source] anyhow::Error),
    #[error("liveness probe failed")]
    Probe(#[source] anyhow::Error),
    #[error("connection pool has been shut down")]
    ShutDown,
}

/// Pool configuration handed to the Postgres adapter factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    pub connection_string: String,
    pub ssl: bool,
    pub max: u32,
    pub idle_timeout_millis: u64,
}

impl PoolConfig {
    pub const IDLE_TIMEOUT_MILLIS: u64 = 30_000;
    pub const PRODUCTION_MAX: u32 = 20;
    pub const DEFAULT_MAX: u32 = 10;

    /// Configuration for the managed database described by `settings`.
    pub fn managed(settings: &Settings, ssl: bool) -> Result<Self, AdapterError> {
        let connection_string = settings
            .database_uri
            .clone()
            .ok_or(AdapterError::MissingConnectionString)?;

        let max = if settings.environment.is_production() {
            Self::PRODUCTION_MAX
        } else {
            Self::DEFAULT_MAX
        };

        Ok(Self {
            connection_string,
            ssl,
            max,
            idle_timeout_millis: Self::IDLE_TIMEOUT_MILLIS,
        })
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, AdapterError> {
        let options = PgConnectOptions::from_str(&self.connection_string)
            .map_err(AdapterError::InvalidConnectionString)?;
        let ssl_mode = if self.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        Ok(options.ssl_mode(ssl_mode))
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max)
            .idle_timeout(Duration::from_millis(self.idle_timeout_millis))
            .acquire_timeout(Duration::from_secs(5))
    }

    /// Copy with the password in the connection string masked.
    pub fn redacted(&self) -> Self {
        let connection_string = match url::Url::parse(&self.connection_string) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("****"));
                url.to_string()
            }
            Ok(url) => url.to_string(),
            Err(_) => "****".to_string(),
        };
        Self {
            connection_string,
            ..self.clone()
        }
    }
}

/// What an adapter initializer hands back to the host.
#[derive(Debug, Clone)]
pub enum AdapterDescriptor {
    Pool(PoolConfig),
    Embedded {
        pool: EmbeddedPool,
        database: String,
        migration_dir: PathBuf,
    },
}

impl AdapterDescriptor {
    pub fn embedded(pool: EmbeddedPool) -> Self {
        AdapterDescriptor::Embedded {
            pool,
            database: EMBEDDED_DATABASE_NAME.to_string(),
            migration_dir: PathBuf::from(MIGRATION_DIR),
        }
    }

    pub fn pool_config(&self) -> Option<&PoolConfig> {
        match self {
            AdapterDescriptor::Pool(config) => Some(config),
            AdapterDescriptor::Embedded { .. } => None,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, AdapterDescriptor::Embedded { .. })
    }

    /// JSON view for operators; never includes the raw password.
    pub fn describe(&self) -> serde_json::Value {
        match self {
            AdapterDescriptor::Pool(config) => serde_json::json!({
                "kind": "pool",
                "pool": config.redacted(),
            }),
            AdapterDescriptor::Embedded {
                pool,
                database,
                migration_dir,
            } => serde_json::json!({
                "kind": "embedded",
                "database": database,
                "migrationDir": migration_dir.display().to_string(),
                "started": pool.is_started(),
            }),
        }
    }
}

/// The adapter initializer selected for this process.
pub enum AdapterHandle {
    Managed(ManagedAdapter),
    Embedded(EmbeddedAdapter),
}

impl AdapterHandle {
    pub fn from_settings(settings: Settings) -> Self {
        match settings.adapter {
            crate::config::AdapterKind::Managed => {
                AdapterHandle::Managed(ManagedAdapter::new(settings))
            }
            crate::config::AdapterKind::Embedded => {
                AdapterHandle::Embedded(EmbeddedAdapter::new(settings))
            }
        }
    }

    pub async fn create_adapter(&self) -> anyhow::Result<AdapterDescriptor> {
        match self {
            AdapterHandle::Managed(adapter) => adapter.create_adapter().await,
            AdapterHandle::Embedded(adapter) => adapter.create_adapter().await,
        }
    }

    /// Create the adapter and the data store on top of it. A managed handle
    /// hands over its probed pool instead of opening another one.
    pub async fn open_database(&self) -> anyhow::Result<(AdapterDescriptor, Database)> {
        let descriptor = self.create_adapter().await?;
        let db = match self {
            AdapterHandle::Managed(adapter) => {
                adapter.database().ok_or(AdapterError::ShutDown)?
            }
            AdapterHandle::Embedded(_) => Database::from_descriptor(&descriptor)?,
        };
        Ok((descriptor, db))
    }

    /// Release whatever the handle owns. The embedded engine is kept.
    pub async fn shutdown(&self) {
        if let AdapterHandle::Managed(adapter) = self {
            adapter.shutdown().await;
        }
    }
}
