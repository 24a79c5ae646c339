//! In-process SQL engine for local development.
//!
//! [`EmbeddedPool`] presents the small pool surface the data layer needs
//! (`query`, `connect`, `end`) and starts a single engine the first time it
//! is used. The engine is never torn down; `end` does nothing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::migrate::Migrator;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;

use crate::config::Settings;
use crate::db::adapter::{AdapterDescriptor, PoolConfig};
use crate::outcome::Outcome;

/// Starts the embedded engine.
#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    async fn start(&self) -> Result<SqlitePool>;
}

/// SQLite engine, in memory unless the URL names a file.
#[derive(Debug, Clone)]
pub struct SqliteEngineFactory {
    options: SqliteConnectOptions,
}

impl SqliteEngineFactory {
    pub fn from_url(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid embedded database URL: {}", url))?;
        Ok(Self { options })
    }
}

#[async_trait]
impl EngineFactory for SqliteEngineFactory {
    async fn start(&self) -> Result<SqlitePool> {
        // One connection, never recycled: an in-memory database lives and
        // dies with its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(self.options.clone())
            .await
            .context("Failed to open embedded engine")?;
        Ok(pool)
    }
}

/// Rows returned by a query, shaped like a Postgres driver result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<Map<String, Value>>,
    pub row_count: u64,
}

struct EmbeddedInner {
    factory: Arc<dyn EngineFactory>,
    engine: OnceCell<SqlitePool>,
}

#[derive(Clone)]
pub struct EmbeddedPool {
    inner: Arc<EmbeddedInner>,
}

impl fmt::Debug for EmbeddedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedPool")
            .field("started", &self.is_started())
            .finish()
    }
}

impl EmbeddedPool {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            inner: Arc::new(EmbeddedInner {
                factory,
                engine: OnceCell::new(),
            }),
        }
    }

    pub fn is_started(&self) -> bool {
        self.inner.engine.initialized()
    }

    async fn engine(&self) -> Result<&SqlitePool> {
        self.inner
            .engine
            .get_or_try_init(|| async {
                tracing::info!("Initializing in-memory SQL engine...");
                let engine = self.inner.factory.start().await.inspect_err(|e| {
                    tracing::error!(error = %e, "Failed to initialize embedded engine");
                })?;
                sqlx::query("SELECT 1")
                    .execute(&engine)
                    .await
                    .context("Embedded engine did not become ready")?;
                tracing::info!("Embedded engine initialized successfully");
                Ok::<_, anyhow::Error>(engine)
            })
            .await
    }

    /// Run `text` with positional `$n` parameters.
    pub async fn query(&self, text: &str, params: &[Value]) -> Result<QueryResult> {
        let engine = self.engine().await?;
        run_query(engine, text, params).await.inspect_err(|e| {
            tracing::error!(error = %e, "Error executing query with embedded engine");
        })
    }

    /// Apply `migrator` to the engine, starting it if needed.
    pub async fn migrate(&self, migrator: &Migrator) -> Result<()> {
        let engine = self.engine().await?;
        migrator
            .run(engine)
            .await
            .context("Failed to run migrations on embedded engine")
    }

    pub async fn connect(&self) -> Result<EmbeddedClient> {
        self.engine().await?;
        Ok(EmbeddedClient { pool: self.clone() })
    }

    /// Does nothing: the engine is kept for the life of the process.
    pub async fn end(&self) {}
}

/// Client handed out by [`EmbeddedPool::connect`].
#[derive(Debug, Clone)]
pub struct EmbeddedClient {
    pool: EmbeddedPool,
}

impl EmbeddedClient {
    pub async fn query(&self, text: &str, params: &[Value]) -> Result<QueryResult> {
        self.pool.query(text, params).await
    }

    pub fn release(&self) {}

    pub async fn end(&self) {}
}

async fn run_query(engine: &SqlitePool, text: &str, params: &[Value]) -> Result<QueryResult> {
    let mut conn = engine.acquire().await?;

    let changes_before: i64 = sqlx::query_scalar("SELECT total_changes()")
        .fetch_one(&mut *conn)
        .await?;

    let query = params
        .iter()
        .fold(sqlx::query(text), |query, param| bind_json(query, param));
    let rows = query.fetch_all(&mut *conn).await?;

    let row_count = if rows.is_empty() {
        let changes_after: i64 = sqlx::query_scalar("SELECT total_changes()")
            .fetch_one(&mut *conn)
            .await?;
        changes_after.saturating_sub(changes_before).max(0) as u64
    } else {
        rows.len() as u64
    };

    Ok(QueryResult {
        rows: rows.iter().map(row_to_json).collect(),
        row_count,
    })
}

fn bind_json<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

fn row_to_json(row: &SqliteRow) -> Map<String, Value> {
    let mut object = Map::new();
    for column in row.columns() {
        let index = column.ordinal();
        let kind = match row.try_get_raw(index) {
            Ok(raw) if !raw.is_null() => Some(raw.type_info().name().to_string()),
            _ => None,
        };
        let value = match kind.as_deref() {
            None => Value::Null,
            Some("INTEGER") => row
                .try_get::<i64, _>(index)
                .map(Value::from)
                .unwrap_or(Value::Null),
            Some("REAL") => row
                .try_get::<f64, _>(index)
                .map(Value::from)
                .unwrap_or(Value::Null),
            Some("BLOB") => row
                .try_get::<Vec<u8>, _>(index)
                .map(|bytes| Value::String(hex::encode(bytes)))
                .unwrap_or(Value::Null),
            Some(_) => row
                .try_get::<String, _>(index)
                .map(Value::String)
                .unwrap_or(Value::Null),
        };
        object.insert(column.name().to_string(), value);
    }
    object
}

pub struct EmbeddedAdapter {
    settings: Settings,
    factory: Option<Arc<dyn EngineFactory>>,
    shim: OnceLock<EmbeddedPool>,
}

impl EmbeddedAdapter {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            factory: None,
            shim: OnceLock::new(),
        }
    }

    pub fn with_factory(settings: Settings, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            settings,
            factory: Some(factory),
            shim: OnceLock::new(),
        }
    }

    /// Production gets the managed pool configuration; everything else gets
    /// the embedded shim, or the managed configuration if the shim cannot be
    /// built.
    pub async fn create_adapter(&self) -> Result<AdapterDescriptor> {
        if self.settings.environment.is_production() {
            let config = PoolConfig::managed(&self.settings, true)
                .context("Failed to configure production Postgres adapter")?;
            return Ok(AdapterDescriptor::Pool(config));
        }

        match self.build_shim() {
            Outcome::Success(pool) => Ok(AdapterDescriptor::embedded(pool)),
            failed => {
                if let Some(e) = failed.error() {
                    tracing::error!(error = %e, "Failed to create embedded adapter");
                }
                tracing::warn!("Falling back to managed Postgres database");
                let config = PoolConfig::managed(&self.settings, false)
                    .context("Embedded engine unavailable and no managed database configured")?;
                Ok(AdapterDescriptor::Pool(config))
            }
        }
    }

    fn build_shim(&self) -> Outcome<EmbeddedPool> {
        if let Some(pool) = self.shim.get() {
            return Outcome::Success(pool.clone());
        }

        let factory: Arc<dyn EngineFactory> = match &self.factory {
            Some(factory) => factory.clone(),
            None => match SqliteEngineFactory::from_url(&self.settings.embedded_url) {
                Ok(factory) => Arc::new(factory),
                Err(e) => return Outcome::Tolerated(e),
            },
        };

        Outcome::Success(self.shim.get_or_init(|| EmbeddedPool::new(factory)).clone())
    }
}
