// Tests for the managed Postgres adapter initializer
use cmsglue_backend::config::Transport;
use cmsglue_backend::db::managed::PoolState;
use cmsglue_backend::db::{AdapterError, ManagedAdapter, PoolConfig};
use cmsglue_backend::Database;
use std::time::Duration;

use crate::common::{settings, CountingConnector, TEST_DATABASE_URI};

fn adapter(vars: &[(&str, &str)]) -> ManagedAdapter<CountingConnector> {
  ManagedAdapter::with_connector(settings(vars), CountingConnector::default())
}

fn adapter_error(err: &anyhow::Error) -> &AdapterError {
  err
    .downcast_ref::<AdapterError>()
    .expect("error should carry an AdapterError")
}

#[tokio::test]
async fn test_missing_database_uri_fails_before_any_io() {
  let adapter = adapter(&[("NODE_ENV", "production")]);

  let err = adapter
    .create_adapter()
    .await
    .expect_err("missing DATABASE_URI must fail");

  assert!(matches!(adapter_error(&err), AdapterError::MissingConnectionString));
  assert!(err.to_string().contains("Failed to initialize managed Postgres adapter"));
  assert_eq!(adapter.connector().opens(), 0);
  assert_eq!(adapter.connector().probes(), 0);
  assert_eq!(adapter.state(), PoolState::Uninitialized);
}

#[tokio::test]
async fn test_pool_is_built_and_probed_once() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI), ("NODE_ENV", "development")]);

  let first = adapter.create_adapter().await.expect("first call");
  let second = adapter.create_adapter().await.expect("second call");
  let third = adapter.create_adapter().await.expect("third call");

  assert_eq!(adapter.connector().opens(), 1);
  assert_eq!(adapter.connector().probes(), 1);
  assert_eq!(adapter.state(), PoolState::Ready);

  let expected = PoolConfig {
    connection_string: TEST_DATABASE_URI.to_string(),
    ssl: true,
    max: 10,
    idle_timeout_millis: 30_000,
  };
  for descriptor in [first, second, third] {
    assert_eq!(descriptor.pool_config(), Some(&expected));
  }
}

#[tokio::test]
async fn test_production_gets_a_larger_pool() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI), ("NODE_ENV", "production")]);

  let descriptor = adapter.create_adapter().await.expect("create adapter");

  let config = descriptor.pool_config().expect("pool descriptor");
  assert_eq!(config.max, 20);
  assert!(config.ssl);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_initialization() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI)]);

  let (a, b, c, d) = tokio::join!(
    adapter.create_adapter(),
    adapter.create_adapter(),
    adapter.create_adapter(),
    adapter.create_adapter(),
  );

  for result in [a, b, c, d] {
    assert!(result.is_ok());
  }
  assert_eq!(adapter.connector().opens(), 1);
  assert_eq!(adapter.connector().probes(), 1);
}

#[tokio::test]
async fn test_failed_probe_is_not_cached() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI)]);
  adapter.connector().set_probe_failure(true);

  let err = adapter.create_adapter().await.expect_err("probe failure");
  assert!(matches!(adapter_error(&err), AdapterError::Probe(_)));
  assert_eq!(adapter.state(), PoolState::Uninitialized);
  assert_eq!(adapter.connector().closes(), 1);

  adapter.connector().set_probe_failure(false);
  adapter.create_adapter().await.expect("retry succeeds");

  assert_eq!(adapter.connector().opens(), 2);
  assert_eq!(adapter.connector().probes(), 2);
  assert_eq!(adapter.state(), PoolState::Ready);

  adapter.create_adapter().await.expect("cached");
  assert_eq!(adapter.connector().probes(), 2);
}

#[tokio::test]
async fn test_transport_selection() {
  let socket = adapter(&[("DATABASE_URI", TEST_DATABASE_URI)]);
  socket.create_adapter().await.unwrap();
  assert_eq!(
    *socket.connector().last_transport.lock().unwrap(),
    Some(Transport::WebSocket)
  );

  let http = adapter(&[("DATABASE_URI", TEST_DATABASE_URI), ("DATABASE_TRANSPORT", "http")]);
  http.create_adapter().await.unwrap();
  assert_eq!(
    *http.connector().last_transport.lock().unwrap(),
    Some(Transport::Http)
  );
}

#[tokio::test]
async fn test_shutdown_closes_once_and_refuses_reinit() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI)]);
  adapter.create_adapter().await.unwrap();

  adapter.shutdown().await;
  adapter.shutdown().await;

  assert_eq!(adapter.connector().closes(), 1);
  assert_eq!(adapter.state(), PoolState::ShutDown);

  let err = adapter.create_adapter().await.expect_err("shut down");
  assert!(matches!(adapter_error(&err), AdapterError::ShutDown));
  assert_eq!(adapter.connector().opens(), 1);
}

#[tokio::test]
async fn test_shutdown_before_init_closes_nothing() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI)]);
  adapter.shutdown().await;
  assert_eq!(adapter.connector().closes(), 0);
  assert_eq!(adapter.state(), PoolState::ShutDown);
}

#[tokio::test]
async fn test_shutdown_during_initialization_still_closes_the_pool() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI)]);

  let (result, _) = tokio::join!(adapter.create_adapter(), async {
    tokio::time::sleep(Duration::from_millis(5)).await;
    adapter.shutdown().await;
  });

  assert!(result.is_ok());
  assert_eq!(adapter.state(), PoolState::ShutDown);
  assert_eq!(adapter.connector().opens(), 1);
  assert_eq!(adapter.connector().closes(), adapter.connector().opens());
  assert!(adapter.connector().last_pool().expect("pool opened").is_closed());
}

#[tokio::test]
async fn test_database_reuses_the_probed_pool() {
  let adapter = adapter(&[("DATABASE_URI", TEST_DATABASE_URI)]);
  assert!(adapter.database().is_none());

  adapter.create_adapter().await.expect("create adapter");
  let first = adapter.database().expect("database after init");
  let second = adapter.database().expect("database after init");
  assert_eq!(adapter.connector().opens(), 1);

  let Database::Postgres(pool) = &first else {
    panic!("expected a Postgres database");
  };
  assert_eq!(pool.options().get_max_connections(), 10);

  first.close().await;
  assert!(adapter.connector().last_pool().expect("pool opened").is_closed());
  let Database::Postgres(pool) = &second else {
    panic!("expected a Postgres database");
  };
  assert!(pool.is_closed());
}
