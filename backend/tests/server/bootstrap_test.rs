// Tests for the server bootstrap and its cleanup paths
use cmsglue_backend::db::{AdapterError, AdapterHandle, UserStore};
use cmsglue_backend::{seed, server};

use crate::common::{count_users, settings};

#[tokio::test]
async fn test_open_database_and_seed_in_development() {
  let settings = settings(&[("NODE_ENV", "development")]);
  let handle = AdapterHandle::from_settings(settings.clone());

  let db = server::open_database(&handle)
    .await
    .expect("embedded database opens without DATABASE_URI");
  let report = seed::seed_defaults(&db, &settings).await;

  assert!(report.succeeded());
  assert_eq!(count_users(&db).await, 1);
  assert!(db
    .find_user_by_email("admin@example.com")
    .await
    .unwrap()
    .is_some());

  // Same engine, migrations already applied
  let again = server::open_database(&handle).await.expect("reopen");
  assert_eq!(count_users(&again).await, 1);

  db.close().await;
  handle.shutdown().await;
}

#[tokio::test]
async fn test_run_reports_bind_failure() {
  let settings = settings(&[("NODE_ENV", "development"), ("BIND_ADDRESS", "missing-port")]);
  let handle = AdapterHandle::from_settings(settings.clone());

  let err = server::run_with(&handle, &settings)
    .await
    .expect_err("address without a port cannot be bound");

  assert!(format!("{:#}", err).contains("Failed to bind missing-port"));
}

#[tokio::test]
async fn test_run_shuts_down_handle_when_adapter_is_fatal() {
  let settings = settings(&[("DATABASE_ADAPTER", "managed"), ("NODE_ENV", "production")]);
  let handle = AdapterHandle::from_settings(settings.clone());

  let err = server::run_with(&handle, &settings)
    .await
    .expect_err("managed adapter without DATABASE_URI is fatal");
  assert!(matches!(
    err.downcast_ref::<AdapterError>(),
    Some(AdapterError::MissingConnectionString)
  ));

  let err = handle
    .create_adapter()
    .await
    .expect_err("handle is shut down after run");
  assert!(matches!(
    err.downcast_ref::<AdapterError>(),
    Some(AdapterError::ShutDown)
  ));
}
