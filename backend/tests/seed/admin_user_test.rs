// Integration tests for bootstrap seeding against the embedded engine
use cmsglue_backend::config::AdminCredentials;
use cmsglue_backend::db::{NewUser, UserStore};
use cmsglue_backend::outcome::Outcome;
use cmsglue_backend::seed::{seed, AdminUserSeed, SeedAction, SeedStep};

use crate::common::{count_users, settings, setup_embedded_db, TEST_HASH_COST};

fn admin_step(credentials: AdminCredentials) -> Vec<Box<dyn SeedStep>> {
  vec![Box::new(
    AdminUserSeed::new(credentials).with_cost(TEST_HASH_COST),
  )]
}

#[tokio::test]
async fn test_seeding_twice_creates_one_admin() {
  let db = setup_embedded_db()
    .await
    .expect("Failed to setup test database");
  let steps = admin_step(AdminCredentials::default());

  let first = seed(&db, &steps).await;
  let second = seed(&db, &steps).await;

  assert!(matches!(
    &first.steps[0].outcome,
    Outcome::Success(SeedAction::Created(email)) if email == "admin@example.com"
  ));
  assert!(matches!(
    &second.steps[0].outcome,
    Outcome::Success(SeedAction::Skipped(email)) if email == "admin@example.com"
  ));
  assert_eq!(count_users(&db).await, 1);

  let admin = db
    .find_user_by_email("admin@example.com")
    .await
    .expect("lookup")
    .expect("admin exists");
  assert_eq!(admin.name, "Admin User");
  assert!(bcrypt::verify("Admin123!", &admin.password_hash).unwrap());
}

#[tokio::test]
async fn test_credentials_come_from_settings() {
  let db = setup_embedded_db()
    .await
    .expect("Failed to setup test database");
  let settings = settings(&[
    ("ADMIN_EMAIL", "Editor@CMS.test"),
    ("ADMIN_PASSWORD", "pa55word"),
    ("ADMIN_NAME", "Chief Editor"),
  ]);

  let report = seed(&db, &admin_step(settings.admin.clone())).await;
  assert!(report.succeeded());

  let admin = db
    .find_user_by_email("editor@cms.test")
    .await
    .unwrap()
    .expect("admin exists");
  assert_eq!(admin.email, "editor@cms.test");
  assert_eq!(admin.name, "Chief Editor");
  assert!(bcrypt::verify("pa55word", &admin.password_hash).unwrap());
}

#[tokio::test]
async fn test_existing_admin_is_never_updated() {
  let db = setup_embedded_db()
    .await
    .expect("Failed to setup test database");
  let original = NewUser::with_password("admin@example.com", "Original Name", "old-pass", TEST_HASH_COST)
    .unwrap();
  db.create_user(&original).await.expect("create user");

  let report = seed(&db, &admin_step(AdminCredentials::default())).await;

  assert!(report.succeeded());
  assert_eq!(count_users(&db).await, 1);
  let admin = db
    .find_user_by_email("admin@example.com")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(admin.name, "Original Name");
  assert!(bcrypt::verify("old-pass", &admin.password_hash).unwrap());
}

#[tokio::test]
async fn test_seed_without_schema_is_swallowed() {
  use cmsglue_backend::db::{EmbeddedPool, SqliteEngineFactory};
  use std::sync::Arc;

  let factory = SqliteEngineFactory::from_url("sqlite::memory:").unwrap();
  let db = cmsglue_backend::Database::Embedded(EmbeddedPool::new(Arc::new(factory)));

  let report = seed(&db, &admin_step(AdminCredentials::default())).await;

  assert!(!report.succeeded());
  assert_eq!(report.failures(), 1);
}
