// User database operations
use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
  models::{NewUser, User},
  Database,
};

/// Lookup and creation of user records, keyed by email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
  async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

  async fn create_user(&self, user: &NewUser) -> anyhow::Result<User>;
}

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at";

#[async_trait]
impl UserStore for Database {
  async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    let email = email.to_lowercase();

    match self {
      Database::Postgres(pool) => {
        let user = sqlx::query_as::<_, User>(&sql)
          .bind(email)
          .fetch_optional(pool)
          .await?;
        Ok(user)
      }
      Database::Embedded(pool) => {
        let result = pool.query(&sql, &[json!(email)]).await?;
        result
          .rows
          .into_iter()
          .next()
          .map(|row| serde_json::from_value::<User>(Value::Object(row)))
          .transpose()
          .map_err(Into::into)
      }
    }
  }

  async fn create_user(&self, user: &NewUser) -> anyhow::Result<User> {
    let sql = format!(
      "INSERT INTO users (id, email, name, password_hash, created_at)
       VALUES ($1, $2, $3, $4, $5)
       RETURNING {}",
      USER_COLUMNS
    );
    let id = Uuid::new_v4().to_string();
    let email = user.email.to_lowercase();
    let created_at = chrono::Utc::now().to_rfc3339();

    match self {
      Database::Postgres(pool) => {
        let user = sqlx::query_as::<_, User>(&sql)
          .bind(&id)
          .bind(&email)
          .bind(&user.name)
          .bind(&user.password_hash)
          .bind(&created_at)
          .fetch_one(pool)
          .await?;
        Ok(user)
      }
      Database::Embedded(pool) => {
        let result = pool
          .query(
            &sql,
            &[
              json!(id),
              json!(email),
              json!(user.name),
              json!(user.password_hash),
              json!(created_at),
            ],
          )
          .await?;
        let row = result
          .rows
          .into_iter()
          .next()
          .ok_or_else(|| anyhow::anyhow!("Insert into users returned no row"))?;
        Ok(serde_json::from_value(Value::Object(row))?)
      }
    }
  }
}
