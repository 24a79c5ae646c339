use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
  pub id: String,
  pub email: String,
  pub name: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at: String, // RFC 3339
}

/// A user about to be inserted. The password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
  pub email: String,
  pub name: String,
  pub password_hash: String,
}

impl NewUser {
  pub fn with_password(email: &str, name: &str, password: &str, cost: u32) -> anyhow::Result<Self> {
    let password_hash = bcrypt::hash(password, cost)
      .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(Self {
      email: email.to_string(),
      name: name.to_string(),
      password_hash,
    })
  }
}
