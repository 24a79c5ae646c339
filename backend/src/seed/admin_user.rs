use anyhow::Context;
use async_trait::async_trait;

use super::{SeedAction, SeedStep};
use crate::config::AdminCredentials;
use crate::db::{NewUser, UserStore};
use crate::outcome::Outcome;

/// Creates the default administrator if no user has its email.
///
/// An existing record is left untouched even when the configured name or
/// password differ from what is stored.
pub struct AdminUserSeed {
    credentials: AdminCredentials,
    hash_cost: u32,
}

impl AdminUserSeed {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self {
            credentials,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost used for the password hash.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    async fn seed_admin(&self, store: &dyn UserStore) -> anyhow::Result<SeedAction> {
        let AdminCredentials {
            email,
            password,
            name,
        } = &self.credentials;

        let existing = store
            .find_user_by_email(email)
            .await
            .context("Failed to look up admin user")?;

        if existing.is_some() {
            tracing::info!(email = %email, "Admin user already exists, skipping creation");
            return Ok(SeedAction::Skipped(email.clone()));
        }

        let new_user = NewUser::with_password(email, name, password, self.hash_cost)?;
        store
            .create_user(&new_user)
            .await
            .context("Failed to create admin user")?;

        tracing::info!(email = %email, "Default admin user created successfully");
        Ok(SeedAction::Created(email.clone()))
    }
}

#[async_trait]
impl SeedStep for AdminUserSeed {
    fn name(&self) -> &'static str {
        "admin-user"
    }

    async fn run(&self, store: &dyn UserStore) -> Outcome<SeedAction> {
        Outcome::tolerate(self.seed_admin(store).await)
    }
}
