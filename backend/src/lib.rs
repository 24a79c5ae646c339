// Library entry point for the server binary, the CLI and tests
pub mod api;
pub mod config;
pub mod db;
pub mod outcome;
pub mod seed;
pub mod server;

use std::sync::Arc;

pub use config::Settings;
pub use db::Database;

pub struct AppState {
  pub db: Database,
  pub draft_mode: Arc<dyn api::DraftMode>,
}
