use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use crate::outcome::Outcome;
use crate::AppState;

pub const DRAFT_DISABLED_MESSAGE: &str = "Draft mode is disabled";

/// Request-scoped draft (preview) mode.
pub trait DraftMode: Send + Sync {
  /// Return `jar` with draft mode turned off.
  fn disable(&self, jar: CookieJar) -> anyhow::Result<CookieJar>;
}

/// Draft mode carried by a bypass cookie.
#[derive(Debug, Clone)]
pub struct CookieDraftMode {
  cookie_name: String,
}

impl CookieDraftMode {
  pub fn new(cookie_name: impl Into<String>) -> Self {
    Self {
      cookie_name: cookie_name.into(),
    }
  }

  pub fn cookie_name(&self) -> &str {
    &self.cookie_name
  }
}

impl DraftMode for CookieDraftMode {
  fn disable(&self, jar: CookieJar) -> anyhow::Result<CookieJar> {
    if !is_cookie_token(&self.cookie_name) {
      anyhow::bail!("Invalid draft cookie name {:?}", self.cookie_name);
    }

    let mut cookie = Cookie::from(self.cookie_name.clone());
    cookie.set_path("/");
    Ok(jar.remove(cookie))
  }
}

// RFC 6265 cookie-name token
fn is_cookie_token(name: &str) -> bool {
  !name.is_empty()
    && name
      .chars()
      .all(|c| c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c))
}

/// Turn off draft mode. Always answers 200 with the same body.
#[utoipa::path(
  get,
  path = "/next/exit-preview",
  tag = "Preview",
  responses(
    (status = 200, description = "Draft mode disabled", body = String, content_type = "text/plain")
  )
)]
pub async fn exit_preview(
  State(state): State<Arc<AppState>>,
  jar: CookieJar,
) -> (CookieJar, &'static str) {
  match Outcome::tolerate(state.draft_mode.disable(jar.clone())) {
    Outcome::Success(jar) => (jar, DRAFT_DISABLED_MESSAGE),
    failed => {
      if let Some(e) = failed.error() {
        tracing::error!(error = %e, "Error disabling draft mode");
      }
      (jar, DRAFT_DISABLED_MESSAGE)
    }
  }
}
