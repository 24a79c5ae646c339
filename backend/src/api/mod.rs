pub mod health;
pub mod preview;

pub use health::health;
pub use preview::{exit_preview, CookieDraftMode, DraftMode, DRAFT_DISABLED_MESSAGE};

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "cmsglue API",
        version = "0.1.0",
        description = "Preview-mode and health endpoints of the content backend"
    ),
    paths(health::health, preview::exit_preview),
    components(schemas(health::HealthResponse)),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Preview", description = "Draft/preview mode"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/next/exit-preview", get(exit_preview))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
