//! Axum router configuration with middleware.
//!
//! REST routes live under `/api/v1/`; `/health` and `/ws/events` sit at the
//! root. Middleware: CORS, request tracing.
//!
//! When `PARLEY_WEB_DIR` points at a built single-page app, unknown paths
//! fall through to its `index.html`. If the directory does not exist, only
//! the API is served.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::send_message))
        .route("/conversations", get(handlers::conversation::list_conversations))
        .route("/conversations/{id}", get(handlers::conversation::get_conversation))
        .route("/messages/{id}/edit", put(handlers::message::edit_message))
        .route("/messages/{id}/regenerate", post(handlers::message::regenerate))
        .route("/messages/{id}/versions", get(handlers::message::get_versions))
        .route("/health", get(health_check));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .route("/ws/events", get(handlers::ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Ok(web_dir) = std::env::var("PARLEY_WEB_DIR") {
        if std::path::Path::new(&web_dir).exists() {
            let index_path = format!("{web_dir}/index.html");
            let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
            router = router.fallback_service(serve_dir);
            tracing::info!(path = %web_dir, "SPA static file serving enabled");
        } else {
            tracing::warn!(path = %web_dir, "PARLEY_WEB_DIR does not exist; serving API only");
        }
    }

    router
}

/// GET /health - no auth required.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
