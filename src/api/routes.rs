use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::{MediaBackend, MAX_IMAGES_PER_PLACE};
use crate::AppState;

/// Room for the text fields and multipart framing on top of the images.
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit =
        state.config.max_upload_size as usize * MAX_IMAGES_PER_PLACE + FORM_OVERHEAD;

    let mut router = Router::new()
        // Places
        .route("/places", get(handlers::list_places))
        .route(
            "/places",
            post(handlers::create_place).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/places/paginated", get(handlers::list_places_paginated))
        .route("/places/:id", delete(handlers::delete_place))
        .route("/places/:id", get(handlers::get_place))
        .route(
            "/places/:id",
            put(handlers::update_place).layer(DefaultBodyLimit::max(body_limit)),
        )
        // Internal
        .route("/_internal/cluster/status", get(handlers::cluster_status))
        .route("/_internal/health", get(handlers::health));

    // Locally stored images
    if state.config.media.backend == MediaBackend::Local {
        router = router.nest_service(
            "/media",
            ServeDir::new(&state.config.media.local_media_path),
        );
    }

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled, purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router
        .layer(cors_layer(&state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::PATCH,
        Method::POST,
        Method::DELETE,
    ]);

    if origin == "*" {
        return layer.allow_origin(AllowOrigin::any());
    }

    match origin.parse::<HeaderValue>() {
        // Credentials are only allowed together with an explicit origin
        Ok(value) => layer
            .allow_origin(AllowOrigin::exact(value))
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!(origin = %origin, "Invalid CORS_ORIGIN, allowing any origin");
            layer.allow_origin(AllowOrigin::any())
        }
    }
}
