//! HTTP shell for Syndicate
//!
//! Exposes publishing and credential management over JSON. The router is
//! built here so tests can serve it in-process; `main.rs` only parses flags
//! and binds the listener.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use libsyndicate::SyndicateService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub service: SyndicateService,
}

pub fn router(service: SyndicateService) -> Router {
    let state = Arc::new(AppState { service });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/publish/all", post(routes::publish_all))
        .route("/publish/{platform}", post(routes::publish_one))
        .route("/credentials", get(routes::list_credentials))
        .route(
            "/credentials/{platform}",
            put(routes::upsert_credential).delete(routes::delete_credential),
        )
        .route("/{platform}/{post_id}", delete(routes::unpublish))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
