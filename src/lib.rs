use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod store;

use auth::IdentityResolver;
use store::CharterPartyStore;

/// Shared handler dependencies. Both collaborators are trait objects so
/// tests can substitute doubles for the identity provider and the store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CharterPartyStore>,
    pub identity: Arc<dyn IdentityResolver>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected voyage-scoped resources
        .merge(charter_party_routes(state))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn charter_party_routes(state: AppState) -> Router {
    use handlers::charter_parties;

    Router::new()
        .route(
            "/api/voyages/:voyage_id/charter-parties",
            get(charter_parties::list)
                .post(charter_parties::create)
                .delete(charter_parties::delete),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Laytime API",
        "version": version,
        "description": "Voyage charter party management API built with Rust (Axum)",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "charter_parties": "/api/voyages/:voyage_id/charter-parties (protected)",
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}
