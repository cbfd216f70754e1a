use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use laytime_api::auth::JwtIdentityResolver;
use laytime_api::store::PgCharterPartyStore;
use laytime_api::{app, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = laytime_api::config::config();
    tracing::info!("Starting Laytime API in {:?} mode", config.environment);

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| panic!("DATABASE_URL must be set"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.database.connection_timeout))
        .connect(&database_url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));

    let state = AppState {
        store: Arc::new(PgCharterPartyStore::new(pool)),
        identity: Arc::new(JwtIdentityResolver::new(config.security.jwt_secret.clone())),
    };

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Laytime API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
