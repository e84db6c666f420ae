mod auth;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod routes;
mod services;
mod store;
mod ws;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use db::dbnotes::DbNotes;
use docs::ApiDoc;
use routes::api::create_api_routes;
use services::auth_service::JwtIdentityVerifier;
use store::{DocumentStore, IdentityVerifier};
use ws::broadcast::Broadcaster;
use ws::guard::VersionGuard;
use ws::registry::SessionRegistry;

/// Shared state handed to the gateway and the HTTP handlers. The
/// registry and broadcaster are owned here and injected; nothing in the
/// session layer reaches for globals.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub broadcaster: Arc<Broadcaster>,
    pub guard: VersionGuard,
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "notes_colab=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    config::init_config(config.clone());

    // The document store backs every session operation
    let db_url = match &config.db_url {
        Some(url) => url,
        None => {
            error!("No database URL configured - the document store is unreachable");
            std::process::exit(1);
        }
    };
    let db = match DbNotes::new(db_url).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let jwt_secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            error!("No JWT secret configured - connections cannot be authenticated");
            std::process::exit(1);
        }
    };

    // Assemble the session layer
    let store: Arc<dyn DocumentStore> = db.clone();
    let verifier: Arc<dyn IdentityVerifier> =
        Arc::new(JwtIdentityVerifier::new(jwt_secret, db.clone()));
    let registry = Arc::new(SessionRegistry::new());
    let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
    let guard = VersionGuard::new(store.clone());
    let state = Arc::new(AppState {
        registry: registry.clone(),
        broadcaster,
        guard,
        store,
        verifier,
    });

    // Janitor reclaims rooms left empty by leave/disconnect
    let sweep_period = Duration::from_secs(config.room_sweep_interval_secs);
    let _janitor = ws::janitor::spawn(registry.clone(), sweep_period);
    info!(
        "Janitor sweeping empty rooms every {}s",
        config.room_sweep_interval_secs
    );

    // CORS from configuration; permissive in development
    let cors = match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    // Combine all routes
    let app_routes = Router::new()
        // Realtime gateway
        .route("/ws", get(ws::handler::websocket_handler))
        .with_state(state.clone())
        // Liveness endpoints stay unauthenticated
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::ready_check))
        // Mount API routes
        .nest("/api", create_api_routes(state))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("Server running on http://{}", config.server_address());
    info!("WebSocket available at ws://{}/ws", config.server_address());
    info!(
        "Swagger UI available at http://{}/swagger",
        config.server_address()
    );

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
