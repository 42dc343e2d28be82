mod catalog;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::db::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub catalog: Arc<CatalogClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinelist=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cinelist...");

    // Load configuration
    let config = Config::load()?;
    let config = Arc::new(config);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Initialize catalog client
    let catalog = Arc::new(CatalogClient::new(&config.tmdb)?);

    let state = AppState {
        db,
        config: config.clone(),
        catalog,
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // Shared lists are readable by anyone holding the token
        .route(
            "/favorites/share/:token",
            get(handlers::favorite::get_shared_list),
        )
        // Anonymous callers get isFavorite=false, not a 401
        .route(
            "/favorites/check/:movie_id",
            get(handlers::favorite::check_favorite),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // User profile
        .route(
            "/user/profile",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route("/user", delete(handlers::user::delete_account))
        // Favorites
        .route(
            "/favorites",
            get(handlers::favorite::list_favorites).post(handlers::favorite::add_favorite),
        )
        .route(
            "/favorites/:movie_id",
            delete(handlers::favorite::remove_favorite),
        )
        .route(
            "/favorites/share-token",
            post(handlers::favorite::rotate_share_token),
        )
        // Catalog browsing
        .route("/movies/search", get(handlers::movie::search_movies))
        .route("/movies/popular", get(handlers::movie::popular_movies))
        .route("/movies/:id", get(handlers::movie::movie_details))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine all routes under /api/v1
    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
