//! Library Catalog Server
//!
//! REST API server for the library catalog.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_catalog::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    validation::SystemClock,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("library_catalog={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Library Catalog v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    // Create repository and services
    let repository = Repository::new(pool);
    let (services, job_receiver) = Services::new(
        repository,
        Arc::new(SystemClock),
        config.auth.clone(),
        config.email.clone(),
        &config.jobs,
    );
    services
        .users
        .ensure_admin()
        .await
        .context("Failed to create bootstrap staff account")?;
    services
        .job_worker(job_receiver, config.jobs.notify_email.clone())
        .spawn();

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Genres
        .route(
            "/genres",
            get(api::genres::list_genres).post(api::genres::create_genre),
        )
        .route(
            "/genres/:id",
            get(api::genres::get_genre)
                .put(api::genres::update_genre)
                .patch(api::genres::patch_genre)
                .delete(api::genres::delete_genre),
        )
        // Languages
        .route(
            "/languages",
            get(api::languages::list_languages).post(api::languages::create_language),
        )
        .route(
            "/languages/:id",
            get(api::languages::get_language)
                .put(api::languages::update_language)
                .patch(api::languages::patch_language)
                .delete(api::languages::delete_language),
        )
        // Authors
        .route(
            "/authors",
            get(api::authors::list_authors).post(api::authors::create_author),
        )
        .route(
            "/authors/:id",
            get(api::authors::get_author)
                .put(api::authors::update_author)
                .patch(api::authors::patch_author)
                .delete(api::authors::delete_author),
        )
        // Books
        .route(
            "/books",
            get(api::books::list_books).post(api::books::create_book),
        )
        .route(
            "/books/:id",
            get(api::books::get_book)
                .put(api::books::update_book)
                .patch(api::books::patch_book)
                .delete(api::books::delete_book),
        )
        // Book instances
        .route(
            "/book-instances",
            get(api::book_instances::list_book_instances)
                .post(api::book_instances::create_book_instance),
        )
        .route(
            "/book-instances/:id",
            get(api::book_instances::get_book_instance)
                .put(api::book_instances::update_book_instance)
                .patch(api::book_instances::patch_book_instance)
                .delete(api::book_instances::delete_book_instance),
        )
        // Users
        .route(
            "/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route(
            "/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        .route(
            "/groups",
            get(api::users::list_groups).post(api::users::create_group),
        )
        .route(
            "/groups/:id",
            get(api::users::get_group).delete(api::users::delete_group),
        )
        .route("/profiles", get(api::users::list_profiles))
        .route(
            "/profiles/:id",
            get(api::users::get_profile).put(api::users::update_profile),
        )
        // Jobs
        .route("/jobs", post(api::jobs::submit_job))
        .route("/jobs/:id", get(api::jobs::get_job))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
