mod config;
mod dto;
mod handlers;
mod models;
mod repository;
mod service;

use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{any, get},
};

use std::sync::Arc;

use handlers::rest;
use repository::Repository;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use service::NoteService;

#[tokio::main]
async fn main() {
    // Log setup
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notes_api=debug,tower_http=debug,info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to locate or load config: {e}");
    });
    tracing::info!("Using database at {}", cfg.database_path);

    // Repository creation and migration
    let mut repo = Repository::new(&cfg.database_path).unwrap_or_else(|e| {
        tracing::error!("Failed to open database: {e}");
        panic!("failed to open database: {e}");
    });

    repo.migrate().unwrap_or_else(|e| {
        tracing::error!("Failed to migrate database: {e}");
        panic!("failed to migrate database: {e}");
    });

    let repo_ptr = Arc::new(tokio::sync::Mutex::new(repo));

    // Service creation
    let service = Arc::new(NoteService::new(repo_ptr));

    let router = app(service);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to {}: {e}", cfg.bind_addr);
            panic!("failed to bind to {}: {e}", cfg.bind_addr);
        });

    match listener.local_addr() {
        Ok(addr) => tracing::info!("REST server starting, listening on {}", addr),
        Err(e) => tracing::warn!("REST server starting, local address unknown: {e}"),
    }

    tokio::select! {
        result = axum::serve(listener, router) => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {e}");
                panic!("failed to run HTTP server: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, closing database");
        }
    }
}

fn app(service: Arc<NoteService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/notes", any(collection_redirect))
        .route(
            "/api/notes/",
            get(rest::get_all_notes).post(rest::create_note),
        )
        .route(
            "/api/notes/{id}",
            get(rest::get_one_note)
                .patch(rest::update_note)
                .delete(rest::delete_note),
        )
        .route("/api-doc/openapi.json", get(rest::openapi))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Response {
    (StatusCode::OK, Html("<h1> Notes REST API </h1>")).into_response()
}

async fn collection_redirect() -> Redirect {
    Redirect::permanent("/api/notes/")
}
