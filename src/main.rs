//! Notes Backend
//!
//! A REST backend for notes and tags persisted as JSON key-value slots, with optional
//! one-sentence summaries from a remote provider.

mod api;
mod config;
mod errors;
mod models;
mod storage;
mod store;
mod summary;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use storage::{FileStorage, MemoryStorage, Storage};
use store::{NoteStore, NotificationKind};
use summary::Summarizer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<NoteStore>>,
    pub summarizer: Arc<Summarizer>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Notes Backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.summary_api_key.is_none() {
        tracing::warn!("No summarization key configured (NOTES_SUMMARY_API_KEY). Summaries are disabled!");
    }

    // Open storage and load collections
    let storage: Arc<dyn Storage> = if config.ephemeral {
        tracing::warn!("Ephemeral mode (NOTES_EPHEMERAL): notes are kept in memory only");
        Arc::new(MemoryStorage::new())
    } else {
        let storage = FileStorage::open(&config.data_dir)?;
        tracing::info!("Data directory: {:?}", storage.dir());
        Arc::new(storage)
    };
    let store = NoteStore::open(storage);
    tracing::info!(
        "Loaded {} notes and {} tags",
        store.notes().len(),
        store.tags().len()
    );

    spawn_notification_logger(&store);

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        summarizer: Arc::new(Summarizer::from_config(&config)?),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Notes
        .route("/notes", get(api::list_notes).post(api::create_note))
        .route(
            "/notes/{id}",
            get(api::get_note)
                .put(api::update_note)
                .delete(api::delete_note),
        )
        .route("/notes/{id}/summary", post(api::summarize_note))
        // Tags
        .route("/tags", get(api::list_tags).post(api::create_tag))
        .route("/tags/{id}", put(api::update_tag).delete(api::delete_tag));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Log store notifications until the store is dropped.
fn spawn_notification_logger(store: &NoteStore) {
    let mut notifications = store.subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;

        loop {
            match notifications.recv().await {
                Ok(n) if n.kind == NotificationKind::Success => tracing::info!("{}", n.message),
                Ok(n) => tracing::warn!("{}", n.message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Notification logger skipped {} messages", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
