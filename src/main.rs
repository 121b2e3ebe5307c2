//! WebCraft Studio Backend
//!
//! REST backend for the template editor: file-backed working data and version
//! history, server-side content injection, the live-preview bridge, media and
//! shared presets, with change notifications over server-sent events.

mod api;
mod config;
mod errors;
mod events;
mod models;
mod preview;
mod render;
mod store;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use events::EventHub;
use preview::PreviewHub;
use store::{ContentStore, MediaStore, PresetStore, VersionManager};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub versions: Arc<VersionManager>,
    pub content: Arc<ContentStore>,
    pub presets: Arc<PresetStore>,
    pub media: Arc<MediaStore>,
    pub events: Arc<EventHub>,
    pub preview: Arc<PreviewHub>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let events = Arc::new(EventHub::new());
        Self {
            versions: Arc::new(VersionManager::new(&config.data_dir, &config.templates_dir)),
            content: Arc::new(ContentStore::new(&config.data_dir)),
            presets: Arc::new(PresetStore::new(&config.data_dir)),
            media: Arc::new(MediaStore::new(&config.data_dir)),
            preview: Arc::new(PreviewHub::new(config.preview_debounce, events.clone())),
            events,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WebCraft Studio Backend");
    tracing::info!("Data directory: {:?}", config.data_dir);
    tracing::info!("Templates directory: {:?}", config.templates_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    tokio::fs::create_dir_all(&config.data_dir).await?;
    if !tokio::fs::try_exists(&config.templates_dir).await? {
        tracing::warn!(
            "Templates directory {:?} does not exist, rendering will return 404",
            config.templates_dir
        );
    }

    let bind_addr = config.bind_addr;
    let app = create_router(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

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
        // Working data
        .route(
            "/templates/{id}/working",
            get(api::get_working)
                .post(api::apply_edits)
                .put(api::save_working)
                .delete(api::reset_working),
        )
        .route("/templates/{id}/original", get(api::get_original))
        .route(
            "/templates/{id}/dirty",
            get(api::get_dirty).post(api::mark_dirty),
        )
        // Versions
        .route(
            "/templates/{id}/versions",
            get(api::list_versions).post(api::create_version),
        )
        .route("/templates/{id}/versions/restore", post(api::restore_version))
        .route("/templates/{id}/versions/compare", get(api::compare_versions))
        .route(
            "/templates/{id}/versions/{version_id}",
            axum::routing::delete(api::delete_version),
        )
        // Content
        .route(
            "/templates/{id}/content",
            get(api::get_content)
                .put(api::write_content)
                .patch(api::update_content),
        )
        .route("/templates/{id}/content/batch", patch(api::update_content_batch))
        .route(
            "/templates/{id}/content/snapshots",
            get(api::list_content_snapshots),
        )
        // Design
        .route(
            "/templates/{id}/documents/{kind}",
            get(api::get_document).put(api::save_document),
        )
        .route(
            "/templates/{id}/design",
            get(api::get_design).put(api::save_design),
        )
        .route("/templates/{id}/design/history", get(api::get_design_history))
        // Rendering and preview
        .route("/templates/{id}/render", get(api::render_template))
        .route("/templates/{id}/preview/init", get(api::preview_init))
        .route("/templates/{id}/preview/update", post(api::preview_update))
        .route("/templates/{id}/preview/select", post(api::preview_select))
        .route("/templates/{id}/preview/state", get(api::preview_state))
        // Media
        .route("/templates/{id}/media", post(api::upload_media))
        .route("/templates/{id}/media/{*path}", get(api::get_media))
        // Presets and fonts
        .route(
            "/presets/colors",
            get(api::list_presets).post(api::create_preset),
        )
        .route(
            "/presets/colors/{id}",
            get(api::get_preset)
                .put(api::update_preset)
                .delete(api::delete_preset),
        )
        .route("/fonts", get(api::list_fonts).post(api::create_font))
        .route(
            "/fonts/{id}",
            axum::routing::put(api::update_font).delete(api::delete_font),
        )
        // Change notifications
        .route("/events", get(api::stream_events));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
