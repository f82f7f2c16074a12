//! HTTP front end for the grouping service
//!
//! Thin glue: handlers decode requests, call the [`Ingestor`] or the
//! graph, and write the reply. No grouping logic lives here.

mod handlers;

use crate::graph::ItemGraph;
use crate::grouping::{Ingestor, KeyDeriver};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::{HealthResponse, MAX_BODY_BYTES};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    /// Create state over a fresh, empty graph
    pub fn new(deriver: KeyDeriver) -> Self {
        let graph = Arc::new(ItemGraph::new());
        Self {
            ingestor: Arc::new(Ingestor::with_deriver(graph, deriver)),
        }
    }

    /// The graph behind the ingestor
    pub fn graph(&self) -> &Arc<ItemGraph> {
        self.ingestor.graph()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/AddSong", post(handlers::add_song))
        .route("/GetSongGroups", get(handlers::song_groups_text))
        .route("/api/groups", get(handlers::song_groups_json))
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the process is stopped
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}
