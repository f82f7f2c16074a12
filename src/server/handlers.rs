//! Request handlers

use super::AppState;
use crate::graph::{GraphError, Song};
use crate::report::{GroupCollector, SongGroup, TextReport};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Largest request body accepted by `/AddSong` (1 MiB)
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed song: {0}")]
    MalformedSong(serde_json::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MalformedSong(_) => {
                warn!("rejected request: {}", self);
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            ApiError::Graph(_) => {
                error!("graph operation failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// POST /AddSong
///
/// Body: `{"title": "...", "artists": ["..."]}`
pub async fn add_song(State(state): State<AppState>, body: Bytes) -> Result<String, ApiError> {
    let song: Song = serde_json::from_slice(&body).map_err(ApiError::MalformedSong)?;
    let reply = format!("Got song: {} by {}", song.title, song.artist_line());

    state.ingestor.ingest(song)?;
    Ok(reply)
}

/// GET /GetSongGroups
///
/// Plain-text report of every group.
pub async fn song_groups_text(State(state): State<AppState>) -> Result<Response, ApiError> {
    let mut report = TextReport::new(String::new());
    state.graph().grouping_traversal(&mut report)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report.into_inner(),
    )
        .into_response())
}

/// GET /api/groups
pub async fn song_groups_json(
    State(state): State<AppState>,
) -> Result<Json<Vec<SongGroup>>, ApiError> {
    let mut collector = GroupCollector::new();
    state.graph().grouping_traversal(&mut collector)?;
    Ok(Json(collector.into_groups()))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub songs: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "songgraph".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        songs: state.graph().node_count(),
    })
}
