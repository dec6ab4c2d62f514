//! HTTP request handlers
//!
//! Implements REST API endpoints for queue and playback control. Every
//! command goes through the [`crate::playback::EngineHandle`].

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use helix_common::events::PlaybackState;
use helix_common::sse::{broadcast_sse, event_bus_sse};
use helix_common::{CatalogObject, PlayableItem, PlaylistId, QueueEntry, SinkKind};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::server::AppContext;
use crate::error::Error;
use crate::playback::{CapabilityReport, ListEdit, ListSnapshot, QueueSnapshot, SinkCommand, SinkEvent};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    /// Entry the pointer moved to; `None` when it did not move
    moved_to: Option<QueueEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    removed: usize,
}

#[derive(Debug, Serialize)]
pub struct PlayPauseResponse {
    state: Option<PlaybackState>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// Seconds from the start of the current entry
    position: f64,
}

type ApiError = (StatusCode, Json<StatusResponse>);

/// Map an engine error to its HTTP status and log it
fn api_error(e: Error) -> ApiError {
    let status = match &e {
        Error::NotPlayable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::InvalidOperation(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }

    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "helix-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Queue Endpoints
// ============================================================================

/// GET /queue - Queue contents, current entry, history and upcoming
pub async fn get_queue(State(ctx): State<AppContext>) -> Result<Json<QueueSnapshot>, ApiError> {
    ctx.engine.snapshot().await.map(Json).map_err(api_error)
}

/// POST /queue - Classify a catalog object and append it
pub async fn enqueue(
    State(ctx): State<AppContext>,
    Json(object): Json<CatalogObject>,
) -> Result<(StatusCode, Json<QueueEntry>), ApiError> {
    info!("Enqueue request: {} ({})", object.id, object.item_class);

    let item = PlayableItem::from(object);
    match ctx.engine.enqueue(item).await {
        Ok(entry) => {
            info!("Enqueued as {}", entry.playlist_id);
            Ok((StatusCode::CREATED, Json(entry)))
        }
        Err(e) => Err(api_error(e)),
    }
}

/// DELETE /queue/:playlist_id - Remove an entry that is not current
pub async fn dequeue(
    State(ctx): State<AppContext>,
    Path(playlist_id): Path<PlaylistId>,
) -> Result<Json<QueueEntry>, ApiError> {
    info!("Dequeue request: {}", playlist_id);
    ctx.engine.dequeue(playlist_id).await.map(Json).map_err(api_error)
}

/// POST /queue/:playlist_id/select - Jump to an entry and play it
pub async fn select_entry(
    State(ctx): State<AppContext>,
    Path(playlist_id): Path<PlaylistId>,
) -> Result<Json<QueueEntry>, ApiError> {
    info!("Select request: {}", playlist_id);
    ctx.engine
        .select_entry(playlist_id)
        .await
        .map(Json)
        .map_err(api_error)
}

/// POST /queue/clear - Remove every entry
pub async fn clear_queue(State(ctx): State<AppContext>) -> Result<Json<ClearResponse>, ApiError> {
    info!("Clear queue request");
    let removed = ctx.engine.clear().await.map_err(api_error)?;
    Ok(Json(ClearResponse {
        removed: removed.len(),
    }))
}

// ============================================================================
// Playback Control Endpoints
// ============================================================================

/// POST /playback/advance
pub async fn advance(State(ctx): State<AppContext>) -> Result<Json<CurrentResponse>, ApiError> {
    info!("Advance request");
    let moved_to = ctx.engine.advance().await.map_err(api_error)?;
    Ok(Json(CurrentResponse { moved_to }))
}

/// POST /playback/skip
pub async fn skip(State(ctx): State<AppContext>) -> Result<Json<CurrentResponse>, ApiError> {
    info!("Skip request");
    let moved_to = ctx.engine.skip().await.map_err(api_error)?;
    Ok(Json(CurrentResponse { moved_to }))
}

/// POST /playback/back
pub async fn back(State(ctx): State<AppContext>) -> Result<Json<CurrentResponse>, ApiError> {
    info!("Back request");
    let moved_to = ctx.engine.back().await.map_err(api_error)?;
    Ok(Json(CurrentResponse { moved_to }))
}

/// POST /playback/playpause
pub async fn play_pause(State(ctx): State<AppContext>) -> Result<Json<PlayPauseResponse>, ApiError> {
    info!("Play/pause request");
    let state = ctx.engine.play_pause().await.map_err(api_error)?;
    Ok(Json(PlayPauseResponse { state }))
}

/// POST /playback/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> Result<StatusCode, ApiError> {
    info!("Seek request: {}", req.position);
    ctx.engine.seek(req.position).await.map_err(api_error)?;
    Ok(StatusCode::OK)
}

// ============================================================================
// List Endpoints
// ============================================================================

/// GET /list - The list representation as the UI sees it
pub async fn get_list(State(ctx): State<AppContext>) -> Result<Json<ListSnapshot>, ApiError> {
    ctx.engine.list().await.map(Json).map_err(api_error)
}

/// POST /list/edits - Apply direct edits as one external batch
///
/// Responds with the list after reconciliation.
pub async fn apply_list_edits(
    State(ctx): State<AppContext>,
    Json(edits): Json<Vec<ListEdit>>,
) -> Result<Json<ListSnapshot>, ApiError> {
    info!("List edit request: {} edits", edits.len());
    ctx.engine.apply_list_edits(edits).await.map_err(api_error)?;
    ctx.engine.list().await.map(Json).map_err(api_error)
}

// ============================================================================
// Browser Sink Endpoints
// ============================================================================

/// POST /sinks/:sink/events - Media element callback
pub async fn sink_event(
    State(ctx): State<AppContext>,
    Path(sink): Path<SinkKind>,
    Json(event): Json<SinkEvent>,
) -> Result<StatusCode, ApiError> {
    ctx.engine.sink_event(sink, event).await.map_err(api_error)?;
    Ok(StatusCode::OK)
}

/// PUT /sinks/:sink/capabilities - `canPlayType` results for one element
pub async fn sink_capabilities(
    State(ctx): State<AppContext>,
    Path(sink): Path<SinkKind>,
    Json(report): Json<CapabilityReport>,
) -> Result<StatusCode, ApiError> {
    info!("Capability report for {} sink: {} mimetypes", sink, report.len());
    ctx.engine
        .update_capabilities(sink, report)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::OK)
}

/// GET /sinks/commands - SSE stream of commands for the browser elements
pub async fn sink_command_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    broadcast_sse("sink-commands", ctx.sink_commands.subscribe(), SinkCommand::name)
}

// ============================================================================
// Event Stream
// ============================================================================

/// GET /events - SSE stream of player events
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    event_bus_sse(&ctx.events)
}
