//! HTTP server setup and routing
//!
//! Sets up the Axum router with routes for control endpoints and SSE.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use helix_common::EventBus;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::playback::{EngineHandle, SinkCommand};

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: EngineHandle,
    /// Engine events, streamed on `/events`
    pub events: EventBus,
    /// Browser sink commands, streamed on `/sinks/commands`
    pub sink_commands: broadcast::Sender<SinkCommand>,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))

        // Queue
        .route("/queue", get(handlers::get_queue).post(handlers::enqueue))
        .route("/queue/clear", post(handlers::clear_queue))
        .route("/queue/:playlist_id", delete(handlers::dequeue))
        .route("/queue/:playlist_id/select", post(handlers::select_entry))

        // Playback control
        .route("/playback/advance", post(handlers::advance))
        .route("/playback/skip", post(handlers::skip))
        .route("/playback/back", post(handlers::back))
        .route("/playback/playpause", post(handlers::play_pause))
        .route("/playback/seek", post(handlers::seek))

        // List representation
        .route("/list", get(handlers::get_list))
        .route("/list/edits", post(handlers::apply_list_edits))

        // Browser sinks
        .route("/sinks/commands", get(handlers::sink_command_stream))
        .route("/sinks/:sink/events", post(handlers::sink_event))
        .route("/sinks/:sink/capabilities", put(handlers::sink_capabilities))

        // SSE event stream
        .route("/events", get(handlers::event_stream))

        // Attach application context
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
