//! Server-Sent Events (SSE) utilities
//!
//! Turns a broadcast subscription into an axum SSE response. Shared by every
//! helix stream: player events and sink commands.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::events::{EventBus, HelixEvent};

/// Keep-alive interval for all helix SSE streams
const KEEP_ALIVE_SECS: u64 = 15;

/// Stream every value received on `rx` as an SSE event
///
/// `name` gives the SSE `event:` field; the data is the JSON serialization.
/// Lagged receivers skip the dropped values and keep streaming; the stream
/// ends when the sender side is closed.
pub fn broadcast_sse<T, F>(
    stream_name: &'static str,
    mut rx: broadcast::Receiver<T>,
    name: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + Clone + Send + 'static,
    F: Fn(&T) -> &'static str + Send + 'static,
{
    info!("New SSE client connected to {}", stream_name);

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(value) => match Event::default().event(name(&value)).json_data(&value) {
                    Ok(event) => {
                        debug!("SSE {}: sending {}", stream_name, name(&value));
                        yield Ok(event);
                    }
                    Err(e) => warn!("SSE {}: failed to serialize event: {}", stream_name, e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE {}: client lagged, {} events dropped", stream_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE {}: source closed", stream_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

/// SSE stream of every [`HelixEvent`] published on `bus`
pub fn event_bus_sse(bus: &EventBus) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    broadcast_sse("events", bus.subscribe(), HelixEvent::name)
}
