//! Event types for the helix event system
//!
//! Provides the event vocabulary the player publishes to its UI and the
//! EventBus that carries it.

mod playback_types;

pub use playback_types::PlaybackState;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::media::QueueEntry;

/// Helix player events
///
/// Every event carries the queue entry it concerns, or `None` when no entry
/// is involved. Serialized names match what the browser UI listens for
/// (`trackchanged`, `timeupdate`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HelixEvent {
    /// Entry appended to the queue
    Enqueue {
        entry: QueueEntry,
        /// Position in queue (0-based)
        position: usize,
        timestamp: DateTime<Utc>,
    },

    /// Current entry pointer moved to a different entry (or to none)
    TrackChanged {
        entry: Option<QueueEntry>,
        timestamp: DateTime<Utc>,
    },

    /// Current entry stayed the same but its list node changed
    CurrentTrackUpdated {
        entry: QueueEntry,
        timestamp: DateTime<Utc>,
    },

    /// Entry left the queue
    TrackRemoved {
        entry: QueueEntry,
        timestamp: DateTime<Utc>,
    },

    /// Active sink learned the media duration (seconds)
    DurationChange {
        entry: Option<QueueEntry>,
        duration: f64,
        timestamp: DateTime<Utc>,
    },

    /// Active sink playback position moved (seconds)
    TimeUpdate {
        entry: Option<QueueEntry>,
        position: f64,
        timestamp: DateTime<Utc>,
    },

    /// Last entry in the queue finished playing
    Ended {
        entry: Option<QueueEntry>,
        timestamp: DateTime<Utc>,
    },

    /// Playback of the entry failed and was halted
    Error {
        entry: Option<QueueEntry>,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Play/pause toggled
    PlayPause {
        entry: Option<QueueEntry>,
        state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// User skipped forward; carries the entry now current
    Skip {
        entry: Option<QueueEntry>,
        timestamp: DateTime<Utc>,
    },

    /// User sought within the current entry (seconds)
    Seek {
        entry: Option<QueueEntry>,
        position: f64,
        timestamp: DateTime<Utc>,
    },
}

impl HelixEvent {
    /// Event name as used on the wire (SSE `event:` field)
    pub fn name(&self) -> &'static str {
        match self {
            HelixEvent::Enqueue { .. } => "enqueue",
            HelixEvent::TrackChanged { .. } => "trackchanged",
            HelixEvent::CurrentTrackUpdated { .. } => "currenttrackupdated",
            HelixEvent::TrackRemoved { .. } => "trackremoved",
            HelixEvent::DurationChange { .. } => "durationchange",
            HelixEvent::TimeUpdate { .. } => "timeupdate",
            HelixEvent::Ended { .. } => "ended",
            HelixEvent::Error { .. } => "error",
            HelixEvent::PlayPause { .. } => "playpause",
            HelixEvent::Skip { .. } => "skip",
            HelixEvent::Seek { .. } => "seek",
        }
    }

    /// The queue entry this event concerns, if any
    pub fn entry(&self) -> Option<&QueueEntry> {
        match self {
            HelixEvent::Enqueue { entry, .. }
            | HelixEvent::CurrentTrackUpdated { entry, .. }
            | HelixEvent::TrackRemoved { entry, .. } => Some(entry),
            HelixEvent::TrackChanged { entry, .. }
            | HelixEvent::DurationChange { entry, .. }
            | HelixEvent::TimeUpdate { entry, .. }
            | HelixEvent::Ended { entry, .. }
            | HelixEvent::Error { entry, .. }
            | HelixEvent::PlayPause { entry, .. }
            | HelixEvent::Skip { entry, .. }
            | HelixEvent::Seek { entry, .. } => entry.as_ref(),
        }
    }
}

/// Event distribution bus for helix events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the engine)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use helix_common::events::{EventBus, HelixEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(HelixEvent::TrackChanged {
///     entry: None,
///     timestamp: chrono::Utc::now(),
/// });
///
/// let received = rx.try_recv().unwrap();
/// assert_eq!(received.name(), "trackchanged");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HelixEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<HelixEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: HelixEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ItemKind, PlayableItem, PlaylistId};

    fn entry(id: u64) -> QueueEntry {
        QueueEntry::new(
            PlaylistId(id),
            PlayableItem {
                directory: "dir".to_string(),
                id: format!("obj-{}", id),
                title: format!("Track {}", id),
                kind: ItemKind::Audio,
                candidate_mimetypes: vec!["audio/mpeg".to_string()],
            },
        )
    }

    #[test]
    fn test_emit_lossy_without_subscribers() {
        let bus = EventBus::new(10);
        bus.emit_lossy(HelixEvent::Ended {
            entry: None,
            timestamp: Utc::now(),
        });

        // Only events after subscribing arrive
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_lossy_reaches_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit_lossy(HelixEvent::TrackRemoved {
            entry: entry(3),
            timestamp: Utc::now(),
        });

        let received = rx.try_recv().unwrap();
        assert_eq!(received.name(), "trackremoved");
        assert_eq!(received.entry().map(|e| e.playlist_id), Some(PlaylistId(3)));
    }

    #[test]
    fn test_events_keep_emission_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit_lossy(HelixEvent::TrackChanged {
            entry: Some(entry(1)),
            timestamp: Utc::now(),
        });
        bus.emit_lossy(HelixEvent::TimeUpdate {
            entry: Some(entry(1)),
            position: 1.5,
            timestamp: Utc::now(),
        });

        assert_eq!(rx.try_recv().unwrap().name(), "trackchanged");
        assert_eq!(rx.try_recv().unwrap().name(), "timeupdate");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_serializes_with_wire_name() {
        let event = HelixEvent::PlayPause {
            entry: Some(entry(2)),
            state: PlaybackState::Paused,
            timestamp: Utc::now(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "playpause");
        assert_eq!(value["state"], "paused");
        assert_eq!(value["entry"]["playlistId"], 2);

        let event = HelixEvent::CurrentTrackUpdated {
            entry: entry(2),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "currenttrackupdated");
    }
}
