//! Playback sink abstraction
//!
//! A sink is an opaque playback surface: the engine asks it what it can
//! play, tells it what to load, and receives its lifecycle callbacks as
//! [`SinkEvent`]s. Decoding happens on the other side of this trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Confidence a sink reports for a mimetype (browser `canPlayType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanPlay {
    #[serde(rename = "")]
    No,
    Maybe,
    Probably,
}

impl CanPlay {
    /// Anything but an outright "no" counts as playable
    pub fn is_playable(self) -> bool {
        self != CanPlay::No
    }
}

/// Mimetype -> confidence report, as sent by a browser element
pub type CapabilityReport = HashMap<String, CanPlay>;

/// Lifecycle callbacks raised by a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkEvent {
    Loaded,
    DurationChange { duration: f64 },
    TimeUpdate { position: f64 },
    Ended,
    Error { message: String },
}

/// Opaque playback surface driven by the transport adapter
pub trait MediaSink: Send {
    fn can_play_type(&self, mimetype: &str) -> CanPlay;

    /// Assign a new source; playback does not start until [`MediaSink::play`]
    fn load(&mut self, url: &str);

    fn play(&mut self);

    fn pause(&mut self);

    /// Jump to `position` seconds
    fn seek(&mut self, position: f64);

    fn set_visible(&mut self, visible: bool);

    /// Replace the sink's capability table. Sinks with fixed capabilities
    /// ignore reports.
    fn update_capabilities(&mut self, _report: CapabilityReport) {}
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-crate recording sink for unit tests

    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Load(String),
        Play,
        Pause,
        Seek(f64),
        Visible(bool),
    }

    pub struct FakeSink {
        accepts: Vec<String>,
        pub calls: Arc<Mutex<Vec<Call>>>,
    }

    impl FakeSink {
        pub fn new(accepts: &[&str]) -> (Self, Arc<Mutex<Vec<Call>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let sink = Self {
                accepts: accepts.iter().map(|m| m.to_string()).collect(),
                calls: Arc::clone(&calls),
            };
            (sink, calls)
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl MediaSink for FakeSink {
        fn can_play_type(&self, mimetype: &str) -> CanPlay {
            if self.accepts.iter().any(|m| m == mimetype) {
                CanPlay::Probably
            } else {
                CanPlay::No
            }
        }

        fn load(&mut self, url: &str) {
            self.record(Call::Load(url.to_string()));
        }

        fn play(&mut self) {
            self.record(Call::Play);
        }

        fn pause(&mut self) {
            self.record(Call::Pause);
        }

        fn seek(&mut self, position: f64) {
            self.record(Call::Seek(position));
        }

        fn set_visible(&mut self, visible: bool) {
            self.record(Call::Visible(visible));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_play_wire_values() {
        let report: CapabilityReport =
            serde_json::from_str(r#"{"audio/flac": "probably", "audio/ogg": "maybe", "audio/x-ape": ""}"#)
                .unwrap();

        assert_eq!(report["audio/flac"], CanPlay::Probably);
        assert_eq!(report["audio/ogg"], CanPlay::Maybe);
        assert_eq!(report["audio/x-ape"], CanPlay::No);
        assert!(!report["audio/x-ape"].is_playable());
        assert!(report["audio/ogg"].is_playable());
    }

    #[test]
    fn test_sink_event_wire_shape() {
        let event: SinkEvent = serde_json::from_str(r#"{"type": "timeupdate", "position": 12.5}"#).unwrap();
        assert_eq!(event, SinkEvent::TimeUpdate { position: 12.5 });

        let event: SinkEvent = serde_json::from_str(r#"{"type": "ended"}"#).unwrap();
        assert_eq!(event, SinkEvent::Ended);

        let event: SinkEvent =
            serde_json::from_str(r#"{"type": "error", "message": "MEDIA_ERR_SRC_NOT_SUPPORTED"}"#).unwrap();
        assert!(matches!(event, SinkEvent::Error { .. }));
    }
}
