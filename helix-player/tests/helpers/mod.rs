//! Test helpers for helix-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - RecordingSink: a MediaSink that records every call it receives
//! - Fixture: an engine wired to two recording sinks and an event subscriber
//! - Item builders for audio/video catalog entries

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use helix_common::{EventBus, HelixEvent, ItemKind, PlayableItem};
use helix_player::playback::{CanPlay, MediaSink, PlayerEngine};
use tokio::sync::broadcast;

/// One call received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    Show,
    Hide,
}

/// Shared view of the calls a sink received
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<SinkCall>>>);

impl CallLog {
    fn push(&self, call: SinkCall) {
        self.0.lock().unwrap().push(call);
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn loads(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                SinkCall::Load(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &SinkCall) -> usize {
        self.0.lock().unwrap().iter().filter(|c| *c == call).count()
    }
}

/// Sink that accepts a fixed mimetype list and records calls
pub struct RecordingSink {
    accepts: Vec<String>,
    log: CallLog,
}

impl RecordingSink {
    pub fn new(accepts: &[&str]) -> (Self, CallLog) {
        let log = CallLog::default();
        let sink = Self {
            accepts: accepts.iter().map(|m| m.to_string()).collect(),
            log: log.clone(),
        };
        (sink, log)
    }
}

impl MediaSink for RecordingSink {
    fn can_play_type(&self, mimetype: &str) -> CanPlay {
        if self.accepts.iter().any(|m| m == mimetype) {
            CanPlay::Maybe
        } else {
            CanPlay::No
        }
    }

    fn load(&mut self, url: &str) {
        self.log.push(SinkCall::Load(url.to_string()));
    }

    fn play(&mut self) {
        self.log.push(SinkCall::Play);
    }

    fn pause(&mut self) {
        self.log.push(SinkCall::Pause);
    }

    fn seek(&mut self, position: f64) {
        self.log.push(SinkCall::Seek(position));
    }

    fn set_visible(&mut self, visible: bool) {
        self.log.push(if visible { SinkCall::Show } else { SinkCall::Hide });
    }
}

/// Engine wired to recording sinks
pub struct Fixture {
    pub engine: PlayerEngine,
    pub audio: CallLog,
    pub video: CallLog,
    pub events: broadcast::Receiver<HelixEvent>,
}

impl Fixture {
    /// Audio sink accepts mpeg/flac, video sink accepts mp4
    pub fn new() -> Self {
        Self::with_sinks(&["audio/mpeg", "audio/flac"], &["video/mp4"])
    }

    pub fn with_sinks(audio_accepts: &[&str], video_accepts: &[&str]) -> Self {
        let (audio, audio_log) = RecordingSink::new(audio_accepts);
        let (video, video_log) = RecordingSink::new(video_accepts);
        let bus = EventBus::new(256);
        let events = bus.subscribe();
        let engine = PlayerEngine::new(Box::new(audio), Box::new(video), bus);

        // Forget the initial visibility setup
        audio_log.take();
        video_log.take();

        Self {
            engine,
            audio: audio_log,
            video: video_log,
            events,
        }
    }

    /// Drain every event published so far
    pub fn drain_events(&mut self) -> Vec<HelixEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Names of every event published so far
    pub fn drain_names(&mut self) -> Vec<&'static str> {
        self.drain_events().iter().map(|e| e.name()).collect()
    }
}

pub fn audio_item(id: &str, mimetypes: &[&str]) -> PlayableItem {
    item(ItemKind::Audio, id, mimetypes)
}

pub fn video_item(id: &str, mimetypes: &[&str]) -> PlayableItem {
    item(ItemKind::Video, id, mimetypes)
}

pub fn item(kind: ItemKind, id: &str, mimetypes: &[&str]) -> PlayableItem {
    PlayableItem {
        directory: "uuid:media-server".to_string(),
        id: id.to_string(),
        title: format!("Item {}", id),
        kind,
        candidate_mimetypes: mimetypes.iter().map(|m| m.to_string()).collect(),
    }
}

/// URL the engine loads for `item` negotiated as `mimetype`
pub fn url_for(item: &PlayableItem, mimetype: &str) -> String {
    item.media_url(mimetype)
}
