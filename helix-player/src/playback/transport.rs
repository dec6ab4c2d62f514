//! Transport Adapter
//!
//! Owns the audio-capable and video-capable sinks and drives whichever one
//! is active. Only one sink is visible at a time; switching always hides
//! the old sink before showing the new one.
//!
//! **Fallback:** some catalog entries are video-typed but carry audio-only
//! payloads. When the video sink fails to load a source, the same source is
//! retried once on the audio sink. A second failure is terminal for the
//! session.

use helix_common::SinkKind;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::negotiate::SinkCapabilities;
use super::sink::{CanPlay, CapabilityReport, MediaSink, SinkEvent};

/// Transport state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Error,
}

/// The source currently assigned to the active sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSession {
    pub active_sink: SinkKind,
    pub source_url: String,
    pub playing: bool,
}

/// Transport state as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportSnapshot {
    pub state: TransportState,
    pub session: Option<PlaybackSession>,
}

/// What a sink callback means for the engine
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOutcome {
    /// Callback from a sink that is not active, or after a terminal error
    Ignored,
    Loaded,
    Duration(f64),
    Time(f64),
    Ended,
    /// Video load failed and the source was handed to the audio sink
    FellBack,
    /// Load or playback failed with no fallback left
    Failed(String),
}

pub struct TransportAdapter {
    audio: Box<dyn MediaSink>,
    video: Box<dyn MediaSink>,
    visible: SinkKind,
    state: TransportState,
    session: Option<PlaybackSession>,
    fell_back: bool,
}

impl TransportAdapter {
    /// Take ownership of both sinks; the audio sink starts visible
    pub fn new(mut audio: Box<dyn MediaSink>, mut video: Box<dyn MediaSink>) -> Self {
        video.set_visible(false);
        audio.set_visible(true);

        Self {
            audio,
            video,
            visible: SinkKind::Audio,
            state: TransportState::Idle,
            session: None,
            fell_back: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.playing)
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            state: self.state,
            session: self.session.clone(),
        }
    }

    /// Assign `url` to the `sink` family and start playing it
    ///
    /// Reassigning the source the active sink already holds resumes it
    /// instead of reloading.
    pub fn load(&mut self, url: &str, sink: SinkKind) {
        let same_source = self.session.as_ref().is_some_and(|s| {
            s.active_sink == sink && s.source_url == url
        });
        if same_source && self.state != TransportState::Error {
            debug!("Transport: {} already loaded, resuming", url);
            self.play();
            return;
        }

        self.pause_active();
        self.show(sink);
        self.fell_back = false;

        info!("Transport: loading {} on {} sink", url, sink);
        let active = self.sink_mut(sink);
        active.load(url);
        active.play();

        self.session = Some(PlaybackSession {
            active_sink: sink,
            source_url: url.to_string(),
            playing: true,
        });
        self.state = TransportState::Loading;
    }

    /// Resume the active sink; `false` when there is nothing to resume
    pub fn play(&mut self) -> bool {
        let Some(sink) = self.controllable_sink() else {
            return false;
        };

        self.sink_mut(sink).play();
        self.set_playing(true);
        if self.state != TransportState::Loading {
            self.state = TransportState::Playing;
        }
        true
    }

    /// Pause the active sink; `false` when there is nothing to pause
    pub fn pause(&mut self) -> bool {
        let Some(sink) = self.controllable_sink() else {
            return false;
        };

        self.sink_mut(sink).pause();
        self.set_playing(false);
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
        }
        true
    }

    /// Toggle play/pause; returns the new playing flag
    pub fn toggle(&mut self) -> Option<bool> {
        self.controllable_sink()?;

        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
        Some(self.is_playing())
    }

    /// Seek the active sink to `position` seconds
    pub fn seek(&mut self, position: f64) -> bool {
        let Some(sink) = self.controllable_sink() else {
            return false;
        };

        self.sink_mut(sink).seek(position);
        true
    }

    /// Drop the session and return to Idle
    pub fn stop(&mut self) {
        if self.session.is_some() {
            debug!("Transport: stopping");
        }
        self.pause_active();
        self.session = None;
        self.fell_back = false;
        self.state = TransportState::Idle;
    }

    pub fn update_capabilities(&mut self, sink: SinkKind, report: CapabilityReport) {
        self.sink_mut(sink).update_capabilities(report);
    }

    /// Apply a lifecycle callback raised by the `from` sink
    pub fn handle_event(&mut self, from: SinkKind, event: SinkEvent) -> SinkOutcome {
        let Some(session) = &self.session else {
            debug!("Transport: {} sink event with no session, ignored", from);
            return SinkOutcome::Ignored;
        };
        if session.active_sink != from || self.state == TransportState::Error {
            debug!("Transport: stale {} sink event ignored", from);
            return SinkOutcome::Ignored;
        }

        match event {
            SinkEvent::Loaded => {
                self.state = if self.is_playing() {
                    TransportState::Playing
                } else {
                    TransportState::Paused
                };
                SinkOutcome::Loaded
            }
            SinkEvent::DurationChange { duration } => SinkOutcome::Duration(duration),
            SinkEvent::TimeUpdate { position } => {
                if self.state == TransportState::Loading && self.is_playing() {
                    self.state = TransportState::Playing;
                }
                SinkOutcome::Time(position)
            }
            SinkEvent::Ended => {
                self.set_playing(false);
                self.state = TransportState::Ended;
                SinkOutcome::Ended
            }
            SinkEvent::Error { message } => {
                // Only a video load failure is retried on the audio sink
                if from == SinkKind::Video
                    && self.state == TransportState::Loading
                    && !self.fell_back
                {
                    self.fall_back_to_audio(&message);
                    SinkOutcome::FellBack
                } else {
                    warn!("Transport: {} sink failed: {}", from, message);
                    self.set_playing(false);
                    self.state = TransportState::Error;
                    SinkOutcome::Failed(message)
                }
            }
        }
    }

    fn fall_back_to_audio(&mut self, message: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        warn!(
            "Transport: video sink failed ({}), retrying {} on audio sink",
            message, session.source_url
        );

        session.active_sink = SinkKind::Audio;
        session.playing = true;
        let url = session.source_url.clone();

        self.fell_back = true;
        self.video.pause();
        self.show(SinkKind::Audio);
        self.audio.load(&url);
        self.audio.play();
        self.state = TransportState::Loading;
    }

    fn controllable_sink(&self) -> Option<SinkKind> {
        match self.state {
            TransportState::Idle | TransportState::Error => None,
            _ => self.session.as_ref().map(|s| s.active_sink),
        }
    }

    fn pause_active(&mut self) {
        if let Some(sink) = self.session.as_ref().map(|s| s.active_sink) {
            self.sink_mut(sink).pause();
            self.set_playing(false);
        }
    }

    fn show(&mut self, sink: SinkKind) {
        if self.visible != sink {
            self.sink_mut(self.visible).set_visible(false);
            self.sink_mut(sink).set_visible(true);
            self.visible = sink;
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if let Some(session) = self.session.as_mut() {
            session.playing = playing;
        }
    }

    fn sink(&self, kind: SinkKind) -> &dyn MediaSink {
        match kind {
            SinkKind::Audio => &*self.audio,
            SinkKind::Video => &*self.video,
        }
    }

    fn sink_mut(&mut self, kind: SinkKind) -> &mut Box<dyn MediaSink> {
        match kind {
            SinkKind::Audio => &mut self.audio,
            SinkKind::Video => &mut self.video,
        }
    }
}

impl SinkCapabilities for TransportAdapter {
    fn can_play(&self, sink: SinkKind, mimetype: &str) -> CanPlay {
        self.sink(sink).can_play_type(mimetype)
    }
}
