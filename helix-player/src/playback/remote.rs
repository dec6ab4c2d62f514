//! Browser-hosted sinks
//!
//! The real `<audio>`/`<video>` elements live in the browser page. A
//! [`RemoteSink`] stands in for one of them: every transport call becomes a
//! [`SinkCommand`] on a broadcast channel (streamed to the page over SSE),
//! and the page reports element callbacks and `canPlayType` results back
//! over HTTP.

use helix_common::SinkKind;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::sink::{CanPlay, CapabilityReport, MediaSink};

/// Instruction for a browser media element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum SinkCommand {
    Load { sink: SinkKind, url: String },
    Play { sink: SinkKind },
    Pause { sink: SinkKind },
    Seek { sink: SinkKind, position: f64 },
    Show { sink: SinkKind },
    Hide { sink: SinkKind },
}

impl SinkCommand {
    /// Command name as used on the wire (SSE `event:` field)
    pub fn name(&self) -> &'static str {
        match self {
            SinkCommand::Load { .. } => "load",
            SinkCommand::Play { .. } => "play",
            SinkCommand::Pause { .. } => "pause",
            SinkCommand::Seek { .. } => "seek",
            SinkCommand::Show { .. } => "show",
            SinkCommand::Hide { .. } => "hide",
        }
    }

    pub fn sink(&self) -> SinkKind {
        match self {
            SinkCommand::Load { sink, .. }
            | SinkCommand::Play { sink }
            | SinkCommand::Pause { sink }
            | SinkCommand::Seek { sink, .. }
            | SinkCommand::Show { sink }
            | SinkCommand::Hide { sink } => *sink,
        }
    }
}

/// A browser media element driven over the sink command channel
pub struct RemoteSink {
    kind: SinkKind,
    capabilities: CapabilityReport,
    commands: broadcast::Sender<SinkCommand>,
}

impl RemoteSink {
    /// Create a sink that accepts `mimetypes` with "maybe" confidence until
    /// the browser reports its own table
    pub fn new(
        kind: SinkKind,
        mimetypes: &[String],
        commands: broadcast::Sender<SinkCommand>,
    ) -> Self {
        let capabilities = mimetypes
            .iter()
            .map(|m| (normalize(m), CanPlay::Maybe))
            .collect();

        Self {
            kind,
            capabilities,
            commands,
        }
    }

    fn publish(&self, command: SinkCommand) {
        debug!("Sink {}: {}", self.kind, command.name());
        // No connected page is not an error; the next page load resyncs
        let _ = self.commands.send(command);
    }
}

impl MediaSink for RemoteSink {
    fn can_play_type(&self, mimetype: &str) -> CanPlay {
        self.capabilities
            .get(&normalize(mimetype))
            .copied()
            .unwrap_or(CanPlay::No)
    }

    fn load(&mut self, url: &str) {
        self.publish(SinkCommand::Load {
            sink: self.kind,
            url: url.to_string(),
        });
    }

    fn play(&mut self) {
        self.publish(SinkCommand::Play { sink: self.kind });
    }

    fn pause(&mut self) {
        self.publish(SinkCommand::Pause { sink: self.kind });
    }

    fn seek(&mut self, position: f64) {
        self.publish(SinkCommand::Seek {
            sink: self.kind,
            position,
        });
    }

    fn set_visible(&mut self, visible: bool) {
        let command = if visible {
            SinkCommand::Show { sink: self.kind }
        } else {
            SinkCommand::Hide { sink: self.kind }
        };
        self.publish(command);
    }

    fn update_capabilities(&mut self, report: CapabilityReport) {
        info!(
            "Sink {}: browser reported {} mimetypes ({} playable)",
            self.kind,
            report.len(),
            report.values().filter(|c| c.is_playable()).count()
        );
        self.capabilities = report
            .into_iter()
            .map(|(mimetype, confidence)| (normalize(&mimetype), confidence))
            .collect();
    }
}

fn normalize(mimetype: &str) -> String {
    mimetype.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(kind: SinkKind, mimetypes: &[&str]) -> (RemoteSink, broadcast::Receiver<SinkCommand>) {
        let (tx, rx) = broadcast::channel(16);
        let mimetypes: Vec<String> = mimetypes.iter().map(|m| m.to_string()).collect();
        (RemoteSink::new(kind, &mimetypes, tx), rx)
    }

    #[test]
    fn test_configured_mimetypes_are_maybe() {
        let (sink, _rx) = sink(SinkKind::Audio, &["audio/mpeg", "Audio/FLAC"]);
        assert_eq!(sink.can_play_type("audio/mpeg"), CanPlay::Maybe);
        assert_eq!(sink.can_play_type("audio/flac"), CanPlay::Maybe);
        assert_eq!(sink.can_play_type("audio/ogg"), CanPlay::No);
    }

    #[test]
    fn test_browser_report_replaces_table() {
        let (mut sink, _rx) = sink(SinkKind::Audio, &["audio/mpeg"]);

        let mut report = CapabilityReport::new();
        report.insert("audio/ogg".to_string(), CanPlay::Probably);
        report.insert("audio/mpeg".to_string(), CanPlay::No);
        sink.update_capabilities(report);

        assert_eq!(sink.can_play_type("audio/ogg"), CanPlay::Probably);
        assert_eq!(sink.can_play_type("audio/mpeg"), CanPlay::No);
    }

    #[test]
    fn test_calls_become_commands() {
        let (mut sink, mut rx) = sink(SinkKind::Video, &[]);

        sink.set_visible(true);
        sink.load("/directories/d/1?accept=video/mp4");
        sink.play();
        sink.seek(30.0);

        assert_eq!(rx.try_recv().unwrap(), SinkCommand::Show { sink: SinkKind::Video });
        assert_eq!(
            rx.try_recv().unwrap(),
            SinkCommand::Load {
                sink: SinkKind::Video,
                url: "/directories/d/1?accept=video/mp4".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap().name(), "play");
        assert_eq!(
            rx.try_recv().unwrap(),
            SinkCommand::Seek {
                sink: SinkKind::Video,
                position: 30.0
            }
        );
    }

    #[test]
    fn test_command_wire_shape() {
        let value = serde_json::to_value(SinkCommand::Hide { sink: SinkKind::Audio }).unwrap();
        assert_eq!(value["command"], "hide");
        assert_eq!(value["sink"], "audio");
    }
}
