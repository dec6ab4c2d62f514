//! Item classification
//!
//! Catalog objects carry a hierarchical, dot-separated class label
//! (`object.item.audioItem.musicTrack`, `object.container.storageFolder`, ...).
//! The label is parsed exactly once into [`ItemKind`]; everything downstream
//! switches on the enum and never looks at the raw string again.

use serde::{Deserialize, Serialize};

/// Closed set of catalog object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Audio,
    Video,
    Container,
    Other,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Audio => write!(f, "audio"),
            ItemKind::Video => write!(f, "video"),
            ItemKind::Container => write!(f, "container"),
            ItemKind::Other => write!(f, "other"),
        }
    }
}

/// Playback sink family an item is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Audio,
    Video,
}

impl SinkKind {
    /// Sink family for an item kind; `None` for kinds no sink plays
    pub fn for_item(kind: ItemKind) -> Option<SinkKind> {
        match kind {
            ItemKind::Audio => Some(SinkKind::Audio),
            ItemKind::Video => Some(SinkKind::Video),
            ItemKind::Container | ItemKind::Other => None,
        }
    }
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Audio => write!(f, "audio"),
            SinkKind::Video => write!(f, "video"),
        }
    }
}

/// Classify a raw class label by structural prefix.
///
/// Matching is done per dot-separated segment, so `object.item.audioItem`
/// and everything below it is audio, while `object.item.audioItemX` is not.
/// Unmatched labels map to [`ItemKind::Other`].
pub fn classify(label: &str) -> ItemKind {
    let mut segments = label.trim().split('.');

    if segments.next() != Some("object") {
        return ItemKind::Other;
    }

    match (segments.next(), segments.next()) {
        (Some("container"), _) => ItemKind::Container,
        (Some("item"), Some("audioItem")) => ItemKind::Audio,
        (Some("item"), Some("videoItem")) => ItemKind::Video,
        _ => ItemKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_audio_branch() {
        assert_eq!(classify("object.item.audioItem"), ItemKind::Audio);
        assert_eq!(classify("object.item.audioItem.musicTrack"), ItemKind::Audio);
        assert_eq!(classify("object.item.audioItem.audioBroadcast"), ItemKind::Audio);
    }

    #[test]
    fn test_classify_video_branch() {
        assert_eq!(classify("object.item.videoItem"), ItemKind::Video);
        assert_eq!(classify("object.item.videoItem.movie"), ItemKind::Video);
    }

    #[test]
    fn test_classify_container_branch() {
        assert_eq!(classify("object.container"), ItemKind::Container);
        assert_eq!(classify("object.container.storageFolder"), ItemKind::Container);
        assert_eq!(classify("object.container.album.musicAlbum"), ItemKind::Container);
    }

    #[test]
    fn test_classify_unmatched_is_other() {
        assert_eq!(classify(""), ItemKind::Other);
        assert_eq!(classify("object"), ItemKind::Other);
        assert_eq!(classify("object.item"), ItemKind::Other);
        assert_eq!(classify("object.item.imageItem.photo"), ItemKind::Other);
        assert_eq!(classify("item.audioItem"), ItemKind::Other);
    }

    #[test]
    fn test_classify_matches_whole_segments_only() {
        assert_eq!(classify("object.item.audioItemish"), ItemKind::Other);
        assert_eq!(classify("object.containers"), ItemKind::Other);
    }

    #[test]
    fn test_sink_family_follows_kind() {
        assert_eq!(SinkKind::for_item(ItemKind::Audio), Some(SinkKind::Audio));
        assert_eq!(SinkKind::for_item(ItemKind::Video), Some(SinkKind::Video));
        assert_eq!(SinkKind::for_item(ItemKind::Container), None);
        assert_eq!(SinkKind::for_item(ItemKind::Other), None);
    }
}
