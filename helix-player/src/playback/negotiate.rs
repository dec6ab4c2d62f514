//! Sink Selector
//!
//! Picks, per play attempt, the mimetype and sink family for an item.
//! The sink family comes from the item kind; within it the item's
//! candidate mimetypes are scanned in catalog order and the first one the
//! sink does not reject wins. "probably" is not preferred over "maybe".

use helix_common::{PlayableItem, SinkKind};
use serde::Serialize;

use super::sink::CanPlay;

/// Anything that can answer "can this sink family play this mimetype?"
pub trait SinkCapabilities {
    fn can_play(&self, sink: SinkKind, mimetype: &str) -> CanPlay;
}

/// Negotiated `(mimetype, sink)` pair for one play attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub mimetype: String,
    pub sink: SinkKind,
}

impl Selection {
    /// Media resource URL for `item` under this selection
    pub fn url(&self, item: &PlayableItem) -> String {
        item.media_url(&self.mimetype)
    }
}

/// Negotiate a selection for `item`, or `None` when nothing is playable
pub fn negotiate(item: &PlayableItem, capabilities: &impl SinkCapabilities) -> Option<Selection> {
    let sink = SinkKind::for_item(item.kind)?;

    item.candidate_mimetypes
        .iter()
        .find(|mimetype| capabilities.can_play(sink, mimetype).is_playable())
        .map(|mimetype| Selection {
            mimetype: mimetype.clone(),
            sink,
        })
}
