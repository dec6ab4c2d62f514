//! Catalog objects, playable items and queue entries

use serde::{Deserialize, Serialize};

use super::kind::{classify, ItemKind};

/// Object as returned by the content-browsing service
///
/// Wire shape: `{ directory, id, title, itemClass, mimetypes, children? }`.
/// Containers carry `children`; items carry their resource mimetypes in
/// the order the catalog listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogObject {
    pub directory: String,
    pub id: String,
    pub title: String,
    pub item_class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mimetypes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CatalogObject>,
}

/// Classified, immutable description of a piece of media
///
/// `candidate_mimetypes` keeps the catalog's order; nothing in the engine
/// reorders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayableItem {
    pub directory: String,
    pub id: String,
    pub title: String,
    pub kind: ItemKind,
    pub candidate_mimetypes: Vec<String>,
}

impl PlayableItem {
    /// URL of the media resource negotiated as `mimetype`
    pub fn media_url(&self, mimetype: &str) -> String {
        format!("/directories/{}/{}?accept={}", self.directory, self.id, mimetype)
    }
}

impl From<CatalogObject> for PlayableItem {
    fn from(object: CatalogObject) -> Self {
        let kind = classify(&object.item_class);
        Self {
            directory: object.directory,
            id: object.id,
            title: object.title,
            kind,
            candidate_mimetypes: object.mimetypes,
        }
    }
}

/// Identifier attached to an item when it is placed in the queue
///
/// Unique within one queue and strictly increasing in assignment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub u64);

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PlaylistId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(PlaylistId)
    }
}

/// A playable item as placed in the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub playlist_id: PlaylistId,
    pub item: PlayableItem,
}

impl QueueEntry {
    pub fn new(playlist_id: PlaylistId, item: PlayableItem) -> Self {
        Self { playlist_id, item }
    }

    pub fn title(&self) -> &str {
        &self.item.title
    }
}
