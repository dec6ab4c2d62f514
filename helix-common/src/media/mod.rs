//! Media model shared by every helix surface

mod item;
mod kind;

pub use item::{CatalogObject, PlayableItem, PlaylistId, QueueEntry};
pub use kind::{classify, ItemKind, SinkKind};
