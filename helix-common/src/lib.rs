//! # Helix Common Library
//!
//! Shared code for the helix media front end:
//! - Media model (catalog objects, item classification, queue entries)
//! - Event types (HelixEvent enum) and the EventBus
//! - Configuration file discovery
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod media;
pub mod sse;

pub use error::{Error, Result};
pub use events::{EventBus, HelixEvent};
pub use media::{classify, CatalogObject, ItemKind, PlayableItem, PlaylistId, QueueEntry, SinkKind};
