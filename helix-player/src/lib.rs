//! # Helix Player Library (helix-player)
//!
//! Playback queue and reconciliation engine for the helix browser media
//! front end.
//!
//! **Purpose:** Keep the play queue and current entry, negotiate which
//! browser media element plays each entry, drive that element, and keep the
//! UI's directly editable queue list in step with canonical state.
//!
//! **Architecture:** A single-threaded `PlayerEngine` owned by one tokio
//! task (`EngineHandle`), an axum HTTP/SSE control surface, and remote
//! sinks that forward transport commands to the browser over SSE.

pub mod api;
pub mod config;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{EngineHandle, PlayerEngine};
