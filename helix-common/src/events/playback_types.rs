//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Whether the active sink is producing output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn from_playing(playing: bool) -> Self {
        if playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}
