//! REST API implementation for helix-player
//!
//! Exposes the engine's commands as JSON endpoints and its events (and the
//! browser sink commands) as SSE streams.

pub mod handlers;
pub mod server;

pub use server::{create_router, AppContext};
