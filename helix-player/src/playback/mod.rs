//! Playback Queue & Reconciliation Engine
//!
//! Layered leaves-first:
//! - `sink` / `remote`: playback surfaces and the browser-backed implementation
//! - `negotiate`: per-item mimetype and sink selection
//! - `queue`: ordered entries and the current pointer
//! - `transport`: the one active sink, with video to audio fallback
//! - `list` / `reconciler`: the externally editable list and its reconciliation
//! - `engine`: the single-threaded coordinator
//! - `handle`: the actor that serializes access to the engine

pub mod engine;
pub mod handle;
pub mod list;
pub mod negotiate;
pub mod queue;
pub mod reconciler;
pub mod remote;
pub mod sink;
pub mod transport;

pub use engine::{PlayerEngine, QueueSnapshot};
pub use handle::EngineHandle;
pub use list::{ListEdit, ListSnapshot};
pub use remote::{RemoteSink, SinkCommand};
pub use sink::{CanPlay, CapabilityReport, MediaSink, SinkEvent};
pub use transport::{TransportState, TransportSnapshot};
