//! Engine actor
//!
//! Runs one [`PlayerEngine`] on its own tokio task. Callers talk to it
//! through a cloneable [`EngineHandle`]; each command travels over an mpsc
//! channel with a oneshot reply, so engine state transitions never
//! interleave. After every command the task reconciles pending list
//! batches, one per tick, until the list is quiet.
//!
//! A fatal error (invariant violation) is returned to the caller that
//! triggered it, then the task stops. Later commands fail with
//! [`Error::EngineStopped`].

use std::ops::ControlFlow;

use helix_common::events::PlaybackState;
use helix_common::{PlayableItem, PlaylistId, QueueEntry, SinkKind};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::engine::{PlayerEngine, QueueSnapshot};
use super::list::{ListEdit, ListSnapshot};
use super::sink::{CapabilityReport, SinkEvent};
use crate::error::{Error, Result};

/// Command channel depth
const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    Enqueue(PlayableItem, Reply<QueueEntry>),
    Dequeue(PlaylistId, Reply<QueueEntry>),
    SelectEntry(PlaylistId, Reply<QueueEntry>),
    Advance(Reply<Option<QueueEntry>>),
    Skip(Reply<Option<QueueEntry>>),
    Back(Reply<Option<QueueEntry>>),
    Clear(Reply<Vec<QueueEntry>>),
    PlayPause(Reply<Option<PlaybackState>>),
    Seek(f64, Reply<()>),
    SinkEvent(SinkKind, SinkEvent, Reply<()>),
    Capabilities(SinkKind, CapabilityReport, Reply<()>),
    ListEdits(Vec<ListEdit>, Reply<()>),
    Snapshot(Reply<QueueSnapshot>),
    List(Reply<ListSnapshot>),
}

/// Cloneable handle to the engine task
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Move `engine` onto a new task
    pub fn spawn(engine: PlayerEngine) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(run(engine, rx));
        (Self { tx }, task)
    }

    pub async fn enqueue(&self, item: PlayableItem) -> Result<QueueEntry> {
        self.request(|reply| Command::Enqueue(item, reply)).await
    }

    pub async fn dequeue(&self, id: PlaylistId) -> Result<QueueEntry> {
        self.request(|reply| Command::Dequeue(id, reply)).await
    }

    pub async fn select_entry(&self, id: PlaylistId) -> Result<QueueEntry> {
        self.request(|reply| Command::SelectEntry(id, reply)).await
    }

    pub async fn advance(&self) -> Result<Option<QueueEntry>> {
        self.request(Command::Advance).await
    }

    pub async fn skip(&self) -> Result<Option<QueueEntry>> {
        self.request(Command::Skip).await
    }

    pub async fn back(&self) -> Result<Option<QueueEntry>> {
        self.request(Command::Back).await
    }

    pub async fn clear(&self) -> Result<Vec<QueueEntry>> {
        self.request(Command::Clear).await
    }

    pub async fn play_pause(&self) -> Result<Option<PlaybackState>> {
        self.request(Command::PlayPause).await
    }

    pub async fn seek(&self, position: f64) -> Result<()> {
        self.request(|reply| Command::Seek(position, reply)).await
    }

    pub async fn sink_event(&self, sink: SinkKind, event: SinkEvent) -> Result<()> {
        self.request(|reply| Command::SinkEvent(sink, event, reply)).await
    }

    pub async fn update_capabilities(&self, sink: SinkKind, report: CapabilityReport) -> Result<()> {
        self.request(|reply| Command::Capabilities(sink, report, reply)).await
    }

    pub async fn apply_list_edits(&self, edits: Vec<ListEdit>) -> Result<()> {
        self.request(|reply| Command::ListEdits(edits, reply)).await
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        self.request(Command::Snapshot).await
    }

    pub async fn list(&self) -> Result<ListSnapshot> {
        self.request(Command::List).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| Error::EngineStopped)?;
        rx.await.map_err(|_| Error::EngineStopped)?
    }
}

async fn run(mut engine: PlayerEngine, mut rx: mpsc::Receiver<Command>) {
    info!("Playback engine task started");

    while let Some(command) = rx.recv().await {
        if let ControlFlow::Break(reason) = dispatch(&mut engine, command) {
            error!("Playback engine stopping: {}", reason);
            return;
        }

        loop {
            match engine.reconcile_next() {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    error!("Playback engine stopping: reconciliation failed: {}", e);
                    return;
                }
            }
        }
    }

    debug!("All engine handles dropped");
    info!("Playback engine task stopped");
}

fn dispatch(engine: &mut PlayerEngine, command: Command) -> ControlFlow<String> {
    match command {
        Command::Enqueue(item, reply) => respond(reply, engine.enqueue(item)),
        Command::Dequeue(id, reply) => respond(reply, engine.dequeue(id)),
        Command::SelectEntry(id, reply) => respond(reply, engine.select_entry(id)),
        Command::Advance(reply) => respond(reply, engine.advance()),
        Command::Skip(reply) => respond(reply, engine.skip()),
        Command::Back(reply) => respond(reply, engine.back()),
        Command::Clear(reply) => respond(reply, engine.clear()),
        Command::PlayPause(reply) => respond(reply, engine.play_pause()),
        Command::Seek(position, reply) => respond(reply, engine.seek(position)),
        Command::SinkEvent(sink, event, reply) => {
            respond(reply, engine.handle_sink_event(sink, event))
        }
        Command::Capabilities(sink, report, reply) => {
            engine.update_capabilities(sink, report);
            respond(reply, Ok(()))
        }
        Command::ListEdits(edits, reply) => respond(reply, engine.apply_list_edits(edits)),
        Command::Snapshot(reply) => respond(reply, Ok(engine.snapshot())),
        Command::List(reply) => respond(reply, Ok(engine.list_snapshot())),
    }
}

/// Send `result` back; break when it is fatal
fn respond<T>(reply: Reply<T>, result: Result<T>) -> ControlFlow<String> {
    let fatal = match &result {
        Err(e) if e.is_fatal() => Some(e.to_string()),
        _ => None,
    };

    // The caller may have given up waiting
    let _ = reply.send(result);

    match fatal {
        Some(reason) => ControlFlow::Break(reason),
        None => ControlFlow::Continue(()),
    }
}
