//! Player engine
//!
//! Single-threaded coordinator for the Queue Store, Transport Adapter, list
//! representation and Reconciler. Every method runs to completion before
//! the next one starts; [`super::EngineHandle`] provides that serialization
//! when the engine is shared.
//!
//! **Responsibilities:**
//! - Implement the exposed commands (enqueue, dequeue, select, advance, ...)
//! - Start playback whenever the current pointer moves
//! - Turn sink callbacks into bus events and end-of-track advancement
//! - Mirror canonical state into the list and reconcile external edits

use chrono::Utc;
use helix_common::events::PlaybackState;
use helix_common::{EventBus, HelixEvent, PlayableItem, PlaylistId, QueueEntry, SinkKind};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::list::{ListEdit, ListModel, ListMutation, ListNode, ListSnapshot};
use super::negotiate::negotiate;
use super::queue::QueueStore;
use super::reconciler::Reconciler;
use super::sink::{CapabilityReport, MediaSink, SinkEvent};
use super::transport::{SinkOutcome, TransportAdapter, TransportSnapshot};
use crate::error::{Error, Result};

/// Queue state as reported to clients
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueEntry>,
    pub current: Option<QueueEntry>,
    /// Entries before the current one
    pub history: Vec<QueueEntry>,
    /// The current entry and everything after it
    pub upcoming: Vec<QueueEntry>,
    pub transport: TransportSnapshot,
}

pub struct PlayerEngine {
    queue: QueueStore,
    transport: TransportAdapter,
    list: ListModel,
    reconciler: Reconciler,
    events: EventBus,
}

impl PlayerEngine {
    pub fn new(audio: Box<dyn MediaSink>, video: Box<dyn MediaSink>, events: EventBus) -> Self {
        Self {
            queue: QueueStore::new(),
            transport: TransportAdapter::new(audio, video),
            list: ListModel::new(),
            reconciler: Reconciler::new(),
            events,
        }
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    #[cfg(test)]
    pub(crate) fn queue_mut(&mut self) -> &mut QueueStore {
        &mut self.queue
    }

    pub fn transport(&self) -> &TransportAdapter {
        &self.transport
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Append an item; starts playing it when nothing was current
    pub fn enqueue(&mut self, item: PlayableItem) -> Result<QueueEntry> {
        info!("Enqueue: {}/{} ({})", item.directory, item.id, item.title);
        self.settle()?;

        let entry = match self.queue.enqueue(item, &self.transport) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Enqueue rejected: {}", e);
                return Err(e);
            }
        };

        self.emit(HelixEvent::Enqueue {
            entry: entry.clone(),
            position: self.queue.len() - 1,
            timestamp: Utc::now(),
        });

        if self.queue.current_id().is_none() {
            self.step(QueueStore::advance)?;
        }

        self.sync_list();
        Ok(entry)
    }

    /// Remove an entry that is not current
    pub fn dequeue(&mut self, id: PlaylistId) -> Result<QueueEntry> {
        info!("Dequeue: {}", id);
        self.settle()?;

        let entry = self.queue.dequeue(id)?;
        self.emit(HelixEvent::TrackRemoved {
            entry: entry.clone(),
            timestamp: Utc::now(),
        });

        self.sync_list();
        Ok(entry)
    }

    /// Jump to an entry and (re)start playing it
    pub fn select_entry(&mut self, id: PlaylistId) -> Result<QueueEntry> {
        info!("Select entry: {}", id);
        self.settle()?;

        let previous = self.queue.current_id();
        let entry = self.queue.select(id)?;
        if previous != Some(id) {
            self.emit(HelixEvent::TrackChanged {
                entry: Some(entry.clone()),
                timestamp: Utc::now(),
            });
        }
        self.play_entry(&entry);

        self.sync_list();
        Ok(entry)
    }

    /// Skip forward; `None` when the pointer did not move
    pub fn advance(&mut self) -> Result<Option<QueueEntry>> {
        info!("Advance");
        self.settle()?;
        let moved = self.step(QueueStore::advance)?;
        if moved.is_some() {
            self.sync_list();
        }
        Ok(moved)
    }

    /// Advance on behalf of the UI's skip button
    pub fn skip(&mut self) -> Result<Option<QueueEntry>> {
        let moved = self.advance()?;
        self.emit(HelixEvent::Skip {
            entry: self.queue.current().cloned(),
            timestamp: Utc::now(),
        });
        Ok(moved)
    }

    /// Step back; `None` when the pointer did not move
    pub fn back(&mut self) -> Result<Option<QueueEntry>> {
        info!("Back");
        self.settle()?;
        let moved = self.step(QueueStore::back)?;
        if moved.is_some() {
            self.sync_list();
        }
        Ok(moved)
    }

    /// Remove every entry and stop playback
    pub fn clear(&mut self) -> Result<Vec<QueueEntry>> {
        self.settle()?;
        info!("Clear queue ({} entries)", self.queue.len());

        let had_current = self.queue.current_id().is_some();
        let removed = self.queue.clear();
        self.transport.stop();

        let timestamp = Utc::now();
        for entry in &removed {
            self.emit(HelixEvent::TrackRemoved {
                entry: entry.clone(),
                timestamp,
            });
        }
        if had_current {
            self.emit(HelixEvent::TrackChanged {
                entry: None,
                timestamp,
            });
        }

        self.sync_list();
        Ok(removed)
    }

    /// Toggle the active sink; `None` when nothing is current
    pub fn play_pause(&mut self) -> Result<Option<PlaybackState>> {
        self.settle()?;
        let Some(entry) = self.queue.current().cloned() else {
            debug!("Play/pause with no current entry");
            return Ok(None);
        };

        let playing = match self.transport.toggle() {
            Some(playing) => playing,
            None => {
                // Halted or idle: restart the current entry
                self.play_entry(&entry);
                self.transport.is_playing()
            }
        };

        let state = PlaybackState::from_playing(playing);
        info!("Play/pause: {} now {}", entry.playlist_id, state);
        self.emit(HelixEvent::PlayPause {
            entry: Some(entry),
            state,
            timestamp: Utc::now(),
        });
        Ok(Some(state))
    }

    /// Seek the active sink to `position` seconds
    pub fn seek(&mut self, position: f64) -> Result<()> {
        if !position.is_finite() || position < 0.0 {
            return Err(Error::BadRequest(format!("invalid seek position {}", position)));
        }

        info!("Seek: {:.3}s", position);
        self.settle()?;
        if self.transport.seek(position) {
            self.emit(HelixEvent::Seek {
                entry: self.queue.current().cloned(),
                position,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    /// Apply a lifecycle callback raised by the `from` sink
    pub fn handle_sink_event(&mut self, from: SinkKind, event: SinkEvent) -> Result<()> {
        debug!("Sink {} event: {:?}", from, event);
        self.settle()?;

        let entry = self.queue.current().cloned();
        match self.transport.handle_event(from, event) {
            SinkOutcome::Ignored | SinkOutcome::Loaded | SinkOutcome::FellBack => {}
            SinkOutcome::Duration(duration) => self.emit(HelixEvent::DurationChange {
                entry,
                duration,
                timestamp: Utc::now(),
            }),
            SinkOutcome::Time(position) => self.emit(HelixEvent::TimeUpdate {
                entry,
                position,
                timestamp: Utc::now(),
            }),
            SinkOutcome::Ended => {
                info!("Track ended: {:?}", entry.as_ref().map(|e| e.playlist_id));
                if self.step(QueueStore::advance)?.is_some() {
                    self.sync_list();
                } else {
                    self.emit(HelixEvent::Ended {
                        entry,
                        timestamp: Utc::now(),
                    });
                }
            }
            SinkOutcome::Failed(message) => {
                error!("Playback halted: {}", message);
                self.emit(HelixEvent::Error {
                    entry,
                    message,
                    timestamp: Utc::now(),
                });
            }
        }
        Ok(())
    }

    /// Adopt a browser `canPlayType` report for one sink
    pub fn update_capabilities(&mut self, sink: SinkKind, report: CapabilityReport) {
        self.transport.update_capabilities(sink, report);
    }

    /// Apply UI edits to the list representation as one external batch
    ///
    /// The batch is reconciled by [`PlayerEngine::reconcile_next`].
    pub fn apply_list_edits(&mut self, edits: Vec<ListEdit>) -> Result<()> {
        info!("List edits: {}", edits.len());
        self.settle()?;

        let mut mutations = Vec::with_capacity(edits.len());
        for edit in edits {
            match edit {
                ListEdit::Insert { index, object } => {
                    let node = self.new_node(object.into())?;
                    mutations.push(ListMutation::Insert { index, node });
                }
                ListEdit::Remove { playlist_id } => mutations.push(ListMutation::Remove(playlist_id)),
                ListEdit::Move { playlist_id, index } => {
                    mutations.push(ListMutation::Move { playlist_id, index })
                }
                ListEdit::Attribute {
                    playlist_id,
                    name,
                    value,
                } => mutations.push(ListMutation::SetAttribute {
                    playlist_id,
                    name,
                    value,
                }),
                ListEdit::Replace { objects } => {
                    mutations.push(ListMutation::Clear);
                    for object in objects {
                        let node = self.new_node(object.into())?;
                        mutations.push(ListMutation::Insert { index: None, node });
                    }
                }
            }
        }

        let generation = self.list.apply_external(mutations)?;
        debug!("List: external batch gen {} sealed", generation);
        Ok(())
    }

    /// Reconcile the oldest sealed list batch
    ///
    /// Returns `false` when no batch was waiting. An invariant violation
    /// here is fatal.
    pub fn reconcile_next(&mut self) -> Result<bool> {
        let Some(batch) = self.list.next_batch() else {
            return Ok(false);
        };
        let Some(outcome) = self.reconciler.reconcile(batch, self.queue.current_id()) else {
            return Ok(true);
        };

        self.queue.replace(outcome.entries.clone(), outcome.current)?;
        for event in outcome.events() {
            self.emit(event);
        }

        if outcome.pointer_changed() {
            match outcome.current_entry().cloned() {
                Some(entry) => self.play_entry(&entry),
                None => self.transport.stop(),
            }
        }
        // current-item is positional; any external edit may have shifted it
        self.sync_list();
        Ok(true)
    }

    /// Reconcile until no batch is waiting; returns the number handled
    pub fn flush(&mut self) -> Result<usize> {
        let mut handled = 0;
        while self.reconcile_next()? {
            handled += 1;
        }
        Ok(handled)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            entries: self.queue.entries().to_vec(),
            current: self.queue.current().cloned(),
            history: self.queue.history().to_vec(),
            upcoming: self.queue.upcoming().to_vec(),
            transport: self.transport.snapshot(),
        }
    }

    pub fn list_snapshot(&self) -> ListSnapshot {
        self.list.snapshot()
    }

    /// Reconcile batches left over from earlier commands so the list
    /// mirrors the queue and at most one engine write awaits suppression
    fn settle(&mut self) -> Result<()> {
        self.flush().map(|_| ())
    }

    /// Move the pointer with `op`, announce and play the new current entry
    fn step(
        &mut self,
        op: fn(&mut QueueStore) -> Result<Option<QueueEntry>>,
    ) -> Result<Option<QueueEntry>> {
        let moved = op(&mut self.queue)?;
        if let Some(entry) = &moved {
            self.emit(HelixEvent::TrackChanged {
                entry: Some(entry.clone()),
                timestamp: Utc::now(),
            });
            self.play_entry(entry);
        }
        Ok(moved)
    }

    fn play_entry(&mut self, entry: &QueueEntry) {
        match negotiate(&entry.item, &self.transport) {
            Some(selection) => {
                debug!(
                    "Playing {} as {} on {} sink",
                    entry.playlist_id, selection.mimetype, selection.sink
                );
                self.transport.load(&selection.url(&entry.item), selection.sink);
            }
            None => {
                warn!("No sink accepts {} any more", entry.playlist_id);
                self.transport.stop();
                self.emit(HelixEvent::Error {
                    entry: Some(entry.clone()),
                    message: "no sink accepts any candidate mimetype".to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn new_node(&mut self, item: PlayableItem) -> Result<ListNode> {
        if negotiate(&item, &self.transport).is_none() {
            return Err(Error::NotPlayable {
                directory: item.directory,
                id: item.id,
                kind: item.kind,
            });
        }
        Ok(ListNode::new(self.queue.allocate_id(), item))
    }

    /// Write canonical state into the list under a suppressed generation
    fn sync_list(&mut self) {
        let generation = self.list.begin_self_write();
        self.reconciler.suppress(generation);
        self.list
            .write_canonical_state(generation, self.queue.entries(), self.queue.current_index());
    }

    fn emit(&self, event: HelixEvent) {
        debug!("Event: {}", event.name());
        self.events.emit_lossy(event);
    }
}
