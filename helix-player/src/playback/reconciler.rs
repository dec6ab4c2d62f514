//! Reconciler
//!
//! Folds external list edits back into canonical queue state, one
//! [`ChangeBatch`] at a time:
//!
//! 1. If the current node was removed, the candidate is the first surviving
//!    node that followed it; failing that, the first node added in the same
//!    batch; failing that, nothing.
//! 2. If nothing was current and the list is non-empty, the candidate is
//!    the first node.
//! 3. A candidate with a different identity is a `trackchanged`; the same
//!    node with written attributes is a `currenttrackupdated`.
//! 4. Every removed node is a `trackremoved`, in removal order.
//!
//! Batches the engine produced itself are skipped through a one-shot
//! suppression slot holding the generation of the engine's own write.

use chrono::Utc;
use helix_common::{HelixEvent, PlaylistId, QueueEntry};
use tracing::debug;

use super::list::ChangeBatch;

/// Canonical state derived from one external batch
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub generation: u64,
    /// Queue contents in list order
    pub entries: Vec<QueueEntry>,
    pub previous: Option<PlaylistId>,
    pub current: Option<PlaylistId>,
    /// Same current node, attributes rewritten
    pub current_updated: bool,
    pub removed: Vec<QueueEntry>,
}

impl Reconciliation {
    pub fn pointer_changed(&self) -> bool {
        self.previous != self.current
    }

    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.current
            .and_then(|id| self.entries.iter().find(|e| e.playlist_id == id))
    }

    /// Events this pass publishes, in order
    pub fn events(&self) -> Vec<HelixEvent> {
        let timestamp = Utc::now();
        let mut events = Vec::with_capacity(self.removed.len() + 1);

        if self.pointer_changed() {
            events.push(HelixEvent::TrackChanged {
                entry: self.current_entry().cloned(),
                timestamp,
            });
        } else if self.current_updated {
            if let Some(entry) = self.current_entry() {
                events.push(HelixEvent::CurrentTrackUpdated {
                    entry: entry.clone(),
                    timestamp,
                });
            }
        }

        events.extend(self.removed.iter().map(|entry| HelixEvent::TrackRemoved {
            entry: entry.clone(),
            timestamp,
        }));

        events
    }
}

#[derive(Debug, Default)]
pub struct Reconciler {
    suppressed: Option<u64>,
    processed: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the batch sealed under `generation` (one shot)
    pub fn suppress(&mut self, generation: u64) {
        self.suppressed = Some(generation);
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressed.is_some()
    }

    /// Number of batches reconciled (suppressed batches excluded)
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Reconcile `batch` against the current pointer
    ///
    /// Returns `None` when the batch was self-originated and suppressed.
    pub fn reconcile(
        &mut self,
        batch: ChangeBatch,
        current: Option<PlaylistId>,
    ) -> Option<Reconciliation> {
        if self.suppressed == Some(batch.generation) {
            self.suppressed = None;
            debug!("Reconciler: skipped own write (gen {})", batch.generation);
            return None;
        }
        self.processed += 1;

        let mut candidate = current;
        if let Some(id) = current {
            if batch.removed.iter().any(|n| n.playlist_id == id) {
                candidate = following_survivor(&batch, id).or_else(|| batch.added.first().copied());
            }
        } else if batch.before.is_empty() {
            // Nothing current and the list was empty: start at its first node
            candidate = batch.after.first().map(|n| n.playlist_id);
        }

        let current_updated = candidate == current
            && current.is_some_and(|id| batch.attributes_changed.contains(&id));

        debug!(
            "Reconciler: gen {} removed {} added {} current {:?} -> {:?}",
            batch.generation,
            batch.removed.len(),
            batch.added.len(),
            current,
            candidate
        );

        Some(Reconciliation {
            generation: batch.generation,
            entries: batch.after.iter().map(|n| n.to_entry()).collect(),
            previous: current,
            current: candidate,
            current_updated,
            removed: batch.removed.iter().map(|n| n.to_entry()).collect(),
        })
    }
}

/// First node after `id` in the pre-batch order that is still in the list
fn following_survivor(batch: &ChangeBatch, id: PlaylistId) -> Option<PlaylistId> {
    let position = batch.before.iter().position(|b| *b == id)?;
    batch.before[position + 1..]
        .iter()
        .find(|b| batch.after.iter().any(|n| n.playlist_id == **b))
        .copied()
}
