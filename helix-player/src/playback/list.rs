//! Externally mutable list representation
//!
//! The browser UI renders the queue as a list of nodes and may edit that
//! list directly (drag-reorder, delete, replace everything) without going
//! through the engine's commands. [`ListModel`] records those mutations the
//! way a DOM mutation observer would and hands them out as sealed
//! [`ChangeBatch`]es, strictly in the order they were sealed.
//!
//! The engine also writes its canonical state back into the list. Those
//! writes are sealed as their own batch under a generation reserved with
//! [`ListModel::begin_self_write`], so the reconciler can recognize and skip
//! them.

use std::collections::{BTreeMap, VecDeque};

use helix_common::{CatalogObject, PlayableItem, PlaylistId, QueueEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// One row of the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNode {
    pub playlist_id: PlaylistId,
    pub item: PlayableItem,
    pub attributes: BTreeMap<String, String>,
}

impl ListNode {
    pub fn new(playlist_id: PlaylistId, item: PlayableItem) -> Self {
        Self {
            playlist_id,
            item,
            attributes: BTreeMap::new(),
        }
    }

    pub fn to_entry(&self) -> QueueEntry {
        QueueEntry::new(self.playlist_id, self.item.clone())
    }
}

/// Edit a UI applies directly to the list, as received over HTTP
///
/// `insert` and `replace` carry catalog objects; the engine classifies
/// them and gives each new node a playlist id.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ListEdit {
    Insert {
        #[serde(default)]
        index: Option<usize>,
        object: CatalogObject,
    },
    Remove {
        playlist_id: PlaylistId,
    },
    Move {
        playlist_id: PlaylistId,
        index: usize,
    },
    Attribute {
        playlist_id: PlaylistId,
        name: String,
        #[serde(default)]
        value: Option<String>,
    },
    Replace {
        objects: Vec<CatalogObject>,
    },
}

/// Primitive mutation applied to the list
#[derive(Debug, Clone)]
pub enum ListMutation {
    /// Insert at `index`, or append when `None`
    Insert { index: Option<usize>, node: ListNode },
    Remove(PlaylistId),
    /// Move a node so it ends up at `index`
    Move { playlist_id: PlaylistId, index: usize },
    /// Set an attribute, or remove it when `value` is `None`
    SetAttribute {
        playlist_id: PlaylistId,
        name: String,
        value: Option<String>,
    },
    /// Remove every node
    Clear,
}

/// Net changes between two seals, in emission order
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeBatch {
    pub generation: u64,
    /// Node order when the batch opened
    pub before: Vec<PlaylistId>,
    /// Nodes when the batch was sealed
    pub after: Vec<ListNode>,
    /// Nodes present before and gone after, in removal order
    pub removed: Vec<ListNode>,
    /// Nodes absent before and present after, in insertion order
    pub added: Vec<PlaylistId>,
    /// Surviving nodes whose attributes were written
    pub attributes_changed: Vec<PlaylistId>,
}

/// List contents as shown to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    pub nodes: Vec<ListNode>,
    /// 1-based index of the current node, 0 when none
    pub current_item: usize,
}

#[derive(Debug, Default)]
struct PendingBatch {
    before: Vec<PlaylistId>,
    removed: Vec<ListNode>,
    added: Vec<PlaylistId>,
    touched: Vec<PlaylistId>,
}

#[derive(Debug, Default)]
pub struct ListModel {
    nodes: Vec<ListNode>,
    current_item: usize,
    sealed: VecDeque<ChangeBatch>,
    next_generation: u64,
}

impl ListModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            nodes: self.nodes.clone(),
            current_item: self.current_item,
        }
    }

    /// Apply a UI edit and seal it as one external batch
    ///
    /// All-or-nothing: if any mutation is invalid, nothing is applied and
    /// nothing is recorded. Returns the batch generation.
    pub fn apply_external(&mut self, mutations: Vec<ListMutation>) -> Result<u64> {
        let mut nodes = self.nodes.clone();
        let mut pending = PendingBatch {
            before: self.ids(),
            ..PendingBatch::default()
        };

        for mutation in mutations {
            apply(&mut nodes, &mut pending, mutation)?;
        }
        self.nodes = nodes;

        let generation = self.reserve_generation();
        self.sealed.push_back(self.net_batch(generation, pending));
        Ok(generation)
    }

    /// Reserve the generation the next canonical write will carry
    pub fn begin_self_write(&mut self) -> u64 {
        self.reserve_generation()
    }

    /// Overwrite the list with the canonical queue state
    ///
    /// Nodes already in the list keep their attributes. Always seals one
    /// batch under `generation`, even when nothing changed.
    pub fn write_canonical_state(
        &mut self,
        generation: u64,
        entries: &[QueueEntry],
        current: Option<usize>,
    ) {
        let pending = PendingBatch {
            before: self.ids(),
            removed: self
                .nodes
                .iter()
                .filter(|n| !entries.iter().any(|e| e.playlist_id == n.playlist_id))
                .cloned()
                .collect(),
            added: entries
                .iter()
                .map(|e| e.playlist_id)
                .filter(|id| !self.nodes.iter().any(|n| n.playlist_id == *id))
                .collect(),
            touched: Vec::new(),
        };

        let mut previous = std::mem::take(&mut self.nodes);
        self.nodes = entries
            .iter()
            .map(|entry| {
                match previous.iter().position(|n| n.playlist_id == entry.playlist_id) {
                    Some(index) => previous.swap_remove(index),
                    None => ListNode::new(entry.playlist_id, entry.item.clone()),
                }
            })
            .collect();
        self.current_item = current.map(|index| index + 1).unwrap_or(0);

        debug!(
            "List: canonical write gen {} ({} nodes, current-item {})",
            generation,
            self.nodes.len(),
            self.current_item
        );
        self.sealed.push_back(self.net_batch(generation, pending));
    }

    /// Oldest sealed batch
    pub fn next_batch(&mut self) -> Option<ChangeBatch> {
        self.sealed.pop_front()
    }

    fn ids(&self) -> Vec<PlaylistId> {
        self.nodes.iter().map(|n| n.playlist_id).collect()
    }

    fn reserve_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn net_batch(&self, generation: u64, pending: PendingBatch) -> ChangeBatch {
        let present = |id: &PlaylistId| self.nodes.iter().any(|n| n.playlist_id == *id);
        let existed = |id: &PlaylistId| pending.before.contains(id);

        let mut removed: Vec<ListNode> = Vec::new();
        for node in &pending.removed {
            let id = &node.playlist_id;
            if existed(id) && !present(id) && !removed.iter().any(|n| n.playlist_id == *id) {
                removed.push(node.clone());
            }
        }

        let mut added: Vec<PlaylistId> = Vec::new();
        for id in &pending.added {
            if !existed(id) && present(id) && !added.contains(id) {
                added.push(*id);
            }
        }

        let mut attributes_changed: Vec<PlaylistId> = Vec::new();
        for id in &pending.touched {
            if present(id) && !attributes_changed.contains(id) {
                attributes_changed.push(*id);
            }
        }

        ChangeBatch {
            generation,
            before: pending.before,
            after: self.nodes.clone(),
            removed,
            added,
            attributes_changed,
        }
    }
}

fn apply(nodes: &mut Vec<ListNode>, pending: &mut PendingBatch, mutation: ListMutation) -> Result<()> {
    match mutation {
        ListMutation::Insert { index, node } => {
            if nodes.iter().any(|n| n.playlist_id == node.playlist_id) {
                return Err(Error::BadRequest(format!(
                    "node {} is already in the list",
                    node.playlist_id
                )));
            }
            let index = index.unwrap_or(nodes.len());
            if index > nodes.len() {
                return Err(Error::BadRequest(format!(
                    "insert index {} out of range (list has {} nodes)",
                    index,
                    nodes.len()
                )));
            }
            pending.added.push(node.playlist_id);
            nodes.insert(index, node);
        }
        ListMutation::Remove(id) => {
            let node = take(nodes, id)?;
            pending.removed.push(node);
        }
        ListMutation::Move { playlist_id, index } => {
            let node = take(nodes, playlist_id)?;
            if index > nodes.len() {
                return Err(Error::BadRequest(format!(
                    "move index {} out of range (list has {} nodes)",
                    index,
                    nodes.len() + 1
                )));
            }
            pending.removed.push(node.clone());
            pending.added.push(playlist_id);
            nodes.insert(index, node);
        }
        ListMutation::SetAttribute {
            playlist_id,
            name,
            value,
        } => {
            let node = nodes
                .iter_mut()
                .find(|n| n.playlist_id == playlist_id)
                .ok_or(Error::NotFound(playlist_id))?;
            match value {
                Some(value) => {
                    node.attributes.insert(name, value);
                }
                None => {
                    node.attributes.remove(&name);
                }
            }
            pending.touched.push(playlist_id);
        }
        ListMutation::Clear => {
            pending.removed.append(nodes);
        }
    }
    Ok(())
}

fn take(nodes: &mut Vec<ListNode>, id: PlaylistId) -> Result<ListNode> {
    let index = nodes
        .iter()
        .position(|n| n.playlist_id == id)
        .ok_or(Error::NotFound(id))?;
    Ok(nodes.remove(index))
}
