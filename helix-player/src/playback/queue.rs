//! Queue Store
//!
//! Owns the ordered queue entries and the current-entry pointer. Pure
//! in-memory state: operations report what changed and the engine decides
//! what to play.
//!
//! Invariants held by every operation:
//! - playlist ids are unique and strictly increasing in assignment order
//! - `current`, when set, names an entry present in `entries`

use helix_common::{PlayableItem, PlaylistId, QueueEntry};
use tracing::debug;

use super::negotiate::{negotiate, SinkCapabilities};
use crate::error::{Error, Result};

/// Playlist id source scoped to one queue
#[derive(Debug)]
pub struct PlaylistIdGenerator {
    next: u64,
}

impl PlaylistIdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> PlaylistId {
        let id = PlaylistId(self.next);
        self.next += 1;
        id
    }
}

impl Default for PlaylistIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered play queue with a current-entry pointer
#[derive(Debug, Default)]
pub struct QueueStore {
    entries: Vec<QueueEntry>,
    current: Option<PlaylistId>,
    ids: PlaylistIdGenerator,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: PlaylistId) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.playlist_id == id)
    }

    pub fn current_id(&self) -> Option<PlaylistId> {
        self.current
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.and_then(|id| self.get(id))
    }

    /// 0-based position of the current entry
    pub fn current_index(&self) -> Option<usize> {
        self.current
            .and_then(|id| self.entries.iter().position(|e| e.playlist_id == id))
    }

    /// Entries before the current one
    pub fn history(&self) -> &[QueueEntry] {
        match self.current_index() {
            Some(index) => &self.entries[..index],
            None => &[],
        }
    }

    /// The current entry and everything after it
    pub fn upcoming(&self) -> &[QueueEntry] {
        match self.current_index() {
            Some(index) => &self.entries[index..],
            None => &self.entries,
        }
    }

    /// Reserve a playlist id for an entry created outside [`QueueStore::enqueue`]
    pub fn allocate_id(&mut self) -> PlaylistId {
        self.ids.next_id()
    }

    /// Append `item` if some sink of its family can play it
    ///
    /// Does not move the pointer; the caller advances when nothing was current.
    pub fn enqueue(
        &mut self,
        item: PlayableItem,
        capabilities: &impl SinkCapabilities,
    ) -> Result<QueueEntry> {
        if negotiate(&item, capabilities).is_none() {
            return Err(Error::NotPlayable {
                directory: item.directory,
                id: item.id,
                kind: item.kind,
            });
        }

        let entry = QueueEntry::new(self.ids.next_id(), item);
        debug!("Queue: appended {} ({})", entry.playlist_id, entry.title());
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Remove an entry that is not current
    pub fn dequeue(&mut self, id: PlaylistId) -> Result<QueueEntry> {
        if self.current == Some(id) {
            return Err(Error::InvalidOperation(format!(
                "cannot dequeue {}: it is the current entry",
                id
            )));
        }

        let index = self
            .entries
            .iter()
            .position(|e| e.playlist_id == id)
            .ok_or(Error::NotFound(id))?;

        debug!("Queue: removed {}", id);
        Ok(self.entries.remove(index))
    }

    /// Skip forward one entry
    ///
    /// Returns the new current entry, or `None` when nothing moved (empty
    /// queue, or already at the last entry; there is no wraparound).
    pub fn advance(&mut self) -> Result<Option<QueueEntry>> {
        let next = match self.current_position()? {
            None => 0,
            Some(index) => index + 1,
        };

        Ok(self.point_at(next))
    }

    /// Step back one entry; `None` when nothing is current or at the first entry
    pub fn back(&mut self) -> Result<Option<QueueEntry>> {
        match self.current_position()? {
            Some(index) if index > 0 => Ok(self.point_at(index - 1)),
            _ => Ok(None),
        }
    }

    /// Point at an arbitrary entry
    pub fn select(&mut self, id: PlaylistId) -> Result<QueueEntry> {
        let entry = self.get(id).cloned().ok_or(Error::NotFound(id))?;
        self.current = Some(id);
        Ok(entry)
    }

    /// Remove every entry and clear the pointer
    pub fn clear(&mut self) -> Vec<QueueEntry> {
        self.current = None;
        std::mem::take(&mut self.entries)
    }

    /// Adopt a reconciled sequence and pointer
    pub fn replace(&mut self, entries: Vec<QueueEntry>, current: Option<PlaylistId>) -> Result<()> {
        let mut ids: Vec<PlaylistId> = entries.iter().map(|e| e.playlist_id).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(Error::InvariantViolation(
                "reconciled queue contains a duplicate playlist id".to_string(),
            ));
        }
        if let Some(id) = current {
            if !entries.iter().any(|e| e.playlist_id == id) {
                return Err(Error::InvariantViolation(format!(
                    "reconciled current entry {} is not in the queue",
                    id
                )));
            }
        }

        self.entries = entries;
        self.current = current;
        Ok(())
    }

    fn point_at(&mut self, index: usize) -> Option<QueueEntry> {
        let entry = self.entries.get(index)?.clone();
        self.current = Some(entry.playlist_id);
        Some(entry)
    }

    /// Point at `id` without checking it is queued
    #[cfg(test)]
    pub(crate) fn set_current_unchecked(&mut self, id: Option<PlaylistId>) {
        self.current = id;
    }

    fn current_position(&self) -> Result<Option<usize>> {
        match self.current {
            None => Ok(None),
            Some(id) => self
                .entries
                .iter()
                .position(|e| e.playlist_id == id)
                .map(Some)
                .ok_or_else(|| {
                    Error::InvariantViolation(format!("current entry {} is not in the queue", id))
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::sink::CanPlay;
    use helix_common::{ItemKind, SinkKind};

    struct AcceptMpeg;

    impl SinkCapabilities for AcceptMpeg {
        fn can_play(&self, sink: SinkKind, mimetype: &str) -> CanPlay {
            if sink == SinkKind::Audio && mimetype == "audio/mpeg" {
                CanPlay::Maybe
            } else {
                CanPlay::No
            }
        }
    }

    fn track(id: &str) -> PlayableItem {
        PlayableItem {
            directory: "d".to_string(),
            id: id.to_string(),
            title: format!("Track {}", id),
            kind: ItemKind::Audio,
            candidate_mimetypes: vec!["audio/mpeg".to_string()],
        }
    }

    fn queue_of(n: usize) -> QueueStore {
        let mut queue = QueueStore::new();
        for i in 0..n {
            queue.enqueue(track(&i.to_string()), &AcceptMpeg).unwrap();
        }
        queue
    }

    #[test]
    fn test_generators_are_independent() {
        let mut a = PlaylistIdGenerator::new();
        let mut b = PlaylistIdGenerator::new();
        assert_eq!(a.next_id(), PlaylistId(1));
        assert_eq!(a.next_id(), PlaylistId(2));
        assert_eq!(b.next_id(), PlaylistId(1));
    }

    #[test]
    fn test_enqueue_does_not_move_pointer() {
        let queue = queue_of(2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current_id(), None);
    }

    #[test]
    fn test_enqueue_unplayable() {
        let mut queue = QueueStore::new();
        let mut item = track("x");
        item.candidate_mimetypes = vec!["video/unknown".to_string()];

        let result = queue.enqueue(item, &AcceptMpeg);
        assert!(matches!(result, Err(Error::NotPlayable { .. })));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_advance_walks_forward_without_wrapping() {
        let mut queue = queue_of(2);

        assert_eq!(queue.advance().unwrap().map(|e| e.playlist_id), Some(PlaylistId(1)));
        assert_eq!(queue.advance().unwrap().map(|e| e.playlist_id), Some(PlaylistId(2)));
        assert_eq!(queue.advance().unwrap(), None);
        assert_eq!(queue.current_id(), Some(PlaylistId(2)));
    }

    #[test]
    fn test_advance_on_empty_queue() {
        let mut queue = QueueStore::new();
        assert_eq!(queue.advance().unwrap(), None);
        assert_eq!(queue.current_id(), None);
    }

    #[test]
    fn test_back() {
        let mut queue = queue_of(3);
        assert_eq!(queue.back().unwrap(), None);

        queue.select(PlaylistId(3)).unwrap();
        assert_eq!(queue.back().unwrap().map(|e| e.playlist_id), Some(PlaylistId(2)));
        assert_eq!(queue.back().unwrap().map(|e| e.playlist_id), Some(PlaylistId(1)));
        assert_eq!(queue.back().unwrap(), None);
        assert_eq!(queue.current_id(), Some(PlaylistId(1)));
    }

    #[test]
    fn test_dequeue_current_rejected() {
        let mut queue = queue_of(2);
        queue.advance().unwrap();

        let result = queue.dequeue(PlaylistId(1));
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current_id(), Some(PlaylistId(1)));

        assert_eq!(queue.dequeue(PlaylistId(2)).unwrap().playlist_id, PlaylistId(2));
        assert!(matches!(queue.dequeue(PlaylistId(9)), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_history_and_upcoming() {
        let mut queue = queue_of(3);
        assert!(queue.history().is_empty());
        assert_eq!(queue.upcoming().len(), 3);

        queue.select(PlaylistId(2)).unwrap();
        assert_eq!(queue.history().len(), 1);
        assert_eq!(queue.upcoming()[0].playlist_id, PlaylistId(2));
        assert_eq!(queue.upcoming().len(), 2);
    }

    #[test]
    fn test_dangling_current_is_an_invariant_violation() {
        let mut queue = queue_of(2);
        queue.set_current_unchecked(Some(PlaylistId(99)));

        assert!(matches!(queue.advance(), Err(Error::InvariantViolation(_))));
        assert!(matches!(queue.back(), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_replace_rejects_dangling_current() {
        let mut queue = queue_of(2);
        let entries = queue.entries()[..1].to_vec();

        let result = queue.replace(entries, Some(PlaylistId(2)));
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_replace_rejects_duplicates() {
        let mut queue = queue_of(1);
        let entry = queue.entries()[0].clone();

        let result = queue.replace(vec![entry.clone(), entry], None);
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_allocated_ids_continue_sequence() {
        let mut queue = queue_of(2);
        assert_eq!(queue.allocate_id(), PlaylistId(3));
        let entry = queue.enqueue(track("z"), &AcceptMpeg).unwrap();
        assert_eq!(entry.playlist_id, PlaylistId(4));
    }
}
