//! Ordered play queue
//!
//! A flat list of tracks plus a cursor marking the one that is currently
//! loaded. The queue never starts playback on its own; the engine reads
//! `next_index`/`prev_index` and drives the transport.

use herald_core::Track;
use tracing::debug;

/// Ordered queue of tracks with a cursor on the current one.
#[derive(Debug, Default, Clone)]
pub struct PlayQueue {
    items: Vec<Track>,
    current: Option<usize>,
}

impl PlayQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track unless a track with the same id is already queued.
    ///
    /// Returns `true` if the track was added.
    pub fn add(&mut self, track: Track) -> bool {
        if self.find_index(&track.id).is_some() {
            debug!(track_id = %track.id, "track already queued, skipping");
            return false;
        }

        self.items.push(track);
        true
    }

    /// Remove the track with the given id, if present.
    ///
    /// Removing the current track clears the cursor; removing an earlier
    /// track shifts it so it keeps pointing at the same item.
    pub fn remove_by_id(&mut self, track_id: &str) -> bool {
        let Some(index) = self.find_index(track_id) else {
            return false;
        };

        self.items.remove(index);

        match self.current {
            Some(cur) if index == cur => self.current = None,
            Some(cur) if index < cur => self.current = Some(cur - 1),
            _ => {}
        }

        true
    }

    /// Remove every track and clear the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    /// Move the item at `from` to position `to`.
    ///
    /// The cursor keeps pointing at the same track. Moving the current track
    /// itself is refused so the loaded item never changes position under the
    /// transport. Returns `true` if the queue changed.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() || from == to {
            return false;
        }
        if self.current == Some(from) {
            debug!(from, to, "refusing to reorder the current track");
            return false;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(cur) = self.current {
            if from < cur && to >= cur {
                self.current = Some(cur - 1);
            } else if from > cur && to <= cur {
                self.current = Some(cur + 1);
            }
        }

        true
    }

    /// Point the cursor at `index`. Out-of-range clears it.
    pub fn set_current(&mut self, index: usize) {
        self.current = (index < self.items.len()).then_some(index);
    }

    /// Clear the cursor without touching the items.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Index of the track that would play next.
    ///
    /// With no cursor set, a non-empty queue starts from the front; that is
    /// how tracks queued while something external was playing get their turn.
    pub fn next_index(&self) -> Option<usize> {
        match self.current {
            Some(cur) if cur + 1 < self.items.len() => Some(cur + 1),
            Some(_) => None,
            None if !self.items.is_empty() => Some(0),
            None => None,
        }
    }

    /// Index of the previous track, if the cursor is not at the front.
    pub fn prev_index(&self) -> Option<usize> {
        match self.current {
            Some(cur) if cur > 0 => Some(cur - 1),
            _ => None,
        }
    }

    /// Cursor position, if set.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The track under the cursor.
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Track at `index`.
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.items.get(index)
    }

    /// Position of the track with the given id.
    pub fn find_index(&self, track_id: &str) -> Option<usize> {
        self.items.iter().position(|t| t.id == track_id)
    }

    /// All queued tracks in order.
    pub fn items(&self) -> &[Track] {
        &self.items
    }

    /// Number of queued tracks.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
