//! One undoable transaction.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::{DetachedObject, Document, MapObject, ObjectId, Selection};

use super::entry::{EntryKind, TrackEntry, UndoneEntry};
use super::stack::History;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide, monotonically increasing track identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    fn next() -> Self {
        Self(NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Entry kinds already recorded for one object in one track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct KeptKinds(u8);

impl KeptKinds {
    fn bit(kind: EntryKind) -> u8 {
        match kind {
            EntryKind::Copy => 1,
            EntryKind::Create => 1 << 1,
            EntryKind::Delete => 1 << 2,
        }
    }

    fn contains(self, kind: EntryKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }

    fn insert(&mut self, kind: EntryKind) {
        self.0 |= Self::bit(kind);
    }
}

/// A named batch of entries reverted together by one undo.
///
/// The track remembers which objects it has already recorded, and of which
/// kind, so that keeping the same object repeatedly within one transaction
/// records it once.
#[derive(Debug)]
pub struct HistoryTrack<O: MapObject> {
    id: TrackId,
    name: String,
    selection: Selection,
    entries: Vec<TrackEntry<O>>,
    kept: HashMap<ObjectId, KeptKinds>,
    size_bytes: usize,
}

impl<O: MapObject> HistoryTrack<O> {
    pub fn new(name: impl Into<String>, selection: Selection) -> Self {
        Self {
            id: TrackId::next(),
            name: name.into(),
            selection,
            entries: Vec::new(),
            kept: HashMap::new(),
            size_bytes: 0,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Objects selected when the transaction opened.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn entries(&self) -> &[TrackEntry<O>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accumulated size of all entries.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Returns `true` if `id` already has an entry of `kind` in this track.
    pub fn is_kept(&self, id: ObjectId, kind: EntryKind) -> bool {
        self.kept.get(&id).is_some_and(|k| k.contains(kind))
    }

    /// Records a Copy entry for `id`.
    ///
    /// Skipped when `id` already has a Copy entry, or a Create entry (undoing
    /// the creation removes the object, so its old value is irrelevant).
    /// Returns `true` if an entry was added.
    pub fn keep<D>(&mut self, document: &D, id: ObjectId, keep_children: bool) -> bool
    where
        D: Document<Object = O>,
    {
        if self.is_kept(id, EntryKind::Copy) || self.is_kept(id, EntryKind::Create) {
            return false;
        }
        match TrackEntry::copy(document, id, keep_children) {
            Some(entry) => {
                self.push(entry);
                true
            }
            None => {
                log::warn!("keep: {id} is not in the world");
                false
            }
        }
    }

    /// Records a Create entry for `id`. Returns `true` if an entry was added.
    pub fn keep_new(&mut self, id: ObjectId) -> bool {
        if self.is_kept(id, EntryKind::Create) {
            log::warn!(
                "keep_new: {id} was already recorded as new in track \"{}\"",
                self.name
            );
            return false;
        }
        self.push(TrackEntry::create(id));
        true
    }

    /// Records a Delete entry taking ownership of `deleted`.
    ///
    /// If the object already has a Delete entry the value is dropped. Returns
    /// `true` if an entry was added.
    pub fn keep_for_destruction(&mut self, deleted: DetachedObject<O>) -> bool {
        if self.is_kept(deleted.id(), EntryKind::Delete) {
            log::warn!(
                "keep_for_destruction: {} was already recorded as deleted",
                deleted.id()
            );
            return false;
        }
        self.push(TrackEntry::delete(deleted));
        true
    }

    fn push(&mut self, entry: TrackEntry<O>) {
        let id = entry.object_id();
        let kind = entry.kind();
        self.kept.entry(id).or_default().insert(kind);
        self.size_bytes += entry.size_bytes();
        log::trace!("track {}: recorded {kind:?} for {id}", self.id.raw());
        self.entries.push(entry);
    }

    /// Reverts every entry, newest first, then notifies the restored objects.
    ///
    /// All entries are reversed before any notification goes out, so that
    /// handlers looking at other objects see the fully reverted graph.
    /// Returns the selection the track was opened with.
    pub(crate) fn undo<D>(self, document: &mut D, opposite: &mut History<O>) -> Selection
    where
        D: Document<Object = O>,
    {
        let Self {
            entries,
            selection,
            kept,
            ..
        } = self;

        let mut pending: HashSet<ObjectId> = kept
            .into_iter()
            .filter(|(_, kinds)| kinds.contains(EntryKind::Copy))
            .map(|(id, _)| id)
            .collect();

        let mut undone: Vec<UndoneEntry> = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().rev() {
            if entry.kind() == EntryKind::Copy {
                pending.remove(&entry.object_id());
            }
            undone.push(entry.undo(document, opposite, &pending));
        }

        for entry in &undone {
            entry.dispatch_undo_notify(document);
        }

        selection
    }
}
