//! One undo or redo stack.
//!
//! A [`History`] holds closed tracks plus at most one open track that new
//! entries are appended to. Two of them form a document's undo/redo pair
//! (see [`DocumentHistory`](super::DocumentHistory)): undoing a track on one
//! side records the inverse actions into a fresh track on the other side.
//!
//! ```text
//! mark "Move"      keep(a)         mark "Delete"    keep_for_destruction(b)
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ closed: [..]   open: "Move" [Copy a]                                  │
//! │ closed: [.., "Move"]   open: "Delete" [Delete b]                      │
//! └──────────────────────────────────────────────────────────────────────┘
//!
//! undo() on the undo stack
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ undo: closed: [.., "Move"]   open: none                               │
//! │ redo: closed: ["Delete" [Create b]]                                   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

use crate::document::{DetachedObject, Document, MapObject, ObjectId, Selection};
use crate::{profile_plot, profile_scope};

use super::config::HistoryConfig;
use super::track::HistoryTrack;

/// Which side of the undo/redo pair a [`History`] plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    Undo,
    Redo,
}

impl HistoryRole {
    /// The side that receives the inverse of this side's tracks.
    pub fn opposite(self) -> Self {
        match self {
            Self::Undo => Self::Redo,
            Self::Redo => Self::Undo,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// A bounded stack of [`HistoryTrack`]s.
pub struct History<O: MapObject> {
    role: HistoryRole,
    /// Closed tracks, oldest at the front.
    tracks: VecDeque<HistoryTrack<O>>,
    /// The track entries are currently appended to.
    current: Option<HistoryTrack<O>>,
    pause_depth: u32,
    active: bool,
    always_paused: bool,
    config: HistoryConfig,
    /// Accumulated size of the closed tracks.
    closed_bytes: usize,
}

impl<O: MapObject> History<O> {
    /// Creates an empty stack. It starts active unless `config.enabled` is
    /// `false`.
    pub fn new(role: HistoryRole, config: HistoryConfig) -> Self {
        Self {
            role,
            tracks: VecDeque::new(),
            current: None,
            pause_depth: 0,
            active: config.enabled,
            always_paused: false,
            config,
            closed_bytes: 0,
        }
    }

    /// Creates a stack that never records anything.
    ///
    /// Stands in for "the current document's history" when no document is
    /// open, so editing code can always be handed a history.
    pub fn null(role: HistoryRole) -> Self {
        Self {
            always_paused: true,
            ..Self::new(role, HistoryConfig::default())
        }
    }

    pub fn role(&self) -> HistoryRole {
        self.role
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Replaces the limits and evicts tracks that no longer fit.
    pub fn set_config(&mut self, config: HistoryConfig) {
        self.config = config;
        self.enforce_limits();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enables or disables the stack. Disabling discards every track.
    pub fn set_active(&mut self, active: bool) {
        if !active && self.track_count() > 0 {
            log::debug!(
                "{} history disabled, discarding {} tracks",
                self.role.verb(),
                self.track_count()
            );
            self.purge();
        }
        self.active = active;
    }

    pub fn is_paused(&self) -> bool {
        self.always_paused || self.pause_depth > 0
    }

    /// Returns `true` if `keep*` calls currently record entries.
    pub fn is_recording(&self) -> bool {
        self.active && !self.is_paused()
    }

    /// Suppresses recording until the matching [`resume`](Self::resume).
    /// Nests.
    pub fn pause(&mut self) {
        self.pause_depth += 1;
    }

    pub fn resume(&mut self) {
        if self.pause_depth == 0 {
            log::warn!("{} history resumed without a matching pause", self.role.verb());
            return;
        }
        self.pause_depth -= 1;
    }

    /// Number of tracks, counting the open one.
    pub fn track_count(&self) -> usize {
        self.tracks.len() + usize::from(self.current.is_some())
    }

    /// Accumulated size of all tracks.
    pub fn size_bytes(&self) -> usize {
        self.closed_bytes + self.current.as_ref().map_or(0, HistoryTrack::size_bytes)
    }

    pub fn has_open_track(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_track(&self) -> Option<&HistoryTrack<O>> {
        self.current.as_ref()
    }

    pub fn current_track_name(&self) -> Option<&str> {
        self.current.as_ref().map(HistoryTrack::name)
    }

    /// Renames the open track, e.g. once the edit turns out to be a "Clone"
    /// rather than a "Move".
    pub fn set_current_track_name(&mut self, name: impl Into<String>) {
        if let Some(track) = self.current.as_mut() {
            track.set_name(name);
        }
    }

    /// Iterates over the non-empty tracks, newest first.
    pub fn tracks(&self) -> impl Iterator<Item = &HistoryTrack<O>> {
        self.current
            .iter()
            .filter(|t| !t.is_empty())
            .chain(self.tracks.iter().rev())
    }

    /// Names of the non-empty tracks, newest first.
    pub fn track_names(&self) -> impl Iterator<Item = &str> {
        self.tracks().map(HistoryTrack::name)
    }

    /// Name of the track the next [`undo`](Self::undo) would replay.
    pub fn undo_name(&self) -> Option<&str> {
        self.track_names().next()
    }

    /// Returns `true` if [`undo`](Self::undo) has something to replay.
    pub fn is_undoable(&self) -> bool {
        self.active && self.tracks().next().is_some()
    }

    /// Ends the current transaction and opens a new one.
    ///
    /// An open track without entries is discarded rather than closed. The
    /// new track is named `name` and remembers `selection`; both may be left
    /// out. Oldest tracks are evicted to honor the configured limits.
    pub fn mark_undo_position(&mut self, selection: Option<&Selection>, name: Option<&str>) {
        if !self.is_recording() {
            return;
        }
        self.close_current();
        let track = HistoryTrack::new(
            name.unwrap_or_default(),
            selection.cloned().unwrap_or_default(),
        );
        log::debug!(
            "{} history: opened track {} \"{}\"",
            self.role.verb(),
            track.id().raw(),
            track.name()
        );
        self.current = Some(track);
        self.enforce_limits();
    }

    /// Returns `true` if keeping `object` would record an entry.
    pub fn would_record(&self, object: &O) -> bool {
        self.is_recording() && !object.is_temporary()
    }

    /// Snapshots `id` and all of its descendants before they change.
    ///
    /// Only values and parent links are captured. Adding or removing
    /// children must be recorded with [`keep_new`](Self::keep_new) and
    /// [`keep_for_destruction`](Self::keep_for_destruction).
    pub fn keep<D>(&mut self, document: &D, id: ObjectId)
    where
        D: Document<Object = O>,
    {
        self.keep_object(document, id, true);
    }

    /// Snapshots `id` alone.
    pub fn keep_no_children<D>(&mut self, document: &D, id: ObjectId)
    where
        D: Document<Object = O>,
    {
        self.keep_object(document, id, false);
    }

    /// [`keep`](Self::keep) for every id in `ids`.
    pub fn keep_all<D, I>(&mut self, document: &D, ids: I)
    where
        D: Document<Object = O>,
        I: IntoIterator<Item = ObjectId>,
    {
        for id in ids {
            self.keep(document, id);
        }
    }

    fn keep_object<D>(&mut self, document: &D, id: ObjectId, keep_children: bool)
    where
        D: Document<Object = O>,
    {
        if !self.is_recording() {
            return;
        }
        let Some(object) = document.object(id) else {
            log::warn!("keep: {id} is not in the world");
            return;
        };
        if object.is_temporary() {
            return;
        }
        let Some(track) = self.open_track() else {
            return;
        };
        track.keep(document, id, keep_children);
        if keep_children {
            for child in document.descendants(id) {
                if document.object(child).is_some_and(|o| !o.is_temporary()) {
                    track.keep(document, child, false);
                }
            }
        }
    }

    /// Records `id` (and, with `keep_children`, its current descendants) as
    /// newly added to the world. Call after inserting the object.
    pub fn keep_new<D>(&mut self, document: &D, id: ObjectId, keep_children: bool)
    where
        D: Document<Object = O>,
    {
        if !self.is_recording() {
            return;
        }
        let Some(object) = document.object(id) else {
            log::warn!("keep_new: {id} is not in the world");
            return;
        };
        if object.is_temporary() {
            return;
        }
        let Some(track) = self.open_track() else {
            return;
        };
        track.keep_new(id);
        if keep_children {
            for child in document.descendants(id) {
                if document.object(child).is_some_and(|o| !o.is_temporary()) {
                    track.keep_new(child);
                }
            }
        }
    }

    /// [`keep_new`](Self::keep_new) for every id in `ids`.
    pub fn keep_new_all<D, I>(&mut self, document: &D, ids: I, keep_children: bool)
    where
        D: Document<Object = O>,
        I: IntoIterator<Item = ObjectId>,
    {
        for id in ids {
            self.keep_new(document, id, keep_children);
        }
    }

    /// Takes ownership of an object the caller just removed from the world.
    ///
    /// When nothing is being recorded the object is dropped.
    pub fn keep_for_destruction(&mut self, deleted: DetachedObject<O>) {
        if !self.is_recording() || deleted.object().is_temporary() {
            log::trace!("dropping {} without recording it", deleted.id());
            return;
        }
        if let Some(track) = self.open_track() {
            track.keep_for_destruction(deleted);
        }
    }

    /// Replays the newest track against `document`.
    ///
    /// The inverse actions are recorded into a new track on `opposite`, named
    /// and selected like the replayed one, so that `opposite.undo` can redo
    /// them. Returns the selection captured when the replayed track opened,
    /// restricted to objects that are still in the world, or `None` if there
    /// was nothing to replay.
    pub fn undo<D>(&mut self, document: &mut D, opposite: &mut History<O>) -> Option<Selection>
    where
        D: Document<Object = O>,
    {
        profile_scope!("history_undo");

        let Some(track) = self.pop_track() else {
            log::warn!("nothing to {}", self.role.verb());
            return None;
        };
        log::info!(
            "{} \"{}\" ({} entries)",
            self.role.verb(),
            track.name(),
            track.len()
        );

        debug_assert_eq!(opposite.role(), self.role.opposite());
        opposite.mark_undo_position(Some(track.selection()), Some(track.name()));

        self.pause();
        let mut selection = track.undo(document, opposite);
        self.resume();

        opposite.close_current();
        selection.retain(|id| document.contains(id));

        profile_plot!("history_bytes", self.size_bytes() + opposite.size_bytes());
        Some(selection)
    }

    /// Discards every track.
    pub fn purge(&mut self) {
        self.tracks.clear();
        self.current = None;
        self.closed_bytes = 0;
    }

    fn open_track(&mut self) -> Option<&mut HistoryTrack<O>> {
        if self.current.is_none() {
            self.mark_undo_position(None, None);
        }
        self.current.as_mut()
    }

    fn close_current(&mut self) {
        let Some(track) = self.current.take() else {
            return;
        };
        if track.is_empty() {
            return;
        }
        self.closed_bytes += track.size_bytes();
        self.tracks.push_back(track);
    }

    fn pop_track(&mut self) -> Option<HistoryTrack<O>> {
        if let Some(current) = self.current.take()
            && !current.is_empty()
        {
            return Some(current);
        }
        let track = self.tracks.pop_back()?;
        self.closed_bytes -= track.size_bytes();
        Some(track)
    }

    fn enforce_limits(&mut self) {
        while self.track_count() > self.config.undo_levels {
            let Some(evicted) = self.tracks.pop_front() else {
                break;
            };
            self.evicted(evicted);
        }
        if self.config.max_bytes > 0 {
            while self.size_bytes() > self.config.max_bytes {
                let Some(evicted) = self.tracks.pop_front() else {
                    break;
                };
                self.evicted(evicted);
            }
        }
        profile_plot!("history_bytes", self.size_bytes());
    }

    fn evicted(&mut self, track: HistoryTrack<O>) {
        self.closed_bytes -= track.size_bytes();
        log::debug!(
            "{} history: evicted track {} \"{}\" ({} bytes)",
            self.role.verb(),
            track.id().raw(),
            track.name(),
            track.size_bytes()
        );
    }
}

impl<O: MapObject> fmt::Debug for History<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("role", &self.role)
            .field("tracks", &self.tracks.len())
            .field("open", &self.current.as_ref().map(HistoryTrack::name))
            .field("pause_depth", &self.pause_depth)
            .field("active", &self.active)
            .field("always_paused", &self.always_paused)
            .field("size_bytes", &self.size_bytes())
            .field("config", &self.config)
            .finish()
    }
}
