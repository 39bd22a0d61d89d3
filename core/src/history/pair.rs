//! The undo/redo pair owned by each document.

use crate::document::{DetachedObject, Document, MapObject, ObjectId, Selection};

use super::config::HistoryConfig;
use super::stack::{History, HistoryRole};

/// A document's undo stack together with its redo stack.
///
/// Editing code records through this type. Opening a transaction here (as
/// opposed to on the raw [`History`]) discards the redo stack, since a new
/// edit makes the undone tracks unreachable.
///
/// # Example
///
/// ```ignore
/// let mut history = DocumentHistory::new(HistoryConfig::default());
///
/// history.mark_undo_position(Some(&selection), Some("Move"));
/// history.keep(&world, id);
/// world.object_mut(id).unwrap().origin = new_origin;
///
/// history.undo(&mut world);
/// history.redo(&mut world);
/// ```
#[derive(Debug)]
pub struct DocumentHistory<O: MapObject> {
    undo: History<O>,
    redo: History<O>,
}

impl<O: MapObject> DocumentHistory<O> {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo: History::new(HistoryRole::Undo, config.clone()),
            redo: History::new(HistoryRole::Redo, config),
        }
    }

    /// A pair that never records anything.
    pub fn null() -> Self {
        Self {
            undo: History::null(HistoryRole::Undo),
            redo: History::null(HistoryRole::Redo),
        }
    }

    pub fn undo_stack(&self) -> &History<O> {
        &self.undo
    }

    pub fn redo_stack(&self) -> &History<O> {
        &self.redo
    }

    /// Opens a new transaction, discarding everything that could be redone.
    pub fn mark_undo_position(&mut self, selection: Option<&Selection>, name: Option<&str>) {
        if !self.undo.is_recording() {
            return;
        }
        if self.redo.track_count() > 0 {
            log::debug!("new edit discards {} redo tracks", self.redo.track_count());
            self.redo.purge();
        }
        self.undo.mark_undo_position(selection, name);
    }

    /// Renames the open transaction.
    pub fn set_current_track_name(&mut self, name: impl Into<String>) {
        self.undo.set_current_track_name(name);
    }

    /// See [`History::keep`].
    pub fn keep<D>(&mut self, document: &D, id: ObjectId)
    where
        D: Document<Object = O>,
    {
        self.ensure_track(document, id);
        self.undo.keep(document, id);
    }

    /// See [`History::keep_no_children`].
    pub fn keep_no_children<D>(&mut self, document: &D, id: ObjectId)
    where
        D: Document<Object = O>,
    {
        self.ensure_track(document, id);
        self.undo.keep_no_children(document, id);
    }

    pub fn keep_all<D, I>(&mut self, document: &D, ids: I)
    where
        D: Document<Object = O>,
        I: IntoIterator<Item = ObjectId>,
    {
        for id in ids {
            self.keep(document, id);
        }
    }

    /// See [`History::keep_new`].
    pub fn keep_new<D>(&mut self, document: &D, id: ObjectId, keep_children: bool)
    where
        D: Document<Object = O>,
    {
        self.ensure_track(document, id);
        self.undo.keep_new(document, id, keep_children);
    }

    pub fn keep_new_all<D, I>(&mut self, document: &D, ids: I, keep_children: bool)
    where
        D: Document<Object = O>,
        I: IntoIterator<Item = ObjectId>,
    {
        for id in ids {
            self.keep_new(document, id, keep_children);
        }
    }

    /// See [`History::keep_for_destruction`].
    pub fn keep_for_destruction(&mut self, deleted: DetachedObject<O>) {
        if self.undo.would_record(deleted.object()) && !self.undo.has_open_track() {
            self.mark_undo_position(None, None);
        }
        self.undo.keep_for_destruction(deleted);
    }

    /// Opens a transaction first if recording `id` would need one, so that
    /// lazily opened tracks also discard the redo stack.
    fn ensure_track<D>(&mut self, document: &D, id: ObjectId)
    where
        D: Document<Object = O>,
    {
        if self.undo.has_open_track() {
            return;
        }
        if document
            .object(id)
            .is_some_and(|object| self.undo.would_record(object))
        {
            self.mark_undo_position(None, None);
        }
    }

    /// Reverts the newest transaction. See [`History::undo`].
    pub fn undo<D>(&mut self, document: &mut D) -> Option<Selection>
    where
        D: Document<Object = O>,
    {
        self.undo.undo(document, &mut self.redo)
    }

    /// Re-applies the newest undone transaction.
    pub fn redo<D>(&mut self, document: &mut D) -> Option<Selection>
    where
        D: Document<Object = O>,
    {
        self.redo.undo(document, &mut self.undo)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.is_undoable()
    }

    pub fn can_redo(&self) -> bool {
        self.redo.is_undoable()
    }

    /// Name of the transaction [`undo`](Self::undo) would revert, for an
    /// "Undo Move" menu entry.
    pub fn undo_name(&self) -> Option<&str> {
        self.undo.undo_name()
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.redo.undo_name()
    }

    pub fn is_active(&self) -> bool {
        self.undo.is_active()
    }

    /// Enables or disables both stacks. Disabling discards every track.
    pub fn set_active(&mut self, active: bool) {
        self.undo.set_active(active);
        self.redo.set_active(active);
    }

    pub fn is_paused(&self) -> bool {
        self.undo.is_paused()
    }

    /// Suppresses recording of user edits. Nests.
    pub fn pause(&mut self) {
        self.undo.pause();
    }

    pub fn resume(&mut self) {
        self.undo.resume();
    }

    /// Discards both stacks.
    pub fn purge(&mut self) {
        self.undo.purge();
        self.redo.purge();
    }

    pub fn set_config(&mut self, config: HistoryConfig) {
        self.undo.set_config(config.clone());
        self.redo.set_config(config);
    }

    /// Combined size of both stacks.
    pub fn size_bytes(&self) -> usize {
        self.undo.size_bytes() + self.redo.size_bytes()
    }
}
