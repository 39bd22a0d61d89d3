//! Single reversible actions.
//!
//! A [`TrackEntry`] records exactly one of:
//!
//! - **Copy**: an object is about to be mutated; a snapshot of its value and
//!   parent link is kept.
//! - **Create**: an object was added to the world.
//! - **Delete**: an object was removed from the world; the entry owns the
//!   removed subtree.
//!
//! Reversing an entry consumes it. Whatever it owned is either moved back
//! into the document or dropped, and the opposite stack receives the entry
//! that reverses the reversal.

use std::collections::HashSet;

use crate::document::{DetachedObject, Document, MapObject, Notification, ObjectId};

use super::stack::History;

/// Discriminant of a [`TrackEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Copy,
    Create,
    Delete,
}

/// Value snapshot held by a Copy entry.
#[derive(Debug)]
pub struct KeptCopy<O> {
    object: O,
    parent: Option<ObjectId>,
}

impl<O> KeptCopy<O> {
    pub fn object(&self) -> &O {
        &self.object
    }

    /// Parent link at the time of the snapshot.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }
}

/// One recorded action inside a [`HistoryTrack`](super::HistoryTrack).
#[derive(Debug)]
pub enum TrackEntry<O: MapObject> {
    /// `id` was about to change; `kept` is its state before the change.
    Copy {
        id: ObjectId,
        kept: KeptCopy<O>,
        /// Whether the opposite stack should keep the subtree on reversal.
        keep_children: bool,
    },
    /// `id` was added to the world.
    Create { id: ObjectId },
    /// `deleted` was removed from the world and is owned by this entry.
    Delete { deleted: DetachedObject<O> },
}

impl<O: MapObject> TrackEntry<O> {
    /// Snapshots the current state of `id`.
    ///
    /// Returns `None` if `id` is not in the world.
    pub fn copy<D>(document: &D, id: ObjectId, keep_children: bool) -> Option<Self>
    where
        D: Document<Object = O>,
    {
        let object = document.object(id)?.duplicate(false);
        Some(Self::Copy {
            id,
            kept: KeptCopy {
                object,
                parent: document.parent(id),
            },
            keep_children,
        })
    }

    pub fn create(id: ObjectId) -> Self {
        Self::Create { id }
    }

    pub fn delete(deleted: DetachedObject<O>) -> Self {
        Self::Delete { deleted }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Copy { .. } => EntryKind::Copy,
            Self::Create { .. } => EntryKind::Create,
            Self::Delete { .. } => EntryKind::Delete,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Copy { id, .. } | Self::Create { id } => *id,
            Self::Delete { deleted } => deleted.id(),
        }
    }

    /// Memory held by this entry.
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::Copy { kept, .. } => kept.object.size_bytes(),
            Self::Create { .. } => std::mem::size_of::<ObjectId>(),
            Self::Delete { deleted } => deleted.size_bytes(),
        }
    }

    /// Reverses this entry against `document`, recording the inverse action
    /// in `opposite`.
    ///
    /// `pending` holds the objects whose Copy entries in the same track are
    /// still waiting to be reversed. Undoing a creation pulls those objects
    /// out of the created subtree first, so they survive until their own
    /// entry relinks them.
    ///
    /// Notifications are not sent here; the caller dispatches them through
    /// the returned [`UndoneEntry`] once every entry of the track has been
    /// reversed.
    pub(crate) fn undo<D>(
        self,
        document: &mut D,
        opposite: &mut History<O>,
        pending: &HashSet<ObjectId>,
    ) -> UndoneEntry
    where
        D: Document<Object = O>,
    {
        match self {
            Self::Copy {
                id,
                kept,
                keep_children,
            } => {
                if !document.contains(id) {
                    log::debug!("undo: {id} left the world, snapshot dropped");
                    return UndoneEntry::Skipped;
                }
                if keep_children {
                    opposite.keep(&*document, id);
                } else {
                    opposite.keep_no_children(&*document, id);
                }
                if let Some(object) = document.object_mut(id) {
                    object.copy_from(&kept.object, true);
                }
                if let Some(parent) = kept.parent
                    && document.parent(id) != Some(parent)
                    && let Err(err) = document.reparent(id, parent)
                {
                    log::warn!("undo: could not relink {id} under {parent}: {err}");
                }
                UndoneEntry::Copy(id)
            }
            Self::Delete { deleted } => {
                let id = deleted.id();
                let parent = match deleted.parent() {
                    Some(parent) if document.contains(parent) => parent,
                    Some(parent) => {
                        log::warn!("undo: parent {parent} of {id} is gone, restoring under root");
                        document.root()
                    }
                    None => document.root(),
                };
                match document.add_object_to_world(deleted, parent) {
                    Ok(()) => opposite.keep_new(&*document, id, false),
                    Err(err) => log::warn!("undo: could not restore {id}: {err}"),
                }
                UndoneEntry::Delete(id)
            }
            Self::Create { id } => {
                let home = document.parent(id).unwrap_or_else(|| document.root());
                for kept in pending_descendants(&*document, id, pending) {
                    // Recorded while still under `id`, so redo links it back.
                    opposite.keep(&*document, kept);
                    if let Err(err) = document.reparent(kept, home) {
                        log::warn!("undo: could not move {kept} out of {id}: {err}");
                    }
                }
                match document.remove_object_from_world(id, false) {
                    Ok(detached) => opposite.keep_for_destruction(detached),
                    Err(err) => log::warn!("undo: could not remove {id}: {err}"),
                }
                UndoneEntry::Create(id)
            }
        }
    }
}

/// Topmost descendants of `id` that are in `pending`.
fn pending_descendants<D: Document>(
    document: &D,
    id: ObjectId,
    pending: &HashSet<ObjectId>,
) -> Vec<ObjectId> {
    if pending.is_empty() {
        return Vec::new();
    }
    let mut found = Vec::new();
    let mut stack = document.children(id).to_vec();
    while let Some(child) = stack.pop() {
        if pending.contains(&child) {
            found.push(child);
        } else {
            stack.extend_from_slice(document.children(child));
        }
    }
    found
}

/// What is left of an entry after it has been reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UndoneEntry {
    Copy(ObjectId),
    Create(ObjectId),
    Delete(ObjectId),
    Skipped,
}

impl UndoneEntry {
    /// Sends the post-undo notification for this entry.
    ///
    /// Only restored values are announced. Structural changes (Create and
    /// Delete) send nothing.
    pub(crate) fn dispatch_undo_notify<D: Document>(&self, document: &mut D) {
        let Self::Copy(id) = *self else {
            return;
        };
        if let Some(object) = document.object_mut(id) {
            object.on_undo_redo();
        }
        document.notify_dependents(id, Notification::Changed);
    }
}
