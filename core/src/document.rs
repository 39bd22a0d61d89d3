//! The document side of the history engine.
//!
//! The history never owns live objects: they belong to a [`Document`], which
//! exposes them by [`ObjectId`]. What the history needs from an object's value
//! is captured by [`MapObject`]; what it needs from the object graph
//! (parent links, children, inserting and removing subtrees) is captured by
//! [`Document`].
//!
//! Removing an object from the world hands back a [`DetachedObject`]: an owned
//! subtree that can later be re-inserted with the same ids. The history keeps
//! deleted objects alive by holding on to these values.

use std::fmt;

use thiserror::Error;

/// Identity of an object in a document.
///
/// Two handles are the same object if and only if their ids are equal. Ids
/// survive a remove/re-insert round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Creates an id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broadcast sent to the dependents of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The object's data changed (including by undo or redo).
    Changed,
    /// The object left the world.
    Removed,
}

/// The set of objects selected when a transaction was opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(Vec<ObjectId>);

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object to the selection, ignoring duplicates.
    pub fn insert(&mut self, id: ObjectId) {
        if !self.0.contains(&id) {
            self.0.push(id);
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the selected ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.0.iter().copied()
    }

    /// Keeps only the ids for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(ObjectId) -> bool) {
        self.0.retain(|id| keep(*id));
    }
}

impl FromIterator<ObjectId> for Selection {
    fn from_iter<I: IntoIterator<Item = ObjectId>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for id in iter {
            selection.insert(id);
        }
        selection
    }
}

/// The value of an editable object (brush, entity, group...).
///
/// This is everything the history asks of an object's *data*; its place in
/// the object graph is the [`Document`]'s business.
pub trait MapObject: fmt::Debug + 'static {
    /// Returns a deep value copy of this object.
    ///
    /// With `update_dependencies == false` the copy is a throwaway snapshot
    /// and must not register itself with anything.
    fn duplicate(&self, update_dependencies: bool) -> Self
    where
        Self: Sized;

    /// Overwrites this object's state with `source`.
    ///
    /// With `update_dependencies == true` the object is live in the world and
    /// should refresh anything derived from its data.
    fn copy_from(&mut self, source: &Self, update_dependencies: bool)
    where
        Self: Sized;

    /// Temporary objects (tool previews and the like) are never recorded.
    fn is_temporary(&self) -> bool {
        false
    }

    /// Approximate heap + inline size, used for history memory accounting.
    fn size_bytes(&self) -> usize {
        std::mem::size_of_val(self)
    }

    /// Called once the object has been restored by an undo or redo.
    fn on_undo_redo(&mut self) {}

    /// Called on every dependent of `source` when `source` broadcasts.
    fn on_notify_dependent(&mut self, _source: ObjectId, _notification: Notification) {}
}

/// Errors reported by document graph operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("object {0} is not in the world")]
    NotFound(ObjectId),
    #[error("object {0} is already in the world")]
    AlreadyPresent(ObjectId),
    #[error("parent {0} is not in the world")]
    ParentNotFound(ObjectId),
    #[error("cannot move {child} under its own descendant {parent}")]
    Cycle { child: ObjectId, parent: ObjectId },
    #[error("the world root {0} cannot be removed")]
    RootRemoval(ObjectId),
}

/// Result type for document operations.
pub type DocumentResult<T = ()> = Result<T, DocumentError>;

/// An object that has been taken out of the world, together with its subtree.
///
/// Whoever holds a `DetachedObject` owns the objects in it. Dropping it frees
/// them; [`Document::add_object_to_world`] moves them back into the world.
#[derive(Debug)]
pub struct DetachedObject<O> {
    id: ObjectId,
    object: O,
    parent: Option<ObjectId>,
    children: Vec<DetachedObject<O>>,
}

impl<O: MapObject> DetachedObject<O> {
    /// Creates a detached object without children.
    pub fn new(id: ObjectId, object: O, parent: Option<ObjectId>) -> Self {
        Self {
            id,
            object,
            parent,
            children: Vec::new(),
        }
    }

    /// Attaches `child` below this object.
    pub fn with_child(mut self, child: DetachedObject<O>) -> Self {
        self.push_child(child);
        self
    }

    pub fn push_child(&mut self, mut child: DetachedObject<O>) {
        child.parent = Some(self.id);
        self.children.push(child);
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn object(&self) -> &O {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut O {
        &mut self.object
    }

    /// The parent the object had when it was removed from the world.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[DetachedObject<O>] {
        &self.children
    }

    /// Total number of objects in this subtree, including the root.
    pub fn object_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(DetachedObject::object_count)
            .sum::<usize>()
    }

    /// Accumulated [`MapObject::size_bytes`] over the whole subtree.
    pub fn size_bytes(&self) -> usize {
        self.object.size_bytes()
            + self
                .children
                .iter()
                .map(DetachedObject::size_bytes)
                .sum::<usize>()
    }

    /// Splits into the object value, its former parent and its children.
    pub fn into_parts(self) -> (ObjectId, O, Option<ObjectId>, Vec<DetachedObject<O>>) {
        (self.id, self.object, self.parent, self.children)
    }
}

/// The object graph that history entries replay against.
///
/// Implementations own their objects exclusively. The history refers to them
/// by [`ObjectId`] and only takes ownership through [`DetachedObject`]s.
///
/// # Value changes vs. structural changes
///
/// Recording a Copy entry (`History::keep`) snapshots an object's value and
/// its parent link, but not the set of its children. Code that adds or
/// removes objects must record that separately with `keep_new` /
/// `keep_for_destruction`; keeping the parent is not enough.
pub trait Document {
    type Object: MapObject;

    /// The world root. It is never removed.
    fn root(&self) -> ObjectId;

    fn object(&self, id: ObjectId) -> Option<&Self::Object>;

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut Self::Object>;

    /// Returns `true` if `id` is currently in the world.
    fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    /// The parent of `id`, or `None` for the root and for unknown ids.
    fn parent(&self, id: ObjectId) -> Option<ObjectId>;

    /// Direct children of `id`, empty for unknown ids.
    fn children(&self, id: ObjectId) -> &[ObjectId];

    /// Moves `id` (with its subtree) under `parent`.
    fn reparent(&mut self, id: ObjectId, parent: ObjectId) -> DocumentResult;

    /// Inserts a detached subtree under `parent`, restoring its ids.
    fn add_object_to_world(
        &mut self,
        object: DetachedObject<Self::Object>,
        parent: ObjectId,
    ) -> DocumentResult;

    /// Removes `id` from the world and returns it with its subtree.
    ///
    /// Children always stay linked to the removed object. `remove_children`
    /// selects whether they are also announced as removed; pass `false` when
    /// new children are being tracked on their own.
    fn remove_object_from_world(
        &mut self,
        id: ObjectId,
        remove_children: bool,
    ) -> DocumentResult<DetachedObject<Self::Object>>;

    /// Broadcasts `notification` from `id` to every object depending on it.
    fn notify_dependents(&mut self, id: ObjectId, notification: Notification);

    /// Pre-order iterator over all descendants of `id` (excluding `id`).
    ///
    /// The iterator walks the graph as it is when each step is taken; create
    /// a fresh one to restart.
    fn descendants(&self, id: ObjectId) -> Descendants<'_, Self>
    where
        Self: Sized,
    {
        Descendants::new(self, id)
    }
}

/// Pre-order walk over the descendants of an object. See
/// [`Document::descendants`].
pub struct Descendants<'a, D: Document> {
    document: &'a D,
    stack: Vec<ObjectId>,
}

impl<'a, D: Document> Descendants<'a, D> {
    pub fn new(document: &'a D, id: ObjectId) -> Self {
        let stack = document.children(id).iter().rev().copied().collect();
        Self { document, stack }
    }
}

impl<D: Document> Iterator for Descendants<'_, D> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}
