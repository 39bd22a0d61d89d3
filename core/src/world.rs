//! Arena-backed map world.
//!
//! [`MapWorld`] stores every object of a map in a flat table keyed by
//! [`ObjectId`], with parent/children links kept next to each value. It is
//! the reference [`Document`] implementation that the editor and the tests
//! replay history against.

use std::collections::HashMap;

use crate::document::{
    DetachedObject, Document, DocumentError, DocumentResult, MapObject, Notification, ObjectId,
};

#[derive(Debug)]
struct Node<O> {
    object: O,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

/// A tree of map objects rooted at a world object.
#[derive(Debug)]
pub struct MapWorld<O: MapObject> {
    nodes: HashMap<ObjectId, Node<O>>,
    root: ObjectId,
    next_id: u64,
    /// `source -> objects notified when source broadcasts`.
    dependents: HashMap<ObjectId, Vec<ObjectId>>,
}

impl<O: MapObject> MapWorld<O> {
    /// Creates a world whose root holds `root_object`.
    pub fn new(root_object: O) -> Self {
        let root = ObjectId::new(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                object: root_object,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            dependents: HashMap::new(),
        }
    }

    /// Reserves a fresh id that is not used by any object, live or detached.
    pub fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Creates `object` directly in the world under `parent`.
    pub fn insert(&mut self, object: O, parent: ObjectId) -> DocumentResult<ObjectId> {
        if !self.nodes.contains_key(&parent) {
            return Err(DocumentError::ParentNotFound(parent));
        }
        let id = self.allocate_id();
        self.nodes.insert(
            id,
            Node {
                object,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    /// Wraps `object` in a fresh id without putting it in the world.
    ///
    /// Useful for building a subtree before inserting it in one step with
    /// [`Document::add_object_to_world`].
    pub fn detached(&mut self, object: O) -> DetachedObject<O> {
        let id = self.allocate_id();
        DetachedObject::new(id, object, None)
    }

    /// Makes `dependent` receive the notifications broadcast by `source`.
    pub fn add_dependent(&mut self, source: ObjectId, dependent: ObjectId) {
        let list = self.dependents.entry(source).or_default();
        if !list.contains(&dependent) {
            list.push(dependent);
        }
    }

    /// Number of objects in the world, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of all objects in the world, in pre-order from the root.
    pub fn ids(&self) -> Vec<ObjectId> {
        let mut ids = vec![self.root];
        ids.extend(self.descendants(self.root));
        ids
    }

    fn is_ancestor(&self, ancestor: ObjectId, mut id: ObjectId) -> bool {
        while let Some(parent) = self.parent(id) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    fn unlink(&mut self, id: ObjectId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(node) = self.nodes.get_mut(&parent)
        {
            node.children.retain(|c| *c != id);
        }
    }

    fn take_subtree(&mut self, id: ObjectId) -> Option<DetachedObject<O>> {
        let node = self.nodes.remove(&id)?;
        let mut detached = DetachedObject::new(id, node.object, node.parent);
        for child in node.children {
            if let Some(child) = self.take_subtree(child) {
                detached.push_child(child);
            }
        }
        Some(detached)
    }

    fn insert_subtree(&mut self, detached: DetachedObject<O>, parent: ObjectId) {
        let (id, object, _, children) = detached.into_parts();
        self.nodes.insert(
            id,
            Node {
                object,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        if id.raw() >= self.next_id {
            self.next_id = id.raw() + 1;
        }
        for child in children {
            self.insert_subtree(child, id);
        }
    }
}

fn contains_id<O: MapObject>(
    detached: &DetachedObject<O>,
    nodes: &HashMap<ObjectId, Node<O>>,
) -> Option<ObjectId> {
    if nodes.contains_key(&detached.id()) {
        return Some(detached.id());
    }
    detached
        .children()
        .iter()
        .find_map(|child| contains_id(child, nodes))
}

impl<O: MapObject> Document for MapWorld<O> {
    type Object = O;

    fn root(&self) -> ObjectId {
        self.root
    }

    fn object(&self, id: ObjectId) -> Option<&O> {
        self.nodes.get(&id).map(|n| &n.object)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut O> {
        self.nodes.get_mut(&id).map(|n| &mut n.object)
    }

    fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn reparent(&mut self, id: ObjectId, parent: ObjectId) -> DocumentResult {
        if !self.nodes.contains_key(&id) {
            return Err(DocumentError::NotFound(id));
        }
        if !self.nodes.contains_key(&parent) {
            return Err(DocumentError::ParentNotFound(parent));
        }
        if id == parent || self.is_ancestor(id, parent) {
            return Err(DocumentError::Cycle { child: id, parent });
        }
        if self.parent(id) == Some(parent) {
            return Ok(());
        }
        self.unlink(id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Ok(())
    }

    fn add_object_to_world(
        &mut self,
        object: DetachedObject<O>,
        parent: ObjectId,
    ) -> DocumentResult {
        if !self.nodes.contains_key(&parent) {
            return Err(DocumentError::ParentNotFound(parent));
        }
        if let Some(present) = contains_id(&object, &self.nodes) {
            return Err(DocumentError::AlreadyPresent(present));
        }
        log::trace!(
            "adding {} ({} objects) under {parent}",
            object.id(),
            object.object_count()
        );
        self.insert_subtree(object, parent);
        Ok(())
    }

    fn remove_object_from_world(
        &mut self,
        id: ObjectId,
        remove_children: bool,
    ) -> DocumentResult<DetachedObject<O>> {
        if id == self.root {
            return Err(DocumentError::RootRemoval(id));
        }
        if !self.nodes.contains_key(&id) {
            return Err(DocumentError::NotFound(id));
        }

        let announced: Vec<ObjectId> = if remove_children {
            std::iter::once(id).chain(self.descendants(id)).collect()
        } else {
            vec![id]
        };
        for removed in &announced {
            self.notify_dependents(*removed, Notification::Removed);
        }

        self.unlink(id);
        let detached = self.take_subtree(id).ok_or(DocumentError::NotFound(id))?;
        log::trace!(
            "removed {id} ({} objects) from the world",
            detached.object_count()
        );
        Ok(detached)
    }

    fn notify_dependents(&mut self, id: ObjectId, notification: Notification) {
        let Some(dependents) = self.dependents.get(&id).cloned() else {
            return;
        };
        for dependent in dependents {
            if let Some(node) = self.nodes.get_mut(&dependent) {
                node.object.on_notify_dependent(id, notification);
            }
        }
    }
}
