//! End-to-end undo/redo scenarios against a [`MapWorld`].

use std::rc::Rc;

use hammer_core::document::{Document, MapObject, Notification, ObjectId};
use hammer_core::history::{DocumentHistory, EntryKind, HistoryConfig};
use hammer_core::world::MapWorld;

#[derive(Debug, Clone, Default)]
struct Thing {
    value: i32,
    /// Shared with the test to observe when the history lets go of an object.
    token: Rc<()>,
    refreshed: u32,
}

impl Thing {
    fn new(value: i32) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

impl MapObject for Thing {
    fn duplicate(&self, _update_dependencies: bool) -> Self {
        Self {
            value: self.value,
            token: Rc::new(()),
            refreshed: 0,
        }
    }

    fn copy_from(&mut self, source: &Self, _update_dependencies: bool) {
        self.value = source.value;
    }

    fn on_notify_dependent(&mut self, _source: ObjectId, notification: Notification) {
        if notification == Notification::Changed {
            self.refreshed += 1;
        }
    }
}

fn new_world() -> MapWorld<Thing> {
    MapWorld::new(Thing::default())
}

fn history() -> DocumentHistory<Thing> {
    DocumentHistory::new(HistoryConfig::default())
}

#[test]
fn value_change_round_trip() {
    let mut world = new_world();
    let root = world.root();
    let x = world.insert(Thing::new(1), root).unwrap();
    let mut history = history();

    history.keep(&world, x);
    world.object_mut(x).unwrap().value = 2;
    history.mark_undo_position(None, Some("Set value"));

    history.undo(&mut world).unwrap();
    assert_eq!(world.object(x).unwrap().value, 1);

    history.redo(&mut world).unwrap();
    assert_eq!(world.object(x).unwrap().value, 2);
}

#[test]
fn created_object_round_trip() {
    let mut world = new_world();
    let root = world.root();
    let group = world.insert(Thing::new(0), root).unwrap();
    let mut history = history();

    history.mark_undo_position(None, Some("Create"));
    let y = world.insert(Thing::new(7), group).unwrap();
    history.keep_new(&world, y, true);
    history.mark_undo_position(None, None);

    history.undo(&mut world).unwrap();
    assert!(!world.contains(y));
    assert!(!world.children(group).contains(&y));

    history.redo(&mut world).unwrap();
    assert_eq!(world.parent(y), Some(group));
    assert_eq!(world.object(y).unwrap().value, 7);
}

#[test]
fn created_subtree_round_trip() {
    let mut world = new_world();
    let root = world.root();
    let mut history = history();

    history.mark_undo_position(None, Some("Create group"));
    let group = world.insert(Thing::new(0), root).unwrap();
    let a = world.insert(Thing::new(1), group).unwrap();
    let b = world.insert(Thing::new(2), group).unwrap();
    history.keep_new(&world, group, true);

    history.undo(&mut world).unwrap();
    for id in [group, a, b] {
        assert!(!world.contains(id));
    }

    history.redo(&mut world).unwrap();
    assert_eq!(world.children(group), &[a, b]);
    assert_eq!(world.parent(group), Some(root));
}

#[test]
fn deleted_subtree_round_trip() {
    let mut world = new_world();
    let root = world.root();
    let group = world.insert(Thing::new(0), root).unwrap();
    let child = world.insert(Thing::new(3), group).unwrap();
    let mut history = history();

    history.mark_undo_position(None, Some("Delete"));
    let detached = world.remove_object_from_world(group, true).unwrap();
    history.keep_for_destruction(detached);
    assert!(!world.contains(child));

    history.undo(&mut world).unwrap();
    assert_eq!(world.parent(child), Some(group));
    assert_eq!(world.object(child).unwrap().value, 3);

    history.redo(&mut world).unwrap();
    assert!(!world.contains(group));
    assert!(!world.contains(child));
}

#[test]
fn keep_twice_records_one_entry() {
    let mut world = new_world();
    let root = world.root();
    let x = world.insert(Thing::new(1), root).unwrap();
    let mut history = history();

    history.mark_undo_position(None, Some("Drag"));
    history.keep(&world, x);
    world.object_mut(x).unwrap().value = 2;
    history.keep(&world, x);
    world.object_mut(x).unwrap().value = 3;

    let track = history.undo_stack().current_track().unwrap();
    assert_eq!(track.len(), 1);

    // The first snapshot wins.
    history.undo(&mut world);
    assert_eq!(world.object(x).unwrap().value, 1);
}

#[test]
fn keep_after_keep_new_records_nothing() {
    let mut world = new_world();
    let root = world.root();
    let mut history = history();

    history.mark_undo_position(None, Some("Create"));
    let x = world.insert(Thing::new(1), root).unwrap();
    history.keep_new(&world, x, false);
    history.keep(&world, x);

    let track = history.undo_stack().current_track().unwrap();
    let kinds: Vec<EntryKind> = track.entries().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EntryKind::Create]);
}

#[test]
fn depth_bound_releases_deleted_objects() {
    let mut world = new_world();
    let root = world.root();
    let mut history = DocumentHistory::new(HistoryConfig::with_undo_levels(3));

    let doomed = world.insert(Thing::new(0), root).unwrap();
    let token = Rc::clone(&world.object(doomed).unwrap().token);

    history.mark_undo_position(None, Some("Delete"));
    let detached = world.remove_object_from_world(doomed, true).unwrap();
    history.keep_for_destruction(detached);
    assert_eq!(Rc::strong_count(&token), 2);

    let x = world.insert(Thing::new(1), root).unwrap();
    for i in 0..5 {
        history.mark_undo_position(None, Some("Edit"));
        history.keep(&world, x);
        world.object_mut(x).unwrap().value = i;
    }
    history.mark_undo_position(None, None);

    assert_eq!(history.undo_stack().track_count(), 3);
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn new_edit_after_undo_clears_redo() {
    let mut world = new_world();
    let root = world.root();
    let x = world.insert(Thing::new(1), root).unwrap();
    let mut history = history();

    history.mark_undo_position(None, Some("First"));
    history.keep(&world, x);
    world.object_mut(x).unwrap().value = 2;
    history.undo(&mut world);
    assert!(history.can_redo());

    history.mark_undo_position(None, Some("Second"));
    assert_eq!(history.redo_stack().track_count(), 0);
    assert!(!history.can_redo());
}

#[test]
fn nested_pause_suppresses_recording() {
    let mut world = new_world();
    let root = world.root();
    let x = world.insert(Thing::new(1), root).unwrap();
    let mut history = history();

    history.pause();
    history.pause();
    history.keep(&world, x);
    history.resume();
    history.keep(&world, x);
    assert!(!history.can_undo());

    history.resume();
    history.keep(&world, x);
    assert!(history.can_undo());
}

#[test]
fn entries_are_reversed_newest_first() {
    let mut world = new_world();
    let root = world.root();
    let parent = world.insert(Thing::new(1), root).unwrap();
    let child = world.insert(Thing::new(2), parent).unwrap();
    let mut history = history();

    // Recorded as [delete child, delete parent]; the parent must be back
    // before the child can be re-attached to it.
    history.mark_undo_position(None, Some("Delete"));
    let detached = world.remove_object_from_world(child, true).unwrap();
    history.keep_for_destruction(detached);
    let detached = world.remove_object_from_world(parent, true).unwrap();
    history.keep_for_destruction(detached);

    history.undo(&mut world).unwrap();
    assert_eq!(world.parent(parent), Some(root));
    assert_eq!(world.parent(child), Some(parent));
}

#[test]
fn moved_object_returns_to_old_parent() {
    let mut world = new_world();
    let root = world.root();
    let a = world.insert(Thing::new(0), root).unwrap();
    let b = world.insert(Thing::new(0), root).unwrap();
    let x = world.insert(Thing::new(1), a).unwrap();
    let mut history = history();

    history.mark_undo_position(None, Some("Move to group"));
    history.keep(&world, x);
    world.reparent(x, b).unwrap();

    history.undo(&mut world).unwrap();
    assert_eq!(world.parent(x), Some(a));

    history.redo(&mut world).unwrap();
    assert_eq!(world.parent(x), Some(b));
}

#[test]
fn undo_notifies_dependents_of_restored_values() {
    let mut world = new_world();
    let root = world.root();
    let source = world.insert(Thing::new(1), root).unwrap();
    let watcher = world.insert(Thing::new(0), root).unwrap();
    world.add_dependent(source, watcher);
    let mut history = history();

    history.mark_undo_position(None, Some("Edit"));
    history.keep(&world, source);
    world.object_mut(source).unwrap().value = 5;

    history.undo(&mut world).unwrap();
    assert_eq!(world.object(watcher).unwrap().refreshed, 1);
}

#[test]
fn grouping_members_kept_before_the_group_exists() {
    let mut world = new_world();
    let root = world.root();
    let folder = world.insert(Thing::new(0), root).unwrap();
    let member = world.insert(Thing::new(4), folder).unwrap();
    let mut history = history();

    // Snapshot first, then create the group and move the member into it.
    history.mark_undo_position(None, Some("Group"));
    history.keep(&world, member);
    let group = world.insert(Thing::new(0), root).unwrap();
    history.keep_new(&world, group, false);
    world.reparent(member, group).unwrap();
    world.object_mut(member).unwrap().value = 5;

    history.undo(&mut world).unwrap();
    assert!(!world.contains(group));
    assert_eq!(world.parent(member), Some(folder));
    assert_eq!(world.object(member).unwrap().value, 4);

    history.redo(&mut world).unwrap();
    assert_eq!(world.parent(group), Some(root));
    assert_eq!(world.parent(member), Some(group));
    assert_eq!(world.object(member).unwrap().value, 5);

    history.undo(&mut world).unwrap();
    assert!(!world.contains(group));
    assert_eq!(world.parent(member), Some(folder));
}

#[test]
fn grouping_nested_members_kept_before_the_group_exists() {
    let mut world = new_world();
    let root = world.root();
    let outer = world.insert(Thing::new(1), root).unwrap();
    let inner = world.insert(Thing::new(2), outer).unwrap();
    let mut history = history();

    history.mark_undo_position(None, Some("Group"));
    history.keep(&world, outer);
    let group = world.insert(Thing::new(0), root).unwrap();
    history.keep_new(&world, group, false);
    world.reparent(outer, group).unwrap();
    world.reparent(inner, group).unwrap();

    history.undo(&mut world).unwrap();
    assert!(!world.contains(group));
    assert_eq!(world.parent(outer), Some(root));
    assert_eq!(world.parent(inner), Some(outer));

    history.redo(&mut world).unwrap();
    assert_eq!(world.children(group), &[outer, inner]);
}
