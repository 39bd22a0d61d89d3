//! A map document plus its undo history, driven by script commands.

use std::collections::HashMap;

use hammer_core::history::{DocumentHistory, DocumentId, HistoryRegistry};
use hammer_core::{
    Document, DocumentError, HistoryConfig, MapWorld, Notification, ObjectId, Selection,
};

use crate::config::{EditorError, EditorResult};
use crate::entity::{MapEntity, TARGETNAME};
use crate::script::Command;

/// Name that always refers to the world root.
pub const WORLD: &str = "world";

/// One open map and everything needed to edit it.
///
/// Every mutating command is one undo transaction, named after the command
/// and opened with the current selection. Commands are validated before the
/// transaction opens, so a rejected command leaves the world and both
/// stacks untouched.
pub struct Session {
    world: MapWorld<MapEntity>,
    registry: HistoryRegistry<MapEntity>,
    document: DocumentId,
    names: HashMap<String, ObjectId>,
    selection: Selection,
    output: Vec<String>,
}

impl Session {
    pub fn new(config: HistoryConfig) -> Self {
        let mut registry = HistoryRegistry::new();
        let document = registry.open_document(config);
        registry.set_active(Some(document));
        Self {
            world: MapWorld::new(MapEntity::named("worldspawn", WORLD)),
            registry,
            document,
            names: HashMap::new(),
            selection: Selection::new(),
            output: Vec::new(),
        }
    }

    pub fn world(&self) -> &MapWorld<MapEntity> {
        &self.world
    }

    pub fn history(&self) -> &DocumentHistory<MapEntity> {
        self.registry.active()
    }

    fn history_mut(&mut self) -> &mut DocumentHistory<MapEntity> {
        self.registry.active_mut()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Lines produced by `print`, `history`, `undo` and `redo`.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Looks up a live object by name.
    pub fn resolve(&self, name: &str) -> EditorResult<ObjectId> {
        if name == WORLD {
            return Ok(self.world.root());
        }
        self.names
            .get(name)
            .copied()
            .filter(|id| self.world.contains(*id))
            .ok_or_else(|| EditorError::UnknownObject(name.to_owned()))
    }

    /// Runs `commands` in order, stopping at the first failure.
    pub fn run(&mut self, commands: &[(usize, Command)]) -> EditorResult {
        for (line, command) in commands {
            self.execute(command).map_err(|e| EditorError::Script {
                line: *line,
                source: Box::new(e),
            })?;
        }
        log::info!(
            "session finished: {} objects, {} bytes of history",
            self.world.len(),
            self.history().size_bytes()
        );
        Ok(())
    }

    pub fn execute(&mut self, command: &Command) -> EditorResult {
        log::debug!("{command:?}");
        match command {
            Command::Create {
                name,
                classname,
                parent,
            } => self.create(name, classname, parent.as_deref()),
            Command::Set { name, key, value } => self.set(name, key, value),
            Command::Move { name, parent } => self.move_to(name, parent),
            Command::Delete { name } => self.delete(name),
            Command::Group { name, members } => self.group(name, members),
            Command::Select { names } => {
                self.selection = names
                    .iter()
                    .map(|name| self.resolve(name))
                    .collect::<EditorResult<Selection>>()?;
                Ok(())
            }
            Command::Undo => {
                self.undo();
                Ok(())
            }
            Command::Redo => {
                self.redo();
                Ok(())
            }
            Command::Print => {
                self.print();
                Ok(())
            }
            Command::History => {
                self.print_history();
                Ok(())
            }
        }
    }

    fn begin(&mut self, name: &str) {
        let selection = self.selection.clone();
        self.history_mut()
            .mark_undo_position(Some(&selection), Some(name));
    }

    fn create(&mut self, name: &str, classname: &str, parent: Option<&str>) -> EditorResult {
        if name == WORLD || self.names.contains_key(name) {
            return Err(EditorError::DuplicateName(name.to_owned()));
        }
        let parent = self.resolve(parent.unwrap_or(WORLD))?;

        self.begin(&format!("Create {classname}"));
        let id = self
            .world
            .insert(MapEntity::named(classname, name), parent)?;
        self.registry.active_mut().keep_new(&self.world, id, true);

        self.names.insert(name.to_owned(), id);
        self.selection = Selection::from_iter([id]);
        Ok(())
    }

    fn set(&mut self, name: &str, key: &str, value: &str) -> EditorResult {
        let id = self.resolve(name)?;
        if key == TARGETNAME {
            return Err(EditorError::ReadOnlyKey(key.to_owned()));
        }

        self.begin(&format!("Set {key}"));
        self.registry.active_mut().keep_no_children(&self.world, id);
        if let Some(entity) = self.world.object_mut(id) {
            entity.set(key, value);
        }
        self.world.notify_dependents(id, Notification::Changed);
        Ok(())
    }

    fn move_to(&mut self, name: &str, parent: &str) -> EditorResult {
        let id = self.resolve(name)?;
        let parent = self.resolve(parent)?;
        if id == parent || self.world.descendants(id).any(|d| d == parent) {
            return Err(DocumentError::Cycle { child: id, parent }.into());
        }

        self.begin("Move");
        self.registry.active_mut().keep(&self.world, id);
        self.world.reparent(id, parent)?;
        Ok(())
    }

    fn delete(&mut self, name: &str) -> EditorResult {
        let id = self.resolve(name)?;
        if id == self.world.root() {
            return Err(DocumentError::RootRemoval(id).into());
        }

        self.begin("Delete");
        let detached = self.world.remove_object_from_world(id, true)?;
        self.history_mut().keep_for_destruction(detached);

        let world = &self.world;
        self.selection.retain(|id| world.contains(id));
        Ok(())
    }

    fn group(&mut self, name: &str, members: &[String]) -> EditorResult {
        if name == WORLD || self.names.contains_key(name) {
            return Err(EditorError::DuplicateName(name.to_owned()));
        }
        let root = self.world.root();
        let mut ids: Vec<ObjectId> = Vec::with_capacity(members.len());
        for member in members {
            let id = self.resolve(member)?;
            if id == root {
                return Err(EditorError::NotGroupable(member.clone()));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let members = ids;

        self.begin("Group");
        let group = self
            .world
            .insert(MapEntity::named("func_group", name), root)?;
        self.registry.active_mut().keep_new(&self.world, group, false);
        for member in &members {
            self.registry.active_mut().keep(&self.world, *member);
            self.world.reparent(*member, group)?;
            self.world.add_dependent(*member, group);
        }

        self.names.insert(name.to_owned(), group);
        self.selection = Selection::from_iter([group]);
        Ok(())
    }

    fn undo(&mut self) {
        let name = self.history().undo_name().map(str::to_owned);
        match self.registry.active_mut().undo(&mut self.world) {
            Some(selection) => {
                self.selection = selection;
                self.output
                    .push(format!("undo {}", name.unwrap_or_default()));
            }
            None => self.output.push("nothing to undo".into()),
        }
    }

    fn redo(&mut self) {
        let name = self.history().redo_name().map(str::to_owned);
        match self.registry.active_mut().redo(&mut self.world) {
            Some(selection) => {
                self.selection = selection;
                self.output
                    .push(format!("redo {}", name.unwrap_or_default()));
            }
            None => self.output.push("nothing to redo".into()),
        }
    }

    fn print(&mut self) {
        let mut lines = Vec::new();
        self.print_tree(self.world.root(), 0, &mut lines);
        self.output.extend(lines);
    }

    fn print_tree(&self, id: ObjectId, depth: usize, lines: &mut Vec<String>) {
        let Some(entity) = self.world.object(id) else {
            return;
        };
        let name = entity.name().map_or_else(|| id.to_string(), str::to_owned);
        let marker = if self.selection.contains(id) { "*" } else { "" };
        lines.push(format!("{}{name}{marker}: {entity}", "  ".repeat(depth)));
        for child in self.world.children(id) {
            self.print_tree(*child, depth + 1, lines);
        }
    }

    fn print_history(&mut self) {
        let history = self.registry.active();
        let undo: Vec<&str> = history.undo_stack().track_names().collect();
        let redo: Vec<&str> = history.redo_stack().track_names().collect();
        let lines = [
            format!("undo: [{}]", undo.join(", ")),
            format!("redo: [{}]", redo.join(", ")),
        ];
        self.output.extend(lines);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.registry.close_document(self.document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_script;

    fn run(source: &str) -> Session {
        let mut session = Session::new(HistoryConfig::default());
        let commands = parse_script(source).unwrap();
        session.run(&commands).unwrap();
        session
    }

    fn value(session: &Session, name: &str, key: &str) -> Option<String> {
        let id = session.resolve(name).ok()?;
        session
            .world()
            .object(id)
            .and_then(|e| e.get(key).map(str::to_owned))
    }

    #[test]
    fn set_undo_redo() {
        let mut session = run("create lamp light\nset lamp style 1\nset lamp style 2\n");
        assert_eq!(value(&session, "lamp", "style").as_deref(), Some("2"));

        session.execute(&Command::Undo).unwrap();
        assert_eq!(value(&session, "lamp", "style").as_deref(), Some("1"));

        session.execute(&Command::Redo).unwrap();
        assert_eq!(value(&session, "lamp", "style").as_deref(), Some("2"));
        assert_eq!(session.output(), ["undo Set style", "redo Set style"]);
    }

    #[test]
    fn undo_create_then_redo() {
        let session = run("create lamp light\nundo\n");
        assert!(session.resolve("lamp").is_err());

        let session = run("create lamp light\nundo\nredo\n");
        let lamp = session.resolve("lamp").unwrap();
        assert_eq!(session.world().parent(lamp), Some(session.world().root()));
    }

    #[test]
    fn delete_restores_children() {
        let session = run(
            "create room info_target\n\
             create lamp light room\n\
             delete room\n\
             undo\n",
        );
        let room = session.resolve("room").unwrap();
        let lamp = session.resolve("lamp").unwrap();
        assert_eq!(session.world().parent(lamp), Some(room));
    }

    #[test]
    fn group_is_one_transaction() {
        let mut session = run(
            "create a info_target\n\
             create b info_target\n\
             group pair a b\n",
        );
        let pair = session.resolve("pair").unwrap();
        assert_eq!(session.world().children(pair).len(), 2);

        session.execute(&Command::Undo).unwrap();
        let root = session.world().root();
        assert!(session.resolve("pair").is_err());
        for name in ["a", "b"] {
            let id = session.resolve(name).unwrap();
            assert_eq!(session.world().parent(id), Some(root));
        }
    }

    #[test]
    fn undo_restores_selection() {
        let mut session = run(
            "create a info_target\n\
             create b info_target\n\
             select a b\n\
             set a style 1\n\
             select\n",
        );
        assert!(session.selection().is_empty());

        session.execute(&Command::Undo).unwrap();
        let selected: Vec<ObjectId> = session.selection().iter().collect();
        let expected = vec![session.resolve("a").unwrap(), session.resolve("b").unwrap()];
        assert_eq!(selected, expected);
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut session = run("create a info_target\nset a style 1\nundo\n");
        assert!(session.history().can_redo());
        session
            .execute(&Command::Set {
                name: "a".into(),
                key: "style".into(),
                value: "3".into(),
            })
            .unwrap();
        assert!(!session.history().can_redo());
    }

    #[test]
    fn undo_levels_bound_history() {
        let mut session = Session::new(HistoryConfig::with_undo_levels(2));
        let commands = parse_script(
            "create a info_target\n\
             set a style 1\n\
             set a style 2\n\
             set a style 3\n\
             undo\nundo\nundo\n",
        )
        .unwrap();
        session.run(&commands).unwrap();

        assert_eq!(
            session.output().last().map(String::as_str),
            Some("nothing to undo")
        );
        assert_eq!(value(&session, "a", "style").as_deref(), Some("1"));
    }

    #[test]
    fn print_shows_tree() {
        let mut session = run(
            "create room info_target\n\
             create lamp light room\n\
             set lamp style 2\n\
             print\n",
        );
        assert_eq!(
            session.take_output(),
            [
                "world: worldspawn",
                "  room: info_target",
                "    lamp*: light style=\"2\"",
            ]
        );
    }

    #[test]
    fn history_lists_track_names() {
        let session = run("create a info_target\nmove a world\nundo\nhistory\n");
        assert_eq!(
            session.output(),
            ["undo Move", "undo: [Create info_target]", "redo: [Move]"]
        );
    }

    #[test]
    fn errors_carry_line_numbers() {
        let mut session = Session::new(HistoryConfig::default());
        let commands = parse_script("create a info_target\nset ghost style 1\n").unwrap();
        match session.run(&commands) {
            Err(EditorError::Script { line, source }) => {
                assert_eq!(line, 2);
                assert!(matches!(*source, EditorError::UnknownObject(_)));
            }
            other => panic!("expected script error, got {other:?}"),
        }
    }

    #[test]
    fn targetname_cannot_be_set() {
        let mut session = run("create a info_target\n");
        let err = session
            .execute(&Command::Set {
                name: "a".into(),
                key: TARGETNAME.into(),
                value: "b".into(),
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::ReadOnlyKey(_)));
        assert_eq!(session.history().undo_name(), Some("Create info_target"));
    }

    #[test]
    fn rejected_group_leaves_history_untouched() {
        let mut session = run("create a info_target\nset a style 1\nundo\n");
        let objects = session.world().len();

        let err = session
            .execute(&Command::Group {
                name: "g".into(),
                members: vec![WORLD.into()],
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::NotGroupable(_)));

        assert_eq!(session.world().len(), objects);
        assert!(session.resolve("g").is_err());
        assert!(session.history().can_redo());
        assert_eq!(session.history().undo_name(), Some("Create info_target"));
        assert_eq!(session.history().redo_name(), Some("Set style"));
    }

    #[test]
    fn rejected_move_leaves_history_untouched() {
        let mut session = run(
            "create room info_target\n\
             create lamp light room\n\
             set lamp style 1\n\
             undo\n",
        );

        let err = session
            .execute(&Command::Move {
                name: "room".into(),
                parent: "lamp".into(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::Document(DocumentError::Cycle { .. })
        ));

        let room = session.resolve("room").unwrap();
        assert_eq!(session.world().parent(room), Some(session.world().root()));
        assert!(session.history().can_redo());
        assert_eq!(session.history().undo_name(), Some("Create light"));
    }

    #[test]
    fn world_cannot_be_deleted() {
        let mut session = run("create a info_target\nset a style 1\nundo\n");
        let err = session
            .execute(&Command::Delete { name: WORLD.into() })
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::Document(DocumentError::RootRemoval(_))
        ));
        assert!(session.history().can_redo());
    }

    #[test]
    fn group_ignores_repeated_members() {
        let mut session = run("create a info_target\ngroup g a a\n");
        let g = session.resolve("g").unwrap();
        assert_eq!(session.world().children(g).len(), 1);

        session.execute(&Command::Undo).unwrap();
        let a = session.resolve("a").unwrap();
        assert_eq!(session.world().parent(a), Some(session.world().root()));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut session = run("create a info_target\n");
        let err = session
            .execute(&Command::Create {
                name: "a".into(),
                classname: "light".into(),
                parent: None,
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::DuplicateName(_)));
    }
}
