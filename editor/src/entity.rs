//! Map entities as edited by the session.

use std::collections::BTreeMap;
use std::fmt;

use hammer_core::{MapObject, Notification, ObjectId};

/// Key holding an entity's name.
pub const TARGETNAME: &str = "targetname";

/// A point or group entity: a class name plus string key/values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEntity {
    pub classname: String,
    pub keyvalues: BTreeMap<String, String>,
    /// Bumped whenever an object this entity depends on changes.
    revision: u32,
}

impl MapEntity {
    pub fn new(classname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            ..Self::default()
        }
    }

    pub fn named(classname: impl Into<String>, name: impl Into<String>) -> Self {
        let mut entity = Self::new(classname);
        entity.set(TARGETNAME, name);
        entity
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.keyvalues.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.keyvalues.insert(key.into(), value.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.get(TARGETNAME)
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }
}

impl MapObject for MapEntity {
    fn duplicate(&self, _update_dependencies: bool) -> Self {
        self.clone()
    }

    fn copy_from(&mut self, source: &Self, update_dependencies: bool) {
        self.classname.clone_from(&source.classname);
        self.keyvalues.clone_from(&source.keyvalues);
        if update_dependencies {
            self.revision += 1;
        }
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.classname.len()
            + self
                .keyvalues
                .iter()
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
    }

    fn on_notify_dependent(&mut self, source: ObjectId, notification: Notification) {
        log::debug!(
            "{} notified of {notification:?} on {source}",
            self.name().unwrap_or(&self.classname)
        );
        self.revision += 1;
    }
}

impl fmt::Display for MapEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.classname)?;
        for (key, value) in &self.keyvalues {
            if key != TARGETNAME {
                write!(f, " {key}=\"{value}\"")?;
            }
        }
        Ok(())
    }
}
