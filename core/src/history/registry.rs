//! Per-document histories and the active document.

use std::collections::HashMap;
use std::fmt;

use crate::document::MapObject;

use super::config::HistoryConfig;
use super::pair::DocumentHistory;

/// Handle of an open document in a [`HistoryRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u32);

impl DocumentId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document {}", self.0)
    }
}

/// Owns the history of every open document and tracks which one is active.
///
/// [`active_mut`](Self::active_mut) always returns a history: when no
/// document is active it hands out a null pair that ignores every call, so
/// tools do not need to special-case "nothing open".
pub struct HistoryRegistry<O: MapObject> {
    documents: HashMap<DocumentId, DocumentHistory<O>>,
    active: Option<DocumentId>,
    null: DocumentHistory<O>,
    next_id: u32,
}

impl<O: MapObject> Default for HistoryRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: MapObject> HistoryRegistry<O> {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            active: None,
            null: DocumentHistory::null(),
            next_id: 1,
        }
    }

    /// Registers a new document with an empty history.
    pub fn open_document(&mut self, config: HistoryConfig) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id += 1;
        self.documents.insert(id, DocumentHistory::new(config));
        log::debug!("opened history for {id}");
        id
    }

    /// Drops a document's history. If it was active, no document is active
    /// afterwards.
    pub fn close_document(&mut self, id: DocumentId) -> bool {
        let Some(mut history) = self.documents.remove(&id) else {
            log::warn!("close_document: unknown {id}");
            return false;
        };
        history.purge();
        if self.active == Some(id) {
            self.active = None;
        }
        log::debug!("closed history for {id}");
        true
    }

    /// Switches the active document. Returns `false` (and leaves the active
    /// document unchanged) if `id` is not open.
    pub fn set_active(&mut self, id: Option<DocumentId>) -> bool {
        if let Some(id) = id
            && !self.documents.contains_key(&id)
        {
            log::warn!("set_active: unknown {id}");
            return false;
        }
        self.active = id;
        true
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    /// The active document's history, or the null history.
    pub fn active(&self) -> &DocumentHistory<O> {
        self.active
            .and_then(|id| self.documents.get(&id))
            .unwrap_or(&self.null)
    }

    pub fn active_mut(&mut self) -> &mut DocumentHistory<O> {
        match self.active.and_then(|id| self.documents.get_mut(&id)) {
            Some(history) => history,
            None => &mut self.null,
        }
    }

    pub fn get(&self, id: DocumentId) -> Option<&DocumentHistory<O>> {
        self.documents.get(&id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut DocumentHistory<O>> {
        self.documents.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<O: MapObject> fmt::Debug for HistoryRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryRegistry")
            .field("documents", &self.documents.len())
            .field("active", &self.active)
            .finish()
    }
}
