//! # Hammer Core
//!
//! Undo/redo engine for a level editor: the object model the history works
//! against ([`document`]), an arena implementation of it ([`world`]) and the
//! transactional history itself ([`history`]).

pub mod document;
pub mod history;
pub mod profiling;
pub mod world;

pub use document::{
    DetachedObject, Document, DocumentError, DocumentResult, MapObject, Notification, ObjectId,
    Selection,
};
pub use history::{DocumentHistory, History, HistoryConfig, HistoryRegistry};
pub use world::MapWorld;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the library version once the host has installed a logger.
pub fn init() {
    log::info!("Hammer Core v{} initialized", VERSION);
}
