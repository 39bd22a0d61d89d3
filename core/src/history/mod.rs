//! Transactional undo/redo for map documents.
//!
//! Editing code brackets every user operation with
//! [`DocumentHistory::mark_undo_position`] and records what it is about to
//! touch before touching it:
//!
//! - [`keep`](DocumentHistory::keep) before mutating an object's value or
//!   parent link,
//! - [`keep_new`](DocumentHistory::keep_new) after adding an object,
//! - [`keep_for_destruction`](DocumentHistory::keep_for_destruction) with the
//!   value returned by removing an object.
//!
//! The recorded [`TrackEntry`] values are grouped into [`HistoryTrack`]s.
//! Undoing a track replays its entries newest first and records their
//! inverses on the opposite [`History`], which is what makes redo work.
//!
//! # Pausing
//!
//! While a history is paused (see [`History::pause`]) every `keep*` call is a
//! no-op. Replaying a track pauses the replaying stack, so the document's own
//! reactions to restored values are not recorded into the track being
//! consumed.
//!
//! # Limits
//!
//! Each stack keeps at most [`HistoryConfig::undo_levels`] tracks and,
//! optionally, at most [`HistoryConfig::max_bytes`] of snapshots. The oldest
//! tracks are evicted first; objects they owned are dropped with them.

mod config;
mod entry;
mod pair;
mod registry;
mod stack;
mod track;

pub use config::{DEFAULT_UNDO_LEVELS, HistoryConfig};
pub use entry::{EntryKind, KeptCopy, TrackEntry};
pub use pair::DocumentHistory;
pub use registry::{DocumentId, HistoryRegistry};
pub use stack::{History, HistoryRole};
pub use track::{HistoryTrack, TrackId};
