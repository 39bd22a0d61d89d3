//! History limits.

use serde::{Deserialize, Serialize};

/// Default number of undo levels kept per document.
pub const DEFAULT_UNDO_LEVELS: usize = 50;

/// Limits applied to one undo or redo stack.
///
/// Deserializable so it can live in an editor config file:
///
/// ```toml
/// [history]
/// undo_levels = 100
/// max_bytes = 67108864
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of tracks kept, including the open one.
    ///
    /// An open track without entries still takes a level, so right after
    /// [`mark_undo_position`](super::History::mark_undo_position) only
    /// `undo_levels - 1` transactions can be undone.
    pub undo_levels: usize,
    /// Maximum accumulated size of closed tracks in bytes (0 = unlimited).
    pub max_bytes: usize,
    /// When `false`, the history starts inactive and records nothing.
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            undo_levels: DEFAULT_UNDO_LEVELS,
            max_bytes: 0,
            enabled: true,
        }
    }
}

impl HistoryConfig {
    /// Creates a config with the given number of undo levels.
    #[must_use]
    pub fn with_undo_levels(undo_levels: usize) -> Self {
        Self {
            undo_levels,
            ..Self::default()
        }
    }

    /// Sets the memory budget.
    #[must_use]
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Create unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            undo_levels: usize::MAX,
            max_bytes: 0,
            enabled: true,
        }
    }
}
