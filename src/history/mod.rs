//! Undo/redo history over full-document snapshots.
//!
//! The stack is linear: pushing while positioned behind the head discards
//! the redo tail, and pushing past the bound evicts the oldest entry
//! (FIFO) without advancing the index. Every entry carries an explicit
//! [`ChangeClass`] set by the action that produced it: restore logic
//! branches on the tag, never on heuristics like comparing page counts,
//! so reordering pages is still a structural change.
//!
//! A guard flag serializes restore against capture: while a restore is in
//! flight, [`History::push`] is suppressed so re-render side effects can
//! never record recursive snapshots. The guard is cleared by the caller
//! only after all restoration work, including any deferred re-render,
//! has completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EditorError, EditorResult};

/// Default bound on the history stack.
pub const HISTORY_LIMIT: usize = 50;

/// Label recorded by the first snapshot after load/generation, so undo
/// always has a baseline to return to.
pub const INITIAL_LOAD_ACTION: &str = "initial load";

/// How a snapshot's action changed the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeClass {
    /// Page set changed (add/delete/reorder): restore replaces the page
    /// array wholesale and fully re-renders.
    Structural,
    /// Content-only edit: restore swaps page content in place.
    Content,
}

/// One captured undo step.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<S> {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub change_class: ChangeClass,
    pub state: S,
}

/// Bounded linear undo/redo stack.
///
/// Invariant: `-1 <= index < entries.len() as isize`; `index == len - 1`
/// means "at head" (nothing to redo).
#[derive(Debug)]
pub struct History<S> {
    entries: Vec<HistoryEntry<S>>,
    index: isize,
    limit: usize,
    restoring: bool,
}

impl<S: Clone> History<S> {
    /// Creates an empty history with the default bound.
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    /// Creates an empty history with a custom bound.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: -1,
            limit,
            restoring: false,
        }
    }

    /// Captures a snapshot. Returns false (and records nothing) while a
    /// restore is in flight.
    pub fn push(&mut self, action: impl Into<String>, change_class: ChangeClass, state: S) -> bool {
        if self.restoring {
            return false;
        }
        // Discard the redo tail when not at the head.
        self.entries.truncate((self.index + 1) as usize);
        self.entries.push(HistoryEntry {
            action: action.into(),
            timestamp: Utc::now(),
            change_class,
            state,
        });
        if self.entries.len() > self.limit {
            // Ring-buffer behaviour at the bound: evict the oldest entry,
            // the index stays put.
            self.entries.remove(0);
        } else {
            self.index += 1;
        }
        debug!(
            action = %self.entries.last().map(|e| e.action.as_str()).unwrap_or(""),
            index = self.index,
            len = self.entries.len(),
            "history push"
        );
        true
    }

    /// Steps back one entry and returns it for the caller to restore.
    pub fn undo(&mut self) -> EditorResult<&HistoryEntry<S>> {
        if self.index <= 0 {
            return Err(EditorError::NothingToUndo);
        }
        self.index -= 1;
        debug!(index = self.index, "history undo");
        Ok(&self.entries[self.index as usize])
    }

    /// Steps forward one entry and returns it for the caller to restore.
    pub fn redo(&mut self) -> EditorResult<&HistoryEntry<S>> {
        if self.index + 1 >= self.entries.len() as isize {
            return Err(EditorError::NothingToRedo);
        }
        self.index += 1;
        debug!(index = self.index, "history redo");
        Ok(&self.entries[self.index as usize])
    }

    /// The entry the editor currently sits on.
    pub fn current(&self) -> Option<&HistoryEntry<S>> {
        if self.index < 0 {
            None
        } else {
            self.entries.get(self.index as usize)
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len() as isize
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> isize {
        self.index
    }

    /// Marks a restore in flight, suppressing capture.
    pub fn begin_restore(&mut self) {
        self.restoring = true;
    }

    /// Clears the restore guard. Call only after all restoration work,
    /// including deferred re-renders, is done.
    pub fn end_restore(&mut self) {
        self.restoring = false;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Action labels oldest-first, mostly for diagnostics and tests.
    pub fn actions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.action.as_str()).collect()
    }
}

impl<S: Clone> Default for History<S> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn push_n(history: &mut History<u32>, n: u32) {
        for i in 0..n {
            history.push(format!("edit {i}"), ChangeClass::Content, i);
        }
    }

    #[test]
    fn test_bound_evicts_oldest_first() {
        let mut history = History::with_limit(3);
        push_n(&mut history, 4);

        assert_eq!(history.len(), 3);
        assert_eq!(history.actions(), vec!["edit 1", "edit 2", "edit 3"]);
        // Index did not advance on the evicting push: still at the head.
        assert_eq!(history.index(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        history.push(INITIAL_LOAD_ACTION, ChangeClass::Structural, 0u32);
        push_n(&mut history, 3);

        assert_eq!(history.undo().unwrap().state, 1);
        assert_eq!(history.undo().unwrap().state, 0);
        assert_eq!(history.redo().unwrap().state, 1);
        assert_eq!(history.redo().unwrap().state, 2);
    }

    #[test]
    fn test_undo_stops_at_baseline() {
        let mut history = History::new();
        history.push(INITIAL_LOAD_ACTION, ChangeClass::Structural, 0u32);
        assert!(matches!(
            history.undo().unwrap_err(),
            EditorError::NothingToUndo
        ));
    }

    #[test]
    fn test_redo_truncation_after_new_action() {
        let mut history = History::new();
        history.push(INITIAL_LOAD_ACTION, ChangeClass::Structural, 0u32);
        push_n(&mut history, 2);

        history.undo().unwrap();
        assert!(history.can_redo());

        history.push("new branch", ChangeClass::Content, 99);
        assert!(!history.can_redo());
        assert!(matches!(
            history.redo().unwrap_err(),
            EditorError::NothingToRedo
        ));
        assert_eq!(history.current().unwrap().state, 99);
    }

    #[test]
    fn test_restore_guard_suppresses_push() {
        let mut history = History::new();
        history.begin_restore();
        assert!(!history.push("ghost", ChangeClass::Content, 1u32));
        assert!(history.is_empty());
        history.end_restore();
        assert!(history.push("real", ChangeClass::Content, 1));
    }

    #[test]
    fn test_index_invariant_holds() {
        let mut history = History::with_limit(5);
        assert_eq!(history.index(), -1);
        push_n(&mut history, 12);
        assert!(history.index() >= -1);
        assert!(history.index() < history.len() as isize);
        while history.can_undo() {
            history.undo().unwrap();
        }
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_change_class_is_carried() {
        let mut history = History::new();
        history.push("add page", ChangeClass::Structural, 0u32);
        history.push("edit text", ChangeClass::Content, 1);
        history.undo().unwrap();
        assert_eq!(
            history.current().unwrap().change_class,
            ChangeClass::Structural
        );
    }
}
