//! Operation journal for undo/redo
//!
//! Every primitive mutation of the collection is journaled as an
//! [`Operation`] carrying enough data to apply it in either direction.
//! Operations recorded between [`UndoEngine::begin`] and the matching
//! [`UndoEngine::end`] form one [`UndoUnit`]; nested scopes fold into the
//! outermost one. Units are kept in a linear list with a cursor separating
//! the applied prefix from the redoable suffix.

use super::errors::{EditorError, Result};
use std::collections::VecDeque;
use subline_core::EventRecord;
use tracing::{debug, trace};

/// One reversible collection mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// A record was inserted at `index`
    Insert { index: usize, record: EventRecord },
    /// `records` were removed starting at `index`
    Remove {
        index: usize,
        records: Vec<EventRecord>,
    },
    /// The record at `index` changed from `before` to `after`
    Update {
        index: usize,
        before: EventRecord,
        after: EventRecord,
    },
}

impl Operation {
    /// Approximate heap footprint, used for history statistics
    pub fn memory_usage(&self) -> usize {
        fn record_size(record: &EventRecord) -> usize {
            core::mem::size_of::<EventRecord>()
                + record.style.len()
                + record.actor.len()
                + record.text.len()
                + record.note.len()
        }

        core::mem::size_of::<Self>()
            + match self {
                Self::Insert { record, .. } => record_size(record),
                Self::Remove { records, .. } => records.iter().map(record_size).sum(),
                Self::Update { before, after, .. } => record_size(before) + record_size(after),
            }
    }
}

/// A group of operations undone and redone together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoUnit {
    /// Description of the outermost scope that produced this unit
    pub description: String,

    /// Operations in the order they were applied
    pub operations: Vec<Operation>,

    /// Selection when the outermost scope opened
    pub selection_before: Vec<usize>,

    /// Selection when the outermost scope closed
    pub selection_after: Vec<usize>,
}

impl UndoUnit {
    fn new(description: String, selection_before: Vec<usize>) -> Self {
        Self {
            description,
            operations: Vec::new(),
            selection_before,
            selection_after: Vec::new(),
        }
    }

    /// Approximate heap footprint
    pub fn memory_usage(&self) -> usize {
        self.description.len()
            + self.operations.iter().map(Operation::memory_usage).sum::<usize>()
            + (self.selection_before.len() + self.selection_after.len())
                * core::mem::size_of::<usize>()
    }
}

/// Configuration for history retention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoConfig {
    /// Maximum number of units kept; the oldest are discarded first (0 = unlimited)
    pub max_units: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { max_units: 1000 }
    }
}

/// Linear undo history with a save-point marker
#[derive(Debug)]
pub struct UndoEngine {
    config: UndoConfig,

    /// Committed units, oldest first
    units: VecDeque<UndoUnit>,

    /// Number of applied units; everything after it is redoable
    cursor: usize,

    /// Cursor value at the last save, `None` once that state became unreachable
    save_point: Option<usize>,

    /// Nesting depth of open scopes
    depth: usize,

    /// Unit being collected while a scope is open
    pending: Option<UndoUnit>,
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoEngine {
    /// Create a new engine with default configuration
    pub fn new() -> Self {
        Self::with_config(UndoConfig::default())
    }

    /// Create a new engine with custom configuration
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            config,
            units: VecDeque::new(),
            cursor: 0,
            save_point: Some(0),
            depth: 0,
            pending: None,
        }
    }

    pub fn config(&self) -> UndoConfig {
        self.config
    }

    /// Change retention; applies immediately
    pub fn set_config(&mut self, config: UndoConfig) {
        self.config = config;
        self.enforce_limits();
    }

    /// Open a scope; only the outermost description and selection are kept
    pub fn begin(&mut self, description: &str, selection: &[usize]) {
        self.depth += 1;
        if self.depth == 1 {
            self.pending = Some(UndoUnit::new(description.to_string(), selection.to_vec()));
        }
        trace!(depth = self.depth, description, "history scope opened");
    }

    /// Journal one operation into the open scope
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::HistoryError`] when no scope is open.
    pub fn record(&mut self, operation: Operation) -> Result<()> {
        match self.pending.as_mut() {
            Some(unit) => {
                unit.operations.push(operation);
                Ok(())
            }
            None => Err(EditorError::history("operation recorded outside of a scope")),
        }
    }

    /// Close a scope; the outermost close commits the collected unit
    ///
    /// Returns whether a unit was committed. Scopes without collection
    /// operations leave no unit behind.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::HistoryError`] when no scope is open.
    pub fn end(&mut self, selection: &[usize]) -> Result<bool> {
        if self.depth == 0 {
            return Err(EditorError::history("scope closed without being opened"));
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(false);
        }

        let Some(mut unit) = self.pending.take() else {
            return Ok(false);
        };
        if unit.operations.is_empty() {
            trace!(description = %unit.description, "discarding empty history scope");
            return Ok(false);
        }
        unit.selection_after = selection.to_vec();
        self.commit(unit);
        Ok(true)
    }

    /// Whether a scope is currently open
    pub fn in_scope(&self) -> bool {
        self.depth > 0
    }

    fn commit(&mut self, unit: UndoUnit) {
        // A new edit discards the redoable suffix
        self.units.truncate(self.cursor);
        if matches!(self.save_point, Some(point) if point > self.cursor) {
            self.save_point = None;
        }

        debug!(
            description = %unit.description,
            operations = unit.operations.len(),
            "history unit committed"
        );
        self.units.push_back(unit);
        self.cursor += 1;
        self.enforce_limits();
    }

    fn enforce_limits(&mut self) {
        if self.config.max_units == 0 {
            return;
        }
        while self.units.len() > self.config.max_units {
            self.units.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
            self.save_point = match self.save_point {
                Some(0) | None => None,
                Some(point) => Some(point - 1),
            };
        }
    }

    pub fn has_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn has_redo(&self) -> bool {
        self.cursor < self.units.len()
    }

    /// Move the cursor back and return the unit to revert
    pub fn step_back(&mut self) -> Option<&UndoUnit> {
        if !self.has_undo() {
            return None;
        }
        self.cursor -= 1;
        self.units.get(self.cursor)
    }

    /// Move the cursor forward and return the unit to reapply
    pub fn step_forward(&mut self) -> Option<&UndoUnit> {
        if !self.has_redo() {
            return None;
        }
        self.cursor += 1;
        self.units.get(self.cursor - 1)
    }

    /// Description of the unit [`step_back`](Self::step_back) would revert
    pub fn next_undo_description(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|index| self.units.get(index))
            .map(|unit| unit.description.as_str())
    }

    /// Description of the unit [`step_forward`](Self::step_forward) would reapply
    pub fn next_redo_description(&self) -> Option<&str> {
        self.units
            .get(self.cursor)
            .map(|unit| unit.description.as_str())
    }

    /// Committed units, oldest first
    pub fn units(&self) -> impl Iterator<Item = &UndoUnit> + '_ {
        self.units.iter()
    }

    /// Remember the current state as saved
    pub fn mark_saved(&mut self) {
        self.save_point = Some(self.cursor);
    }

    /// Whether the current state differs from the last saved one
    pub fn needs_save(&self) -> bool {
        self.save_point != Some(self.cursor)
    }

    /// Drop all history and treat the current state as saved
    pub fn clear(&mut self) {
        self.units.clear();
        self.cursor = 0;
        self.save_point = Some(0);
        self.depth = 0;
        self.pending = None;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.cursor,
            redo_count: self.units.len() - self.cursor,
            memory_usage: self.units.iter().map(UndoUnit::memory_usage).sum(),
        }
    }
}

/// Statistics about the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStats {
    /// Number of units that can be undone
    pub undo_count: usize,
    /// Number of units that can be redone
    pub redo_count: usize,
    /// Approximate memory held by all units in bytes
    pub memory_usage: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(index: usize) -> Operation {
        Operation::Insert {
            index,
            record: EventRecord::new(0, 100),
        }
    }

    fn commit_one(engine: &mut UndoEngine, description: &str) {
        engine.begin(description, &[]);
        engine.record(insert(0)).unwrap();
        assert!(engine.end(&[0]).unwrap());
    }

    #[test]
    fn empty_scope_leaves_no_unit() {
        let mut engine = UndoEngine::new();
        engine.begin("select", &[0]);
        assert!(!engine.end(&[1]).unwrap());
        assert!(!engine.has_undo());
        assert!(!engine.needs_save());
    }

    #[test]
    fn nested_scopes_fold_into_outermost() {
        let mut engine = UndoEngine::new();
        engine.begin("outer", &[2]);
        engine.record(insert(0)).unwrap();
        engine.begin("inner", &[5]);
        engine.record(insert(1)).unwrap();
        assert!(!engine.end(&[9]).unwrap());
        assert!(engine.in_scope());
        assert!(engine.end(&[3]).unwrap());

        let unit = engine.step_back().unwrap();
        assert_eq!(unit.description, "outer");
        assert_eq!(unit.operations.len(), 2);
        assert_eq!(unit.selection_before, vec![2]);
        assert_eq!(unit.selection_after, vec![3]);
    }

    #[test]
    fn record_and_end_require_scope() {
        let mut engine = UndoEngine::new();
        assert!(engine.record(insert(0)).is_err());
        assert!(engine.end(&[]).is_err());
    }

    #[test]
    fn cursor_moves_and_new_edit_drops_redo() {
        let mut engine = UndoEngine::new();
        commit_one(&mut engine, "a");
        commit_one(&mut engine, "b");

        assert_eq!(engine.step_back().map(|u| u.description.clone()), Some("b".into()));
        assert!(engine.has_redo());
        assert_eq!(engine.next_redo_description(), Some("b"));
        assert_eq!(engine.next_undo_description(), Some("a"));

        commit_one(&mut engine, "c");
        assert!(!engine.has_redo());
        assert_eq!(engine.stats().undo_count, 2);
        assert_eq!(engine.next_undo_description(), Some("c"));
    }

    #[test]
    fn needs_save_tracks_save_point() {
        let mut engine = UndoEngine::new();
        commit_one(&mut engine, "a");
        assert!(engine.needs_save());
        engine.mark_saved();
        assert!(!engine.needs_save());

        engine.step_back();
        assert!(engine.needs_save());
        engine.step_forward();
        assert!(!engine.needs_save());

        // Saved state becomes unreachable after branching off
        engine.step_back();
        commit_one(&mut engine, "b");
        assert!(engine.needs_save());
        engine.step_back();
        assert!(engine.needs_save());
    }

    #[test]
    fn max_units_discards_oldest() {
        let mut engine = UndoEngine::with_config(UndoConfig { max_units: 2 });
        engine.mark_saved();
        for name in ["a", "b", "c", "d"] {
            commit_one(&mut engine, name);
        }

        let stats = engine.stats();
        assert_eq!(stats.undo_count, 2);
        assert!(stats.memory_usage > 0);
        assert_eq!(engine.step_back().map(|u| u.description.clone()), Some("d".into()));
        assert_eq!(engine.step_back().map(|u| u.description.clone()), Some("c".into()));
        assert!(engine.step_back().is_none());
        assert!(engine.needs_save());
    }

    #[test]
    fn clear_resets_everything() {
        let mut engine = UndoEngine::new();
        commit_one(&mut engine, "a");
        engine.clear();
        assert!(!engine.has_undo());
        assert!(!engine.needs_save());
        assert_eq!(engine.stats().memory_usage, 0);
    }
}
