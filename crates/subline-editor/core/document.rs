//! Subtitle document: records, selection and history behind one owner
//!
//! [`Document`] sequences every change the same way:
//!
//! 1. the collection applies the mutation,
//! 2. the selection remaps its indices silently,
//! 3. the operation is journaled into the open history scope,
//! 4. observers are notified, collection channel first, then the
//!    document-wide [`DocumentEvent`] channel.
//!
//! Observers therefore always see a collection and selection that agree.
//!
//! The document channel is held while a bulk scope (or an undo/redo) is in
//! progress and delivers its queued events when the outermost scope closes.
//! Selection remapping caused by structural changes is silent; if it moved
//! the selection and nothing announced the new set since, a single
//! [`DocumentEvent::Selection`] follows the queued events.
//!
//! # Examples
//!
//! ```rust
//! use subline_core::EventRecord;
//! use subline_editor::Document;
//!
//! let mut doc = Document::new();
//! doc.load(vec![EventRecord::new(0, 1300), EventRecord::new(1300, 2000)]).unwrap();
//!
//! {
//!     let mut edit = doc.bulk("Join subtitles");
//!     edit.update(0, |record| record.end = 2000).unwrap();
//!     edit.remove(1, 1).unwrap();
//! }
//! assert_eq!(doc.lines().len(), 1);
//!
//! doc.undo().unwrap();
//! assert_eq!(doc.lines().len(), 2);
//! assert_eq!(doc.lines()[0].end, 1300);
//! ```

use super::collection::{EventCollection, ListEvent, RecordChange};
use super::errors::{EditorError, Result};
use super::history::{HistoryStats, Operation, UndoConfig, UndoEngine, UndoUnit};
use super::selection::{SelectionEvent, SelectionState};
use crate::events::EventChannel;
use core::ops::{Deref, DerefMut};
use subline_core::{EventField, EventRecord};
use tracing::{debug, info};

/// Document-wide notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The collection changed
    Lines(ListEvent),
    /// The selection changed
    Selection(SelectionEvent),
    /// An undo unit was reverted
    Undone { description: String },
    /// An undo unit was reapplied
    Redone { description: String },
    /// The document was saved
    Saved,
}

/// Owner of one subtitle document
pub struct Document {
    lines: EventCollection,
    selection: SelectionState,
    history: UndoEngine,
    events: EventChannel<Document, DocumentEvent>,
    /// Remapping moved the selection since it was last announced
    selection_moved: bool,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.lines)
            .field("selection", &self.selection)
            .field("history", &self.history.stats())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with default history retention
    pub fn new() -> Self {
        Self::with_config(UndoConfig::default())
    }

    /// Create an empty document with custom history retention
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            lines: EventCollection::new(),
            selection: SelectionState::new(),
            history: UndoEngine::with_config(config),
            events: EventChannel::new("document"),
            selection_moved: false,
        }
    }

    pub fn lines(&self) -> &EventCollection {
        &self.lines
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn history(&self) -> &UndoEngine {
        &self.history
    }

    /// Document-wide notification channel
    pub fn events(&self) -> &EventChannel<Document, DocumentEvent> {
        &self.events
    }

    /// Selected indices, ascending
    pub fn selected_indices(&self) -> &[usize] {
        self.selection.get()
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Selected records with their indices
    pub fn selected_records(&self) -> impl Iterator<Item = (usize, &EventRecord)> + '_ {
        self.selection
            .get()
            .iter()
            .filter_map(|&index| self.lines.get(index).map(|record| (index, record)))
    }

    /// Records in order, as handed to persistence
    pub fn records(&self) -> &[EventRecord] {
        self.lines.as_slice()
    }

    /// Replace the content, clear selection and history, mark as saved
    ///
    /// # Errors
    ///
    /// Fails with [`EditorError::TransactionActive`] inside a bulk scope.
    pub fn load(&mut self, records: Vec<EventRecord>) -> Result<()> {
        if self.history.in_scope() {
            return Err(EditorError::TransactionActive { action: "load" });
        }
        let count = records.len();
        let had_selection = !self.selection.is_empty();

        let selection = &mut self.selection;
        let event = self.lines.load_with(records, |event| {
            selection.apply_list_event(event);
        });
        self.history.clear();
        self.selection_moved = false;

        self.events.emit(self, DocumentEvent::Lines(event));
        if had_selection {
            self.notify_selection();
        }
        info!(records = count, "document loaded");
        Ok(())
    }

    /// Open a bulk scope; everything done through the guard is one undo unit
    ///
    /// The scope commits when the guard is dropped, including on early
    /// return through `?`. Scopes nest; only the outermost one commits.
    pub fn bulk(&mut self, description: &str) -> Bulk<'_> {
        let outermost = !self.history.in_scope();
        self.history.begin(description, self.selection.get());
        if outermost {
            self.events.hold();
        }
        Bulk {
            doc: self,
            outermost,
        }
    }

    /// Run `edit` inside a bulk scope
    pub fn transaction<T, F>(&mut self, description: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let mut bulk = self.bulk(description);
        edit(&mut bulk)
    }

    /// Insert one record as its own undo unit (or into the open bulk scope)
    pub fn insert_one(&mut self, index: usize, record: EventRecord) -> Result<()> {
        self.bulk("Insert subtitle").journaled_insert(index, record)
    }

    /// Remove a range as its own undo unit (or into the open bulk scope)
    pub fn remove(&mut self, index: usize, count: usize) -> Result<()> {
        self.bulk("Delete subtitles").journaled_remove(index, count)
    }

    /// Scoped update of one record, journaled as one operation
    pub fn update<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut EventRecord),
    {
        self.bulk("Edit subtitle").journaled_update(index, edit)
    }

    /// Write one field of one record
    pub fn set_field(&mut self, index: usize, field: EventField) -> Result<()> {
        self.update(index, |record| record.set(field))
    }

    /// Replace the selection; not an undo unit of its own
    pub fn set_selection<I>(&mut self, indices: I) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        if self.selection.set(indices, self.lines.len())? {
            self.notify_selection();
        }
        Ok(())
    }

    pub fn has_undo(&self) -> bool {
        self.history.has_undo()
    }

    pub fn has_redo(&self) -> bool {
        self.history.has_redo()
    }

    /// Whether the content differs from the last save or load
    pub fn needs_save(&self) -> bool {
        self.history.needs_save()
    }

    /// Mark the current content as saved
    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
        self.events.emit(self, DocumentEvent::Saved);
    }

    pub fn history_stats(&self) -> HistoryStats {
        self.history.stats()
    }

    /// Revert the most recent unit and restore the selection it started with
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Fails with [`EditorError::TransactionActive`] inside a bulk scope.
    pub fn undo(&mut self) -> Result<bool> {
        if self.history.in_scope() {
            return Err(EditorError::TransactionActive { action: "undo" });
        }
        let Some(unit) = self.history.step_back().cloned() else {
            return Ok(false);
        };

        self.events.hold();
        let reverted = unit
            .operations
            .iter()
            .rev()
            .try_for_each(|operation| self.revert(operation))
            .and_then(|()| self.restore_selection(&unit.selection_before));
        self.flush_events();
        reverted?;

        debug!(description = %unit.description, "undone");
        self.events.emit(
            self,
            DocumentEvent::Undone {
                description: unit.description,
            },
        );
        Ok(true)
    }

    /// Reapply the next unit and restore the selection it ended with
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Fails with [`EditorError::TransactionActive`] inside a bulk scope.
    pub fn redo(&mut self) -> Result<bool> {
        if self.history.in_scope() {
            return Err(EditorError::TransactionActive { action: "redo" });
        }
        let Some(unit) = self.history.step_forward().cloned() else {
            return Ok(false);
        };

        self.events.hold();
        let reapplied = unit
            .operations
            .iter()
            .try_for_each(|operation| self.reapply(operation))
            .and_then(|()| self.restore_selection(&unit.selection_after));
        self.flush_events();
        reapplied?;

        debug!(description = %unit.description, "redone");
        self.events.emit(
            self,
            DocumentEvent::Redone {
                description: unit.description,
            },
        );
        Ok(true)
    }

    /// Description of the unit [`undo`](Self::undo) would revert
    pub fn next_undo_description(&self) -> Option<&str> {
        self.history.next_undo_description()
    }

    /// Description of the unit [`redo`](Self::redo) would reapply
    pub fn next_redo_description(&self) -> Option<&str> {
        self.history.next_redo_description()
    }

    fn notify_selection(&mut self) {
        self.selection_moved = false;
        self.events.emit(
            self,
            DocumentEvent::Selection(SelectionEvent {
                indices: self.selection.get().to_vec(),
            }),
        );
    }

    fn restore_selection(&mut self, indices: &[usize]) -> Result<()> {
        self.set_selection(indices.iter().copied())
    }

    /// Announce a remapped selection once, then deliver the held events
    fn flush_events(&mut self) {
        if self.selection_moved {
            self.notify_selection();
        }
        self.events.release(self);
    }

    fn notify_lines(&self, event: ListEvent) {
        self.events.emit(self, DocumentEvent::Lines(event));
    }

    fn journaled_insert(&mut self, index: usize, record: EventRecord) -> Result<()> {
        let event = self.raw_insert(index, record)?;
        self.history.record(Operation::Insert {
            index,
            record: self.lines[index].clone(),
        })?;
        self.notify_lines(event);
        Ok(())
    }

    fn journaled_remove(&mut self, index: usize, count: usize) -> Result<()> {
        let (records, event) = self.raw_remove(index, count)?;
        self.history.record(Operation::Remove { index, records })?;
        self.notify_lines(event);
        Ok(())
    }

    fn journaled_update<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut EventRecord),
    {
        let (change, event) = self.raw_update(index, edit)?;
        if !change.is_noop() {
            self.history.record(Operation::Update {
                index,
                before: change.before,
                after: change.after,
            })?;
        }
        self.events.emit(self, DocumentEvent::Lines(event));
        Ok(())
    }

    fn raw_insert(&mut self, index: usize, record: EventRecord) -> Result<ListEvent> {
        let selection = &mut self.selection;
        let mut moved = false;
        let event = self.lines.insert_one_with(index, record, |event| {
            moved = selection.apply_list_event(event);
        })?;
        self.selection_moved |= moved;
        Ok(event)
    }

    fn raw_remove(&mut self, index: usize, count: usize) -> Result<(Vec<EventRecord>, ListEvent)> {
        let selection = &mut self.selection;
        let mut moved = false;
        let (records, event) = self.lines.remove_with(index, count, |event| {
            moved = selection.apply_list_event(event);
        })?;
        self.selection_moved |= moved;
        Ok((records, event))
    }

    fn raw_update<F>(&mut self, index: usize, edit: F) -> Result<(RecordChange, ListEvent)>
    where
        F: FnOnce(&mut EventRecord),
    {
        self.lines.update_with(index, edit, |_| {})
    }

    fn revert(&mut self, operation: &Operation) -> Result<()> {
        let event = match operation {
            Operation::Insert { index, .. } => self.raw_remove(*index, 1)?.1,
            Operation::Remove { index, records } => {
                for (offset, record) in records.iter().enumerate() {
                    let event = self.raw_insert(index + offset, record.clone())?;
                    self.notify_lines(event);
                }
                return Ok(());
            }
            Operation::Update { index, before, .. } => {
                let before = before.clone();
                self.raw_update(*index, |record| *record = before)?.1
            }
        };
        self.notify_lines(event);
        Ok(())
    }

    fn reapply(&mut self, operation: &Operation) -> Result<()> {
        let event = match operation {
            Operation::Insert { index, record } => self.raw_insert(*index, record.clone())?,
            Operation::Remove { index, records } => self.raw_remove(*index, records.len())?.1,
            Operation::Update { index, after, .. } => {
                let after = after.clone();
                self.raw_update(*index, |record| *record = after)?.1
            }
        };
        self.notify_lines(event);
        Ok(())
    }

    /// Units currently held by the history, oldest first
    pub fn history_units(&self) -> impl Iterator<Item = &UndoUnit> + '_ {
        self.history.units()
    }
}

/// Guard for an open bulk scope
///
/// Dereferences to the [`Document`], so every document operation is
/// available through it and journals into the same unit.
pub struct Bulk<'a> {
    doc: &'a mut Document,
    outermost: bool,
}

impl Deref for Bulk<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.doc
    }
}

impl DerefMut for Bulk<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        self.doc
    }
}

impl Drop for Bulk<'_> {
    fn drop(&mut self) {
        let selection = self.doc.selection.get().to_vec();
        if let Err(err) = self.doc.history.end(&selection) {
            tracing::error!(%err, "failed to close bulk scope");
        }
        if self.outermost {
            self.doc.flush_events();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn doc_with(spans: &[(i64, i64)]) -> Document {
        let mut doc = Document::new();
        doc.load(spans.iter().map(|&(s, e)| EventRecord::new(s, e)).collect())
            .unwrap();
        doc
    }

    fn spans(doc: &Document) -> Vec<(i64, i64)> {
        doc.lines().iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn each_primitive_is_its_own_unit() {
        let mut doc = doc_with(&[(0, 100)]);
        doc.insert_one(1, EventRecord::new(100, 200)).unwrap();
        doc.set_field(0, EventField::Text("x".into())).unwrap();
        assert_eq!(doc.history_stats().undo_count, 2);

        doc.undo().unwrap();
        assert_eq!(doc.lines()[0].text, "");
        assert_eq!(doc.lines().len(), 2);
        doc.undo().unwrap();
        assert_eq!(doc.lines().len(), 1);
        assert!(!doc.undo().unwrap());
    }

    #[test]
    fn bulk_commits_on_early_error() {
        let mut doc = doc_with(&[(0, 100), (100, 200)]);
        let result = doc.transaction("Broken", |doc| {
            doc.remove(0, 1)?;
            doc.remove(5, 1)?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(doc.lines().len(), 1);
        assert!(doc.has_undo());
        assert!(!doc.history().in_scope());

        doc.undo().unwrap();
        assert_eq!(spans(&doc), vec![(0, 100), (100, 200)]);
    }

    #[test]
    fn observers_see_adjusted_selection() {
        let mut doc = doc_with(&[(0, 1), (1, 2), (2, 3)]);
        doc.set_selection([2]).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        doc.events().subscribe(move |doc: &Document, event: &DocumentEvent| {
            if let DocumentEvent::Lines(_) = event {
                sink.borrow_mut().push(doc.selected_indices().to_vec());
            }
        });

        doc.remove(0, 1).unwrap();
        doc.insert_one(0, EventRecord::new(5, 6)).unwrap();
        assert_eq!(*seen.borrow(), vec![vec![1], vec![2]]);
    }

    fn record_events(doc: &Document) -> Rc<RefCell<Vec<DocumentEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        doc.events().subscribe(move |_: &Document, event: &DocumentEvent| {
            sink.borrow_mut().push(event.clone());
        });
        seen
    }

    fn selection_events(seen: &RefCell<Vec<DocumentEvent>>) -> Vec<Vec<usize>> {
        seen.borrow()
            .iter()
            .filter_map(|event| match event {
                DocumentEvent::Selection(selection) => Some(selection.indices.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn shifted_selection_is_announced_once_after_lines() {
        let mut doc = doc_with(&[(0, 1), (1, 2), (2, 3)]);
        doc.set_selection([1, 2]).unwrap();

        let remapped = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&remapped);
        doc.selection()
            .changed()
            .subscribe(move |_: &SelectionState, event: &SelectionEvent| {
                sink.borrow_mut().push(event.indices.clone());
            });
        let seen = record_events(&doc);

        doc.remove(1, 1).unwrap();
        doc.set_field(0, EventField::Actor("A".into())).unwrap();
        assert!(remapped.borrow().is_empty());
        assert_eq!(
            *seen.borrow(),
            vec![
                DocumentEvent::Lines(ListEvent::ItemsRemoved { index: 1, count: 1 }),
                DocumentEvent::Selection(SelectionEvent { indices: vec![1] }),
                DocumentEvent::Lines(ListEvent::ItemChanged { index: 0 }),
            ]
        );
    }

    #[test]
    fn unmoved_selection_is_not_announced() {
        let mut doc = doc_with(&[(0, 1), (1, 2), (2, 3)]);
        doc.set_selection([0]).unwrap();
        let seen = record_events(&doc);

        doc.remove(2, 1).unwrap();
        doc.insert_one(1, EventRecord::new(5, 6)).unwrap();
        assert!(selection_events(&seen).is_empty());
    }

    #[test]
    fn multi_row_removal_announces_selection_once() {
        let mut doc = doc_with(&[(0, 1), (1, 2), (2, 3), (3, 4)]);
        doc.set_selection([0, 2]).unwrap();
        let seen = record_events(&doc);

        {
            let mut edit = doc.bulk("Delete");
            edit.remove(2, 1).unwrap();
            edit.remove(0, 1).unwrap();
        }
        assert_eq!(selection_events(&seen), vec![Vec::<usize>::new()]);
        assert_eq!(
            seen.borrow().last(),
            Some(&DocumentEvent::Selection(SelectionEvent { indices: vec![] }))
        );

        doc.set_selection([0, 1]).unwrap();
        seen.borrow_mut().clear();
        {
            let mut edit = doc.bulk("Delete");
            edit.remove(1, 1).unwrap();
            edit.remove(0, 1).unwrap();
            edit.set_selection([]).unwrap();
        }
        assert_eq!(selection_events(&seen), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn bulk_delivers_document_events_on_close() {
        let mut doc = doc_with(&[(0, 1), (1, 2)]);
        let seen = record_events(&doc);
        {
            let mut edit = doc.bulk("Retime");
            edit.set_field(0, EventField::End(5)).unwrap();
            edit.set_field(1, EventField::End(6)).unwrap();
            assert!(seen.borrow().is_empty());
            assert!(edit.events().is_held());
        }
        assert!(!doc.events().is_held());
        assert_eq!(
            *seen.borrow(),
            vec![
                DocumentEvent::Lines(ListEvent::ItemChanged { index: 0 }),
                DocumentEvent::Lines(ListEvent::ItemChanged { index: 1 }),
            ]
        );
    }

    #[test]
    fn undo_announces_restored_selection_after_lines() {
        let mut doc = doc_with(&[(0, 1), (1, 2), (2, 3)]);
        doc.set_selection([2]).unwrap();
        doc.remove(0, 1).unwrap();
        let seen = record_events(&doc);

        doc.undo().unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                DocumentEvent::Lines(ListEvent::ItemsInserted { index: 0, count: 1 }),
                DocumentEvent::Selection(SelectionEvent { indices: vec![2] }),
                DocumentEvent::Undone {
                    description: "Delete subtitles".into()
                },
            ]
        );
    }

    #[test]
    fn history_changes_inside_bulk_are_rejected() {
        let mut doc = doc_with(&[(0, 1), (1, 2), (2, 3)]);
        doc.remove(2, 1).unwrap();
        doc.undo().unwrap();
        {
            let mut edit = doc.bulk("Outer");
            assert_eq!(
                edit.load(vec![EventRecord::new(0, 1)]),
                Err(EditorError::TransactionActive { action: "load" })
            );
            assert_eq!(
                edit.redo(),
                Err(EditorError::TransactionActive { action: "redo" })
            );
            edit.remove(0, 1).unwrap();
            edit.remove(0, 1).unwrap();
            assert!(edit.history().in_scope());
        }
        assert!(!doc.history().in_scope());
        assert_eq!(doc.history_stats().undo_count, 1);
        assert_eq!(doc.next_undo_description(), Some("Outer"));

        doc.undo().unwrap();
        assert_eq!(spans(&doc), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn selection_only_changes_are_not_undoable() {
        let mut doc = doc_with(&[(0, 1), (1, 2)]);
        doc.set_selection([1]).unwrap();
        assert!(!doc.has_undo());
        assert!(!doc.needs_save());
    }

    #[test]
    fn undo_restores_selection_snapshot() {
        let mut doc = doc_with(&[(0, 1), (1, 2), (2, 3)]);
        doc.set_selection([0, 2]).unwrap();
        {
            let mut edit = doc.bulk("Delete");
            edit.remove(2, 1).unwrap();
            edit.remove(0, 1).unwrap();
            edit.set_selection([]).unwrap();
        }
        assert_eq!(doc.lines().len(), 1);
        assert!(doc.selected_indices().is_empty());

        doc.undo().unwrap();
        assert_eq!(doc.selected_indices(), &[0, 2]);
        doc.redo().unwrap();
        assert_eq!(spans(&doc), vec![(1, 2)]);
        assert!(doc.selected_indices().is_empty());
    }

    #[test]
    fn undo_inside_bulk_is_rejected() {
        let mut doc = doc_with(&[(0, 1)]);
        let mut edit = doc.bulk("Outer");
        assert_eq!(
            edit.undo(),
            Err(EditorError::TransactionActive { action: "undo" })
        );
    }

    #[test]
    fn noop_update_is_not_journaled() {
        let mut doc = doc_with(&[(0, 100)]);
        doc.update(0, |record| record.end = 100).unwrap();
        assert!(!doc.has_undo());
    }

    #[test]
    fn save_point() {
        let mut doc = doc_with(&[(0, 100)]);
        assert!(!doc.needs_save());
        doc.set_field(0, EventField::End(50)).unwrap();
        assert!(doc.needs_save());
        doc.mark_saved();
        assert!(!doc.needs_save());
        doc.undo().unwrap();
        assert!(doc.needs_save());
        doc.redo().unwrap();
        assert!(!doc.needs_save());
    }

    #[test]
    fn document_events_follow_collection_events() {
        let mut doc = doc_with(&[(0, 1)]);
        let order = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&order);
        doc.lines()
            .changed()
            .subscribe(move |_: &EventCollection, _: &ListEvent| sink.borrow_mut().push("lines"));
        let sink = Rc::clone(&order);
        doc.events()
            .subscribe(move |_: &Document, _: &DocumentEvent| sink.borrow_mut().push("document"));

        doc.remove(0, 1).unwrap();
        assert_eq!(*order.borrow(), vec!["lines", "document"]);
    }
}
