//! Ordered, observable list of subtitle records
//!
//! [`EventCollection`] is mutated only through three primitives: insert one
//! record, remove a contiguous range, and a scoped per-record update. Every
//! primitive normalizes timings, then emits exactly one [`ListEvent`] on the
//! collection's channel after the change is fully applied.

use super::errors::{EditorError, Result};
use crate::events::EventChannel;
use core::ops::Index;
use subline_core::{EventField, EventRecord};
use tracing::debug;

/// Structural change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListEvent {
    /// `count` records were inserted starting at `index`
    ItemsInserted { index: usize, count: usize },
    /// `count` records were removed starting at `index`
    ItemsRemoved { index: usize, count: usize },
    /// The record at `index` changed in place
    ItemChanged { index: usize },
    /// The whole content was replaced; `len` is the new length
    Reset { len: usize },
}

impl ListEvent {
    /// Whether row positions shift because of this change
    pub const fn is_structural(&self) -> bool {
        !matches!(self, Self::ItemChanged { .. })
    }
}

/// Before and after images of a scoped update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    pub before: EventRecord,
    pub after: EventRecord,
}

impl RecordChange {
    /// Whether the update left the record untouched
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

/// Observable sequence of [`EventRecord`]s
pub struct EventCollection {
    records: Vec<EventRecord>,
    changed: EventChannel<EventCollection, ListEvent>,
}

impl core::fmt::Debug for EventCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventCollection")
            .field("len", &self.records.len())
            .field("changed", &self.changed)
            .finish()
    }
}

impl Default for EventCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for EventCollection {
    type Output = EventRecord;

    fn index(&self, index: usize) -> &EventRecord {
        &self.records[index]
    }
}

impl EventCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            changed: EventChannel::new("lines"),
        }
    }

    /// Create a collection from records, normalizing each one
    pub fn from_records(records: impl IntoIterator<Item = EventRecord>) -> Self {
        let mut collection = Self::new();
        collection.records = records
            .into_iter()
            .map(|mut record| {
                record.normalize();
                record
            })
            .collect();
        collection
    }

    /// Channel carrying [`ListEvent`]s
    pub fn changed(&self) -> &EventChannel<EventCollection, ListEvent> {
        &self.changed
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`, if any
    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        self.records.get(index)
    }

    /// Record at `index`
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::IndexOutOfRange`] past the end.
    pub fn at(&self, index: usize) -> Result<&EventRecord> {
        self.records.get(index).ok_or(EditorError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// Record before `index`
    pub fn prev(&self, index: usize) -> Option<&EventRecord> {
        index.checked_sub(1).and_then(|prev| self.records.get(prev))
    }

    /// Record after `index`
    pub fn next(&self, index: usize) -> Option<&EventRecord> {
        index.checked_add(1).and_then(|next| self.records.get(next))
    }

    /// 1-based display number of the record at `index`
    pub fn number(&self, index: usize) -> Option<usize> {
        (index < self.records.len()).then(|| index + 1)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    /// All records in order
    pub fn as_slice(&self) -> &[EventRecord] {
        &self.records
    }

    /// Insert one record before `index` (`index == len` appends)
    pub fn insert_one(&mut self, index: usize, record: EventRecord) -> Result<()> {
        self.insert_one_with(index, record, |_| {}).map(|_| ())
    }

    /// Remove `count` records starting at `index`, returning them
    pub fn remove(&mut self, index: usize, count: usize) -> Result<Vec<EventRecord>> {
        self.remove_with(index, count, |_| {})
            .map(|(removed, _)| removed)
    }

    /// Scoped update of one record
    ///
    /// The closure may write any number of fields; one
    /// [`ListEvent::ItemChanged`] is emitted when it returns.
    pub fn update<F>(&mut self, index: usize, edit: F) -> Result<RecordChange>
    where
        F: FnOnce(&mut EventRecord),
    {
        self.update_with(index, edit, |_| {})
            .map(|(change, _)| change)
    }

    /// Write a single field
    pub fn set_field(&mut self, index: usize, field: EventField) -> Result<RecordChange> {
        self.update(index, |record| record.set(field))
    }

    /// Replace the whole content and emit [`ListEvent::Reset`]
    pub fn load(&mut self, records: Vec<EventRecord>) {
        self.load_with(records, |_| {});
    }

    /// Insert, calling `before_notify` after the change and before observers run
    pub(crate) fn insert_one_with<H>(
        &mut self,
        index: usize,
        mut record: EventRecord,
        before_notify: H,
    ) -> Result<ListEvent>
    where
        H: FnOnce(&ListEvent),
    {
        if index > self.records.len() {
            return Err(EditorError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }

        record.normalize();
        self.records.insert(index, record);

        let event = ListEvent::ItemsInserted { index, count: 1 };
        before_notify(&event);
        self.changed.emit(self, event);
        Ok(event)
    }

    pub(crate) fn remove_with<H>(
        &mut self,
        index: usize,
        count: usize,
        before_notify: H,
    ) -> Result<(Vec<EventRecord>, ListEvent)>
    where
        H: FnOnce(&ListEvent),
    {
        let len = self.records.len();
        let end = index
            .checked_add(count)
            .filter(|end| *end <= len)
            .ok_or(EditorError::RangeOutOfBounds { index, count, len })?;

        let removed: Vec<EventRecord> = self.records.drain(index..end).collect();

        let event = ListEvent::ItemsRemoved { index, count };
        before_notify(&event);
        self.changed.emit(self, event);
        Ok((removed, event))
    }

    pub(crate) fn update_with<F, H>(
        &mut self,
        index: usize,
        edit: F,
        before_notify: H,
    ) -> Result<(RecordChange, ListEvent)>
    where
        F: FnOnce(&mut EventRecord),
        H: FnOnce(&ListEvent),
    {
        let len = self.records.len();
        let record = self
            .records
            .get_mut(index)
            .ok_or(EditorError::IndexOutOfRange { index, len })?;

        let before = record.clone();
        edit(record);
        if record.normalize() {
            debug!(index, start = record.start, end = record.end, "clamped record timing");
        }
        let after = record.clone();

        let event = ListEvent::ItemChanged { index };
        before_notify(&event);
        self.changed.emit(self, event);
        Ok((RecordChange { before, after }, event))
    }

    pub(crate) fn load_with<H>(&mut self, records: Vec<EventRecord>, before_notify: H) -> ListEvent
    where
        H: FnOnce(&ListEvent),
    {
        self.records = records;
        for record in &mut self.records {
            record.normalize();
        }

        let event = ListEvent::Reset {
            len: self.records.len(),
        };
        before_notify(&event);
        self.changed.emit(self, event);
        event
    }
}

impl<'a> IntoIterator for &'a EventCollection {
    type Item = &'a EventRecord;
    type IntoIter = core::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn collection(spans: &[(i64, i64)]) -> EventCollection {
        EventCollection::from_records(spans.iter().map(|&(s, e)| EventRecord::new(s, e)))
    }

    fn observe(lines: &EventCollection) -> Rc<RefCell<Vec<ListEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        lines
            .changed()
            .subscribe(move |_: &EventCollection, event: &ListEvent| sink.borrow_mut().push(*event));
        log
    }

    #[test]
    fn insert_emits_after_change_is_visible() {
        let mut lines = collection(&[(0, 100)]);
        let seen_len = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen_len);
        lines
            .changed()
            .subscribe(move |lines: &EventCollection, _: &ListEvent| *sink.borrow_mut() = lines.len());

        lines.insert_one(1, EventRecord::new(100, 200)).unwrap();
        assert_eq!(*seen_len.borrow(), 2);
        assert_eq!(lines[1].start, 100);
    }

    #[test]
    fn insert_past_end_fails_without_notifying() {
        let mut lines = collection(&[(0, 100)]);
        let log = observe(&lines);

        let err = lines.insert_one(3, EventRecord::default()).unwrap_err();
        assert_eq!(err, EditorError::IndexOutOfRange { index: 3, len: 1 });
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn remove_range_returns_records() {
        let mut lines = collection(&[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let log = observe(&lines);

        let removed = lines.remove(1, 2).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].start, 1);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].start, 3);
        assert_eq!(
            *log.borrow(),
            vec![ListEvent::ItemsRemoved { index: 1, count: 2 }]
        );

        assert!(matches!(
            lines.remove(1, 5),
            Err(EditorError::RangeOutOfBounds { .. })
        ));
        assert!(lines.remove(usize::MAX, 2).is_err());
    }

    #[test]
    fn scoped_update_emits_once() {
        let mut lines = collection(&[(0, 1000)]);
        let log = observe(&lines);

        let change = lines
            .update(0, |record| {
                record.start = 200;
                record.end = 1800;
                record.text = "hello".to_string();
                record.actor = "Ann".to_string();
            })
            .unwrap();

        assert_eq!(change.before.end, 1000);
        assert_eq!(change.after.end, 1800);
        assert_eq!(*log.borrow(), vec![ListEvent::ItemChanged { index: 0 }]);
    }

    #[test]
    fn writes_are_normalized() {
        let mut lines = collection(&[(500, 1000)]);

        lines.set_field(0, EventField::End(100)).unwrap();
        assert_eq!((lines[0].start, lines[0].end), (500, 500));

        lines.set_field(0, EventField::Start(-40)).unwrap();
        assert_eq!((lines[0].start, lines[0].end), (0, 500));

        lines.insert_one(0, EventRecord::new(900, 300)).unwrap();
        assert_eq!((lines[0].start, lines[0].end), (900, 900));
    }

    #[test]
    fn neighbours() {
        let lines = collection(&[(0, 1), (1, 2)]);
        assert!(lines.prev(0).is_none());
        assert_eq!(lines.prev(1).map(|r| r.start), Some(0));
        assert_eq!(lines.next(0).map(|r| r.start), Some(1));
        assert!(lines.next(1).is_none());
        assert!(lines.next(usize::MAX).is_none());
        assert_eq!(lines.number(1), Some(2));
        assert_eq!(lines.number(2), None);
        assert_eq!(lines.number(usize::MAX), None);
        assert!(lines.at(2).is_err());
    }

    #[test]
    fn load_resets() {
        let mut lines = collection(&[(0, 1)]);
        let log = observe(&lines);

        lines.load(vec![EventRecord::new(10, 5), EventRecord::new(1, 2)]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].end, 10);
        assert_eq!(*log.borrow(), vec![ListEvent::Reset { len: 2 }]);
        assert!(ListEvent::Reset { len: 0 }.is_structural());
        assert!(!ListEvent::ItemChanged { index: 0 }.is_structural());
    }
}
