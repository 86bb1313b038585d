//! Ordered set of selected record indices

use super::collection::ListEvent;
use super::errors::{EditorError, Result};
use crate::events::EventChannel;

/// Emitted when the selected set changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    /// New selection, ascending
    pub indices: Vec<usize>,
}

/// Selected record indices, kept sorted and unique
///
/// Structural changes of the collection adjust the indices silently: the
/// owner calls [`SelectionState::apply_list_event`] before observers of the
/// collection run, so no observer ever sees a stale index. [`changed`] only
/// carries explicit [`set`] calls; the owning document announces a remapped
/// selection once per committed change on its own channel.
///
/// [`changed`]: SelectionState::changed
/// [`set`]: SelectionState::set
pub struct SelectionState {
    indices: Vec<usize>,
    changed: EventChannel<SelectionState, SelectionEvent>,
}

impl core::fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SelectionState")
            .field("indices", &self.indices)
            .finish()
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            indices: Vec::new(),
            changed: EventChannel::new("selection"),
        }
    }

    /// Channel carrying [`SelectionEvent`]s
    pub fn changed(&self) -> &EventChannel<SelectionState, SelectionEvent> {
        &self.changed
    }

    /// Selected indices, ascending
    pub fn get(&self) -> &[usize] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Replace the selection; emits only if the set actually changed
    ///
    /// Duplicates are collapsed and order is normalized. Returns whether the
    /// selection changed.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::IndexOutOfRange`] if any index is not below
    /// `len`; the selection is left untouched in that case.
    pub fn set<I>(&mut self, indices: I, len: usize) -> Result<bool>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Err(EditorError::IndexOutOfRange { index, len });
        }
        indices.sort_unstable();
        indices.dedup();

        if indices == self.indices {
            return Ok(false);
        }
        self.indices = indices;
        self.changed.emit(
            self,
            SelectionEvent {
                indices: self.indices.clone(),
            },
        );
        Ok(true)
    }

    /// Remap indices for a structural change without emitting
    ///
    /// Returns whether the selected set changed.
    pub fn apply_list_event(&mut self, event: &ListEvent) -> bool {
        let previous_len = self.indices.len();
        match *event {
            ListEvent::ItemsInserted { index, count } => {
                let mut shifted = false;
                for selected in &mut self.indices {
                    if *selected >= index {
                        *selected += count;
                        shifted = true;
                    }
                }
                shifted
            }
            ListEvent::ItemsRemoved { index, count } => {
                let end = index + count;
                let mut shifted = false;
                self.indices.retain(|&selected| selected < index || selected >= end);
                for selected in &mut self.indices {
                    if *selected >= end {
                        *selected -= count;
                        shifted = true;
                    }
                }
                shifted || self.indices.len() != previous_len
            }
            ListEvent::ItemChanged { .. } => false,
            ListEvent::Reset { .. } => {
                self.indices.clear();
                previous_len != 0
            }
        }
    }
}
