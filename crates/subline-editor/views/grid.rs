//! Table model over the subtitle collection
//!
//! Display strings are computed lazily per row and cached until the
//! collection reports a change touching that row.

use crate::core::{EventCollection, ListEvent};
use crate::events::{Subscription, INTERNAL_PRIORITY};
use core::cell::RefCell;
use std::rc::Rc;
use subline_core::{ass_to_plaintext, format_ms, EventRecord};
use tracing::trace;

/// Grid columns in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridColumn {
    Start,
    End,
    Style,
    Actor,
    Text,
    Duration,
    CharactersPerSecond,
}

impl GridColumn {
    pub const ALL: [Self; 7] = [
        Self::Start,
        Self::End,
        Self::Style,
        Self::Actor,
        Self::Text,
        Self::Duration,
        Self::CharactersPerSecond,
    ];

    pub const fn header(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::End => "End",
            Self::Style => "Style",
            Self::Actor => "Actor",
            Self::Text => "Text",
            Self::Duration => "Duration",
            Self::CharactersPerSecond => "CPS",
        }
    }
}

/// Cached display data of one row
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    /// 1-based position in the collection
    pub number: usize,
    pub start: String,
    pub end: String,
    pub style: String,
    pub actor: String,
    pub text: String,
    pub duration: String,
    pub cps: String,
    /// How far the reading speed exceeds the limit, `0.0..=1.0`
    pub cps_ratio: f64,
}

impl GridRow {
    fn build(number: usize, record: &EventRecord, max_cps: f64) -> Self {
        let cps = record.characters_per_second();
        let cps_ratio = match cps {
            Some(cps) if max_cps > 0.0 => ((cps - max_cps).max(0.0) / max_cps).min(1.0),
            _ => 0.0,
        };
        Self {
            number,
            start: format_ms(record.start),
            end: format_ms(record.end),
            style: record.style.clone(),
            actor: record.actor.clone(),
            text: ass_to_plaintext(&record.text, true),
            duration: format!("{:.1}", record.duration() as f64 / 1000.0),
            cps: cps.map_or_else(|| "-".to_string(), |cps| format!("{cps:.1}")),
            cps_ratio,
        }
    }

    /// Display string of one column
    pub fn cell(&self, column: GridColumn) -> &str {
        match column {
            GridColumn::Start => &self.start,
            GridColumn::End => &self.end,
            GridColumn::Style => &self.style,
            GridColumn::Actor => &self.actor,
            GridColumn::Text => &self.text,
            GridColumn::Duration => &self.duration,
            GridColumn::CharactersPerSecond => &self.cps,
        }
    }
}

type RowCache = Rc<RefCell<Vec<Option<GridRow>>>>;

/// Row cache kept in step with one [`EventCollection`]
#[derive(Debug)]
pub struct GridModel {
    rows: RowCache,
    max_cps: f64,
    _subscription: Subscription,
}

impl GridModel {
    /// Attach to `lines`; the model detaches when dropped
    pub fn attach(lines: &EventCollection, max_cps: f64) -> Self {
        let rows: RowCache = Rc::new(RefCell::new(vec![None; lines.len()]));
        let cache = Rc::clone(&rows);
        let subscription = lines.changed().subscribe_scoped(
            INTERNAL_PRIORITY,
            move |lines: &EventCollection, event: &ListEvent| {
                let mut rows = cache.borrow_mut();
                match *event {
                    ListEvent::ItemChanged { index } => {
                        if let Some(row) = rows.get_mut(index) {
                            *row = None;
                        }
                    }
                    _ => {
                        trace!(?event, "grid cache reset");
                        rows.clear();
                        rows.resize(lines.len(), None);
                    }
                }
            },
        );
        Self {
            rows,
            max_cps,
            _subscription: subscription,
        }
    }

    pub fn headers(&self) -> Vec<&'static str> {
        GridColumn::ALL.iter().map(|column| column.header()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    /// Display data for `index`, computed on first access
    pub fn row(&self, index: usize, lines: &EventCollection) -> Option<GridRow> {
        let record = lines.get(index)?;
        let number = lines.number(index)?;
        let mut rows = self.rows.borrow_mut();
        let slot = rows.get_mut(index)?;
        Some(
            slot.get_or_insert_with(|| GridRow::build(number, record, self.max_cps))
                .clone(),
        )
    }

    /// Number of rows currently cached
    pub fn cached_rows(&self) -> usize {
        self.rows.borrow().iter().filter(|row| row.is_some()).count()
    }
}
