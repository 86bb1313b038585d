//! Subtitle event record
//!
//! An [`EventRecord`] is the data of one subtitle line. Records carry no
//! identity of their own: a record's position inside the owning collection
//! is its identity, and its display number is derived from that position.

use crate::utils::{ass_to_plaintext, character_count};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Style assigned to freshly inserted records
pub const DEFAULT_STYLE: &str = "Default";

/// One timed subtitle entry
///
/// Times are integer milliseconds. The owning collection keeps
/// `0 <= start <= end` by calling [`EventRecord::normalize`] whenever a
/// record enters it or one of its fields is written.
///
/// # Examples
///
/// ```rust
/// use subline_core::EventRecord;
///
/// let record = EventRecord::new(500, 1500)
///     .with_style("Signs")
///     .with_actor("Narrator")
///     .with_text("{\\an8}Chapter one");
///
/// assert_eq!(record.duration(), 1000);
/// assert_eq!(record.style, "Signs");
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Start time in milliseconds
    pub start: i64,

    /// End time in milliseconds
    pub end: i64,

    /// Style name reference
    pub style: String,

    /// Speaker or character name
    pub actor: String,

    /// Subtitle text, inline override blocks preserved verbatim
    pub text: String,

    /// Free-form translator note
    pub note: String,
}

impl Default for EventRecord {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            style: DEFAULT_STYLE.to_string(),
            actor: String::new(),
            text: String::new(),
            note: String::new(),
        }
    }
}

impl EventRecord {
    /// Create a record spanning `start..end` with the default style
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    /// Set the style name
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Set the actor name
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Set the subtitle text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the note
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Duration in milliseconds
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Text with override blocks removed and hard breaks turned into spaces
    pub fn plain_text(&self) -> String {
        ass_to_plaintext(&self.text, false)
    }

    /// Characters per second of the plain text, `None` for empty durations
    pub fn characters_per_second(&self) -> Option<f64> {
        if self.duration() <= 0 {
            return None;
        }
        let seconds = (self.duration() as f64 / 1000.0).max(1.0);
        Some(character_count(&self.text) as f64 / seconds)
    }

    /// Write one field
    pub fn set(&mut self, field: EventField) {
        match field {
            EventField::Start(value) => self.start = value,
            EventField::End(value) => self.end = value,
            EventField::Style(value) => self.style = value,
            EventField::Actor(value) => self.actor = value,
            EventField::Text(value) => self.text = value,
            EventField::Note(value) => self.note = value,
        }
    }

    /// Read one field as an owned [`EventField`]
    pub fn get(&self, kind: FieldKind) -> EventField {
        match kind {
            FieldKind::Start => EventField::Start(self.start),
            FieldKind::End => EventField::End(self.end),
            FieldKind::Style => EventField::Style(self.style.clone()),
            FieldKind::Actor => EventField::Actor(self.actor.clone()),
            FieldKind::Text => EventField::Text(self.text.clone()),
            FieldKind::Note => EventField::Note(self.note.clone()),
        }
    }

    /// Clamp times so that `0 <= start <= end`
    ///
    /// A negative start becomes zero; an end before the start is moved up
    /// to the start. Returns whether anything changed.
    pub fn normalize(&mut self) -> bool {
        let (start, end) = (self.start, self.end);
        self.start = self.start.max(0);
        self.end = self.end.max(self.start);
        start != self.start || end != self.end
    }

    /// Whether the timing invariant holds
    pub fn is_normalized(&self) -> bool {
        self.start >= 0 && self.start <= self.end
    }
}

/// A single field value, used for one-field writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventField {
    /// Start time in milliseconds
    Start(i64),
    /// End time in milliseconds
    End(i64),
    /// Style name
    Style(String),
    /// Actor name
    Actor(String),
    /// Subtitle text
    Text(String),
    /// Note
    Note(String),
}

impl EventField {
    /// Which field this value belongs to
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Start(_) => FieldKind::Start,
            Self::End(_) => FieldKind::End,
            Self::Style(_) => FieldKind::Style,
            Self::Actor(_) => FieldKind::Actor,
            Self::Text(_) => FieldKind::Text,
            Self::Note(_) => FieldKind::Note,
        }
    }
}

/// Field selector without a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Start,
    End,
    Style,
    Actor,
    Text,
    Note,
}

impl FieldKind {
    /// Every field in display order
    pub const ALL: [Self; 6] = [
        Self::Start,
        Self::End,
        Self::Style,
        Self::Actor,
        Self::Text,
        Self::Note,
    ];

    /// Field name as used by persistence and the CLI
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Style => "style",
            Self::Actor => "actor",
            Self::Text => "text",
            Self::Note => "note",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_record_uses_default_style() {
        let record = EventRecord::new(0, 1300);
        assert_eq!(record.style, DEFAULT_STYLE);
        assert_eq!(record.duration(), 1300);
        assert!(record.actor.is_empty());
    }

    #[test]
    fn normalize_clamps_negative_start_and_inverted_end() {
        let mut record = EventRecord::new(-200, -500);
        assert!(record.normalize());
        assert_eq!((record.start, record.end), (0, 0));

        let mut record = EventRecord::new(900, 400);
        assert!(record.normalize());
        assert_eq!((record.start, record.end), (900, 900));

        let mut record = EventRecord::new(100, 400);
        assert!(!record.normalize());
        assert!(record.is_normalized());
    }

    #[test]
    fn set_and_get_fields() {
        let mut record = EventRecord::default();
        record.set(EventField::Text("line".to_string()));
        record.set(EventField::Note("todo".to_string()));
        record.set(EventField::End(40));

        assert_eq!(record.get(FieldKind::Text), EventField::Text("line".to_string()));
        assert_eq!(record.get(FieldKind::Note), EventField::Note("todo".to_string()));
        assert_eq!(record.get(FieldKind::End).kind(), FieldKind::End);
        assert_eq!(record.end, 40);
    }

    #[test]
    fn characters_per_second_ignores_markup() {
        let record = EventRecord::new(0, 2000).with_text("{\\b1}abcd{\\b0} efgh");
        assert_eq!(record.characters_per_second(), Some(4.0));

        let empty = EventRecord::new(100, 100).with_text("abc");
        assert_eq!(empty.characters_per_second(), None);
    }

    #[test]
    fn short_lines_use_one_second_floor_for_cps() {
        let record = EventRecord::new(0, 500).with_text("abcdef");
        assert_eq!(record.characters_per_second(), Some(6.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_fills_missing_fields_with_defaults() {
        let record: EventRecord =
            serde_json::from_str(r#"{"start": 10, "end": 20, "text": "hi"}"#).unwrap();
        assert_eq!(record.style, DEFAULT_STYLE);
        assert_eq!(record.text, "hi");
        assert!(record.note.is_empty());
    }
}
