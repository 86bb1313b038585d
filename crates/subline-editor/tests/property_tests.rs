//! Property-based tests for subline-editor
//!
//! Uses proptest to verify the document invariants across random edit
//! sequences.

use proptest::prelude::*;
use subline_editor::{Document, EventRecord};

/// One random edit; indices are reduced modulo the current length
#[derive(Debug, Clone)]
enum Edit {
    Insert { at: usize, start: i64, duration: i64 },
    Remove { at: usize, count: usize },
    Retime { at: usize, start: i64, end: i64 },
    Retext { at: usize, text: String },
    Select { picks: Vec<usize> },
}

fn arb_record() -> impl Strategy<Value = EventRecord> {
    (0..600_000i64, 0..10_000i64, "[a-zA-Z ]{0,20}")
        .prop_map(|(start, duration, text)| EventRecord::new(start, start + duration).with_text(text))
}

fn arb_records() -> impl Strategy<Value = Vec<EventRecord>> {
    prop::collection::vec(arb_record(), 0..12)
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), -1000..600_000i64, -500..10_000i64).prop_map(
            |(at, start, duration)| Edit::Insert {
                at,
                start,
                duration
            }
        ),
        (any::<usize>(), 1..4usize).prop_map(|(at, count)| Edit::Remove { at, count }),
        (any::<usize>(), -1000..600_000i64, -1000..600_000i64)
            .prop_map(|(at, start, end)| Edit::Retime { at, start, end }),
        (any::<usize>(), "[a-z{}\\\\]{0,12}").prop_map(|(at, text)| Edit::Retext { at, text }),
        prop::collection::vec(any::<usize>(), 0..4).prop_map(|picks| Edit::Select { picks }),
    ]
}

/// Apply an edit, skipping it when the document is too short for it
fn apply(doc: &mut Document, edit: &Edit) -> subline_editor::Result<()> {
    let len = doc.lines().len();
    match edit {
        Edit::Insert {
            at,
            start,
            duration,
        } => doc.insert_one(at % (len + 1), EventRecord::new(*start, start + duration)),
        Edit::Remove { at, count } if len > 0 => {
            let index = at % len;
            doc.remove(index, (*count).min(len - index))
        }
        Edit::Retime { at, start, end } if len > 0 => doc.update(at % len, |record| {
            record.start = *start;
            record.end = *end;
        }),
        Edit::Retext { at, text } if len > 0 => {
            let text = text.clone();
            doc.update(at % len, |record| record.text = text)
        }
        Edit::Select { picks } if len > 0 => {
            doc.set_selection(picks.iter().map(|pick| pick % len))
        }
        _ => Ok(()),
    }
}

fn loaded(records: Vec<EventRecord>) -> Document {
    let mut doc = Document::new();
    doc.load(records).unwrap();
    doc
}

proptest! {
    /// insert_one followed by removing the same index is the identity
    #[test]
    fn insert_then_remove_is_identity(
        records in arb_records(),
        record in arb_record(),
        at in any::<usize>(),
    ) {
        let mut doc = loaded(records);
        let original = doc.records().to_vec();
        let index = at % (original.len() + 1);

        doc.insert_one(index, record)?;
        doc.remove(index, 1)?;

        prop_assert_eq!(doc.records(), original.as_slice());
        prop_assert_eq!(doc.history_stats().undo_count, 2);
    }

    /// A bulk scope is one unit, and undo/redo restore exact states
    #[test]
    fn bulk_undo_redo_restores_exact_state(
        records in arb_records(),
        initial_selection in prop::collection::vec(any::<usize>(), 0..4),
        edits in prop::collection::vec(arb_edit(), 1..20),
    ) {
        let mut doc = loaded(records);
        let len = doc.lines().len();
        if len > 0 {
            doc.set_selection(initial_selection.iter().map(|pick| pick % len))?;
        }
        let before_records = doc.records().to_vec();
        let before_selection = doc.selected_indices().to_vec();

        {
            let mut bulk = doc.bulk("Random edits");
            for edit in &edits {
                apply(&mut bulk, edit)?;
            }
        }
        let after_records = doc.records().to_vec();
        let after_selection = doc.selected_indices().to_vec();
        let committed = doc.has_undo();
        prop_assert!(doc.history_stats().undo_count <= 1);
        prop_assert!(committed || after_records == before_records);

        if committed {
            prop_assert!(doc.undo()?);
            prop_assert_eq!(doc.records(), before_records.as_slice());
            prop_assert_eq!(doc.selected_indices(), before_selection.as_slice());

            prop_assert!(doc.redo()?);
            prop_assert_eq!(doc.records(), after_records.as_slice());
            prop_assert_eq!(doc.selected_indices(), after_selection.as_slice());
        }
    }

    /// Selection stays sorted, unique and in range; timings stay normalized
    #[test]
    fn invariants_hold_after_every_edit(
        records in arb_records(),
        edits in prop::collection::vec(arb_edit(), 1..30),
    ) {
        let mut doc = loaded(records);
        for edit in &edits {
            apply(&mut doc, edit)?;

            let len = doc.lines().len();
            let selection = doc.selected_indices();
            prop_assert!(selection.iter().all(|&index| index < len));
            prop_assert!(selection.windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert!(doc.lines().iter().all(EventRecord::is_normalized));
        }
    }

    /// Undoing everything returns to the loaded state; redoing everything
    /// returns to the final one
    #[test]
    fn full_undo_and_redo_walk(
        records in arb_records(),
        edits in prop::collection::vec(arb_edit(), 1..15),
    ) {
        let mut doc = loaded(records);
        let original = doc.records().to_vec();
        for edit in &edits {
            apply(&mut doc, edit)?;
        }
        let last = doc.records().to_vec();

        while doc.undo()? {}
        prop_assert_eq!(doc.records(), original.as_slice());
        prop_assert!(!doc.needs_save());

        while doc.redo()? {}
        prop_assert_eq!(doc.records(), last.as_slice());
    }

    /// Removing [i, i+c) keeps indices below i and shifts those above by c
    #[test]
    fn removal_shifts_selection(
        len in 1..20usize,
        picks in prop::collection::vec(any::<usize>(), 0..8),
        at in any::<usize>(),
        count in 1..5usize,
    ) {
        let mut doc = loaded((0..len as i64).map(|i| EventRecord::new(i, i + 1)).collect());
        doc.set_selection(picks.iter().map(|pick| pick % len))?;
        let selected = doc.selected_indices().to_vec();

        let index = at % len;
        let count = count.min(len - index);
        doc.remove(index, count)?;

        let expected: Vec<usize> = selected
            .iter()
            .filter_map(|&s| {
                if s < index {
                    Some(s)
                } else if s >= index + count {
                    Some(s - count)
                } else {
                    None
                }
            })
            .collect();
        prop_assert_eq!(doc.selected_indices(), expected.as_slice());
    }
}
